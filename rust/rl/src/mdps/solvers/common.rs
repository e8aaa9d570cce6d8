use crate::cancel::is_cancelled;
use crate::{CancelToken, Error, Result};
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rl_envs::{outcomes, Discrete, Mdp, Transition};

/// sum over outcomes of p * (r + gamma * V(s')).
pub fn expected_return(ts: &[Transition], v: &Array1<f64>, gamma: f64) -> f64 {
    ts.iter()
        .map(|t| t.probability * (t.reward + gamma * v[t.next_state]))
        .sum()
}

/// One-step lookahead of every action. Actions without transitions get
/// -inf so that no maximum ever selects them.
pub fn q_from_v<M: Mdp + ?Sized>(mdp: &M, v: &Array1<f64>, gamma: f64) -> Array2<f64> {
    let transitions = mdp.transitions();
    Array2::from_shape_fn((mdp.n_s(), mdp.n_a()), |(s, a)| {
        match outcomes(&transitions, s, a) {
            [] => f64::NEG_INFINITY,
            ts => expected_return(ts, v, gamma),
        }
    })
}

/// max_a Q(s, a), or 0 for a state with no legal action.
pub fn max_q(row: ArrayView1<f64>) -> f64 {
    match row.fold(f64::NEG_INFINITY, |m, &q| m.max(q)) {
        m if m == f64::NEG_INFINITY => 0.,
        m => m,
    }
}

/// Actions within `tol` of the row maximum. Illegal actions never qualify.
pub fn optimal_action_sets(q: &Array2<f64>, tol: f64) -> Vec<Vec<Discrete>> {
    q.outer_iter()
        .map(|row| {
            let best = max_q(row);
            row.iter()
                .positions(|&q| q.is_finite() && (q - best).abs() <= tol)
                .collect()
        })
        .collect()
}

/// Picks one action per state uniformly among its optimal set.
pub fn choose_actions(sets: &[Vec<Discrete>], rng: &mut StdRng) -> Vec<Option<Discrete>> {
    sets.iter().map(|set| set.choose(rng).copied()).collect()
}

pub fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0., |m: f64, (x, y)| m.max((x - y).abs()))
}

/// Stops a sweep loop on cancellation or when it runs out of sweeps.
pub fn check_sweep(
    cancel: &Option<CancelToken>,
    sweeps: usize,
    max_iterations: usize,
    delta: f64,
) -> Result<()> {
    if is_cancelled(cancel) {
        return Err(Error::Cancelled { iterations: sweeps });
    }
    if sweeps >= max_iterations {
        return Err(Error::NonConvergence {
            iterations: sweeps,
            delta,
        });
    }

    Ok(())
}
