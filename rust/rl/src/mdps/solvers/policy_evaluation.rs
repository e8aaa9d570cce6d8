use super::common::{check_sweep, expected_return, max_abs_diff, q_from_v};
use crate::mdps::policy::{argmax_all, TabularPolicy};
use crate::{DpConfig, Error, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rl_envs::{outcomes, Discrete, Mdp};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PolicyEvaluation {
    pub v: Array1<f64>,
    /// Q of the converged V; -inf for illegal actions.
    pub q: Array2<f64>,
    pub sweeps: usize,
    /// V after every sweep, starting with the all-zero initial guess.
    pub history: Vec<Array1<f64>>,
}

/// Iterative policy evaluation, Sutton & Barto 2018 section 4.1.
///
/// Sweeps are synchronous: every V'(s) is computed from the previous V.
pub fn evaluate_policy<M: Mdp + ?Sized>(
    mdp: &M,
    policy: &TabularPolicy,
    config: &DpConfig,
) -> Result<PolicyEvaluation> {
    config.validate()?;
    if (policy.n_s(), policy.n_a()) != (mdp.n_s(), mdp.n_a()) {
        return Err(Error::invalid_parameter(
            "policy",
            format!(
                "shape {}x{} does not match the model's {}x{}",
                policy.n_s(),
                policy.n_a(),
                mdp.n_s(),
                mdp.n_a()
            ),
        ));
    }

    let transitions = mdp.transitions();
    let mut v = Array1::<f64>::zeros(mdp.n_s());
    let mut history = vec![v.clone()];
    let mut sweeps = 0;
    let mut delta = f64::INFINITY;

    while delta > config.theta {
        check_sweep(&config.cancel, sweeps, config.max_iterations, delta)?;

        let v_upd = Array1::from_shape_fn(mdp.n_s(), |s| {
            policy
                .row(s)
                .iter()
                .enumerate()
                .filter(|&(_, &p)| p > 0.)
                .map(|(a, &p)| p * expected_return(outcomes(&transitions, s, a), &v, config.gamma))
                .sum::<f64>()
        });

        delta = max_abs_diff(&v_upd, &v);
        v = v_upd;
        history.push(v.clone());
        sweeps += 1;
        debug!(sweeps, delta, "policy evaluation sweep");
    }

    info!(sweeps, "policy evaluation converged");
    Ok(PolicyEvaluation {
        q: q_from_v(mdp, &v, config.gamma),
        v,
        sweeps,
        history,
    })
}

/// Greedy deterministic policy over `q`, ties broken uniformly at random.
/// States whose actions are all illegal get `None`.
pub fn improve_policy(q: &Array2<f64>, rng: &mut StdRng) -> Vec<Option<Discrete>> {
    q.outer_iter()
        .map(|row| {
            let best = argmax_all(row);
            if best.iter().any(|&a| row[a].is_finite()) {
                best.choose(rng).copied()
            } else {
                None
            }
        })
        .collect()
}
