use super::common::{check_sweep, choose_actions, max_abs_diff, max_q, optimal_action_sets, q_from_v};
use crate::mdps::MdpSolver;
use crate::{DpConfig, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rl_envs::{Continous, Discrete, Mdp};
use tracing::{debug, info};

/// Value iteration, Sutton & Barto 2018 section 4.4.
#[derive(Debug, Clone)]
pub struct ValueIteration {
    pub v: Array1<f64>,
    /// Q of the last sweep; -inf for illegal actions.
    pub q: Array2<f64>,
    /// Actions whose Q is within theta of V.
    pub optimal: Vec<Vec<Discrete>>,
    /// One action per state, drawn uniformly from its optimal set.
    pub actions: Vec<Option<Discrete>>,
    pub sweeps: usize,
    pub history: Vec<Array1<f64>>,
}

impl ValueIteration {
    pub fn solve<M: Mdp + ?Sized>(mdp: &M, config: &DpConfig, rng: &mut StdRng) -> Result<Self> {
        config.validate()?;

        let mut v = Array1::<f64>::zeros(mdp.n_s());
        let mut q = Array2::<f64>::zeros((mdp.n_s(), mdp.n_a()));
        let mut history = vec![v.clone()];
        let mut sweeps = 0;
        let mut delta = f64::INFINITY;

        while delta > config.theta {
            check_sweep(&config.cancel, sweeps, config.max_iterations, delta)?;

            q = q_from_v(mdp, &v, config.gamma);
            let v_upd = q.map_axis(ndarray::Axis(1), max_q);

            delta = max_abs_diff(&v_upd, &v);
            v = v_upd;
            history.push(v.clone());
            sweeps += 1;
            debug!(sweeps, delta, "value iteration sweep");
        }

        let optimal = optimal_action_sets(&q, config.theta);
        let actions = choose_actions(&optimal, rng);

        info!(sweeps, "value iteration converged");
        Ok(Self {
            v,
            q,
            optimal,
            actions,
            sweeps,
            history,
        })
    }
}

impl MdpSolver for ValueIteration {
    fn v_star(&self, s: Discrete) -> Continous {
        self.v[s]
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Continous {
        self.q[[s, a]]
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        self.actions[s]
    }

    fn optimal_actions(&self, s: Discrete) -> &[Discrete] {
        &self.optimal[s]
    }
}
