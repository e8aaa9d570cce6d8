use super::common::{choose_actions, optimal_action_sets};
use super::policy_evaluation::{evaluate_policy, improve_policy};
use crate::cancel::is_cancelled;
use crate::mdps::policy::TabularPolicy;
use crate::mdps::MdpSolver;
use crate::{DpConfig, Error, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rl_envs::{Continous, Discrete, Mdp};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    pub policy: TabularPolicy,
    pub v: Array1<f64>,
}

/// Policy iteration, Sutton & Barto 2018 section 4.3.
///
/// Starts from the uniform policy over legal actions and alternates
/// evaluation with greedy improvement for as long as the total value
/// sum_s V(s) strictly increases. The solution is the last improving pair.
#[derive(Debug, Clone)]
pub struct PolicyIteration {
    pub v: Array1<f64>,
    pub q: Array2<f64>,
    pub policy: TabularPolicy,
    pub optimal: Vec<Vec<Discrete>>,
    pub actions: Vec<Option<Discrete>>,
    pub history: Vec<PolicySnapshot>,
}

impl PolicyIteration {
    pub fn solve<M: Mdp + ?Sized>(mdp: &M, config: &DpConfig, rng: &mut StdRng) -> Result<Self> {
        config.validate()?;

        let mut policy = TabularPolicy::uniform(mdp);
        let mut eval = evaluate_policy(mdp, &policy, config)?;
        let mut prev_total = f64::NEG_INFINITY;
        let mut curr_total = eval.v.sum();
        let mut history = vec![];
        let mut q = eval.q.clone();

        while curr_total > prev_total {
            if is_cancelled(&config.cancel) {
                warn!(iterations = history.len(), "policy iteration cancelled");
                return Err(Error::Cancelled {
                    iterations: history.len(),
                });
            }

            q = eval.q;
            history.push(PolicySnapshot {
                policy,
                v: eval.v,
            });

            policy = TabularPolicy::deterministic(mdp.n_a(), &improve_policy(&q, rng));
            eval = evaluate_policy(mdp, &policy, config)?;

            prev_total = curr_total;
            curr_total = eval.v.sum();
            debug!(iteration = history.len(), total = curr_total, "policy improved");
        }

        let PolicySnapshot { policy, v } = history
            .last()
            .cloned()
            .ok_or_else(|| Error::invalid_parameter("mdp", "total value is not a number"))?;

        let optimal = optimal_action_sets(&q, config.theta);
        let mut fallback = choose_actions(&optimal, rng).into_iter();
        let actions = (0..mdp.n_s())
            .map(|s| {
                let chosen = fallback.next().flatten();
                policy.deterministic_action(s).or(chosen)
            })
            .collect();

        info!(iterations = history.len(), "policy iteration finished");
        Ok(Self {
            v,
            q,
            policy,
            optimal,
            actions,
            history,
        })
    }

    pub fn total_values(&self) -> Vec<f64> {
        self.history.iter().map(|h| h.v.sum()).collect()
    }
}

impl MdpSolver for PolicyIteration {
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

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rl_envs::envs::GridWorld;

    #[test]
    fn gridworld_is_solved_in_one_improvement() {
        let rng = &mut StdRng::seed_from_u64(42);
        let gw = GridWorld::new(4, 4).unwrap();
        let pi = PolicyIteration::solve(&gw, &DpConfig::default(), rng).unwrap();

        assert_eq!(pi.history.len(), 2);
        assert_eq!(pi.history[0].policy, TabularPolicy::uniform(&gw));
        assert_float_eq!(
            pi.v.to_vec(),
            vec![0., -1., -2., -3., -1., -2., -3., -2., -2., -3., -2., -1., -3., -2., -1., 0.],
            abs_all <= 1e-9
        );
        for s in 1..15 {
            let a = pi.pi_star(s).unwrap();
            assert!(pi.optimal_actions(s).contains(&a));
        }
    }
}
