pub mod common;
pub mod mc_methods;
pub mod policy_evaluation;
pub mod policy_iteration;
pub mod td_methods;
pub mod value_iteration;

pub use mc_methods::{
    evaluate_episodes, first_visit_returns, mc_exploring_starts, mc_off_policy_wis,
    mc_on_policy, mc_prediction, weighted_importance_update, BehaviorStep, Prediction,
};
pub use policy_evaluation::{evaluate_policy, improve_policy, PolicyEvaluation};
pub use policy_iteration::{PolicyIteration, PolicySnapshot};
pub use td_methods::{q_learning, sarsa};
pub use value_iteration::ValueIteration;

use super::value_table::{QTable, VisitTable, WeightTable};
use super::Policy;
use rl_envs::{Discrete, EpisodeEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length and undiscounted return of one sampled episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub length: usize,
    pub total_reward: f64,
}

impl EpisodeStats {
    pub fn of<S>(episode: &[EpisodeEvent<S>]) -> Self {
        Self {
            length: episode.len(),
            total_reward: episode.iter().map(|e| e.r).sum(),
        }
    }
}

/// What a model-free control run leaves behind.
#[derive(Debug, Clone)]
pub struct ControlOutcome<S> {
    pub q: QTable<S>,
    pub visits: VisitTable<S>,
    /// C(s, a), only kept by weighted importance sampling.
    pub weights: Option<WeightTable<S>>,
    /// Greedy action of every state in `q`. Ties are broken at random,
    /// except by weighted importance sampling, whose target policy takes
    /// the lowest maximising action.
    pub policy: BTreeMap<S, Discrete>,
    pub v: BTreeMap<S, f64>,
    pub stats: Vec<EpisodeStats>,
    pub cancelled: bool,
}

impl<S: Ord + Clone> Policy<S> for ControlOutcome<S> {
    fn action(&self, s: &S) -> Option<Discrete> {
        self.policy.get(s).copied()
    }
}
