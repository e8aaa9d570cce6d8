use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Discrete = usize;
pub type Continous = f64;

/// One entry of P(s', r | s, a): (probability, next_state, reward, done).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub probability: Continous,
    pub next_state: Discrete,
    pub reward: Continous,
    pub done: bool,
}

impl Transition {
    pub fn new(probability: Continous, next_state: Discrete, reward: Continous, done: bool) -> Self {
        Self {
            probability,
            next_state,
            reward,
            done,
        }
    }

    /// Probability-1, zero-reward self loop used for absorbing states.
    pub fn absorbing(state: Discrete) -> Self {
        Self::new(1., state, 0., true)
    }
}

/// Keyed by (state, action). A missing key, or an empty list, marks the
/// action as illegal in that state.
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

pub fn outcomes(transitions: &Transitions, s: Discrete, a: Discrete) -> &[Transition] {
    transitions.get(&(s, a)).map(Vec::as_slice).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo<S> {
    pub observation: S,
    pub reward: Continous,
    pub terminated: bool,
}

/// A single step of a sampled episode: the state the agent was in, the
/// action it took and the reward that followed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEvent<S> {
    pub s: S,
    pub a: Discrete,
    pub r: Continous,
}
