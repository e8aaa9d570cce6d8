use crate::{outcomes, Continous, Discrete, Error, Result, StepInfo, Transitions};
use rand::prelude::*;
use std::fmt::Debug;
use std::rc::Rc;

/// Markov Decision Process - Sutton & Barto 2018.
///
/// The fully observable model consumed by the planners. States are the
/// indices `0..n_s()`, actions `0..n_a()`.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn transitions(&self) -> Rc<Transitions>;

    fn is_legal(&self, s: Discrete, a: Discrete) -> bool {
        !outcomes(&self.transitions(), s, a).is_empty()
    }

    /// Checks that every non-empty transition list is a distribution over
    /// known states.
    fn validate(&self) -> Result<()> {
        let transitions = self.transitions();
        for (&(s, a), ts) in transitions.iter() {
            if s >= self.n_s() || a >= self.n_a() {
                return Err(Error::invalid_parameter(
                    "transitions",
                    format!("entry ({s}, {a}) is outside {}x{}", self.n_s(), self.n_a()),
                ));
            }
            if ts.is_empty() {
                continue;
            }
            if let Some(t) = ts.iter().find(|t| t.next_state >= self.n_s()) {
                return Err(Error::invalid_parameter(
                    "transitions",
                    format!("({s}, {a}) leads to unknown state {}", t.next_state),
                ));
            }
            let total: Continous = ts.iter().map(|t| t.probability).sum();
            if (total - 1.).abs() > 1e-9 {
                return Err(Error::invalid_parameter(
                    "transitions",
                    format!("probabilities of ({s}, {a}) sum to {total}"),
                ));
            }
        }

        Ok(())
    }
}

/// The sampling model consumed by the learners.
pub trait MdpSimulator {
    type State: Clone + Ord + Debug;

    fn name(&self) -> String;

    fn n_a(&self) -> usize;

    /// Starts a new episode, optionally from a forced start state.
    fn reset(&mut self, rng: &mut StdRng, start: Option<Self::State>) -> Result<Self::State>;

    fn step(&mut self, rng: &mut StdRng, action: Discrete) -> Result<StepInfo<Self::State>>;

    /// Uniform draw over the states an episode may start from.
    fn state_space_sample(&self, rng: &mut StdRng) -> Self::State;

    fn action_space_sample(&self, rng: &mut StdRng) -> Discrete {
        rng.gen_range(0..self.n_a())
    }
}

/// Tracks where a simulator is within its current episode.
#[derive(Debug, Clone)]
pub struct EpisodeCursor<S> {
    state: Option<S>,
    moves: usize,
    last_action: Option<Discrete>,
}

impl<S> Default for EpisodeCursor<S> {
    fn default() -> Self {
        Self {
            state: None,
            moves: 0,
            last_action: None,
        }
    }
}

impl<S: Clone + Debug> EpisodeCursor<S> {
    pub fn begin(&mut self, s: S) {
        self.state = Some(s);
        self.moves = 0;
        self.last_action = None;
    }

    /// Fails unless an episode is running.
    pub fn current(&self, n_a: usize, action: Discrete) -> Result<&S> {
        if action >= n_a {
            return Err(Error::InvalidAction { action, n_a });
        }

        self.state.as_ref().ok_or_else(|| Error::UndefinedState {
            reason: if self.moves == 0 {
                "step called before reset".to_string()
            } else {
                "step called after a terminal transition".to_string()
            },
        })
    }

    pub fn advance(&mut self, action: Discrete, next: S, terminated: bool) {
        self.moves += 1;
        self.last_action = Some(action);
        self.state = if terminated { None } else { Some(next) };
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn last_action(&self) -> Option<Discrete> {
        self.last_action
    }
}
