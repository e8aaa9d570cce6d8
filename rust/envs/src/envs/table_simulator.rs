use crate::{
    outcomes, pick_next, Discrete, EpisodeCursor, Error, Mdp, MdpSimulator, Result, StepInfo,
    Transition, Transitions,
};
use rand::prelude::*;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartState {
    Fixed(Discrete),
    Uniform,
}

/// Samples episodes from a model's transition table.
pub struct TableSimulator<M: Mdp> {
    name: String,
    mdp: M,
    transitions: Rc<Transitions>,
    start: StartState,
    cursor: EpisodeCursor<Discrete>,
}

impl<M: Mdp> TableSimulator<M> {
    pub fn new(name: &str, mdp: M, start: StartState) -> Self {
        let transitions = mdp.transitions();

        Self {
            name: name.to_string(),
            mdp,
            transitions,
            start,
            cursor: EpisodeCursor::default(),
        }
    }

    pub fn mdp(&self) -> &M {
        &self.mdp
    }

    /// Moves made in the current (or last) episode.
    pub fn moves(&self) -> usize {
        self.cursor.moves()
    }

    pub fn last_action(&self) -> Option<Discrete> {
        self.cursor.last_action()
    }
}

impl<M: Mdp> MdpSimulator for TableSimulator<M> {
    type State = Discrete;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn n_a(&self) -> usize {
        self.mdp.n_a()
    }

    fn reset(&mut self, rng: &mut StdRng, start: Option<Discrete>) -> Result<Discrete> {
        let s = match (start, self.start) {
            (Some(s), _) | (None, StartState::Fixed(s)) => s,
            (None, StartState::Uniform) => self.state_space_sample(rng),
        };
        if s >= self.mdp.n_s() {
            return Err(Error::invalid_parameter(
                "start",
                format!("state {s} is outside 0..{}", self.mdp.n_s()),
            ));
        }

        trace!(env = %self.name, start = s, "reset");
        self.cursor.begin(s);
        Ok(s)
    }

    fn step(&mut self, rng: &mut StdRng, action: Discrete) -> Result<StepInfo<Discrete>> {
        let s = *self.cursor.current(self.n_a(), action)?;
        let ts = outcomes(&self.transitions, s, action);
        if ts.is_empty() {
            return Err(Error::IllegalAction {
                state: s.to_string(),
                action,
            });
        }

        let next: Transition = pick_next(rng, ts)?;
        self.cursor.advance(action, next.next_state, next.done);

        Ok(StepInfo {
            observation: next.next_state,
            reward: next.reward,
            terminated: next.done,
        })
    }

    fn state_space_sample(&self, rng: &mut StdRng) -> Discrete {
        rng.gen_range(0..self.mdp.n_s())
    }
}
