#![allow(dead_code)]

use rl_envs::envs::{StartState, TableSimulator};
use rl_envs::{Discrete, Mdp, Transition, Transitions};
use std::rc::Rc;

pub const STEP: Discrete = 0;
pub const JUMP: Discrete = 1;

/// A 1-D walk towards the last cell. `STEP` moves one cell for -1, `JUMP`
/// moves two cells (clamped at the goal) for `jump_reward`.
#[derive(Debug, Clone)]
pub struct Corridor {
    len: usize,
    transitions: Rc<Transitions>,
}

impl Corridor {
    pub fn new(len: usize, jump_reward: f64) -> Self {
        let goal = len - 1;
        let mut transitions = Transitions::new();
        for s in 0..len {
            for (a, dist, r) in [(STEP, 1, -1.), (JUMP, 2, jump_reward)] {
                let t = if s == goal {
                    Transition::absorbing(s)
                } else {
                    let next = (s + dist).min(goal);
                    Transition::new(1., next, r, next == goal)
                };
                transitions.insert((s, a), vec![t]);
            }
        }

        Self {
            len,
            transitions: Rc::new(transitions),
        }
    }

    pub fn goal(&self) -> Discrete {
        self.len - 1
    }

    pub fn simulator(self, start: StartState) -> TableSimulator<Corridor> {
        TableSimulator::new("Corridor", self, start)
    }
}

impl Mdp for Corridor {
    fn n_s(&self) -> usize {
        self.len
    }

    fn n_a(&self) -> usize {
        2
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
