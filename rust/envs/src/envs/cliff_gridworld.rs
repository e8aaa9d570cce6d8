use super::grid::Grid;
use super::table_simulator::{StartState, TableSimulator};
use crate::{Discrete, Mdp, Transition, Transitions};
use itertools::Itertools;
use std::rc::Rc;

pub const HEIGHT: usize = 4;
pub const WIDTH: usize = 12;
pub const START_POSITION: (usize, usize) = (3, 0);
pub const TARGET_POSITION: (usize, usize) = (3, 11);
pub const CLIFF_REWARD: f64 = -100.;

/// Sutton & Barto example 6.6. The bottom row between start and target
/// is a cliff: stepping in costs -1 like any move, and every action taken
/// from there sends the agent back to the start for -100.
#[derive(Debug, Clone)]
pub struct CliffGridWorld {
    transitions: Rc<Transitions>,
}

impl CliffGridWorld {
    pub fn new() -> Self {
        let grid = Self::grid();
        let start = grid.coords_to_state(START_POSITION);
        let target = grid.coords_to_state(TARGET_POSITION);

        let transitions = (0..grid.n_s())
            .cartesian_product(0..4)
            .map(|(s, a)| {
                let t = if s == target {
                    Transition::absorbing(s)
                } else if is_cliff(grid.state_to_coords(s)) {
                    Transition::new(1., start, CLIFF_REWARD, false)
                } else {
                    let next = grid.shifted(s, a, 0);
                    Transition::new(1., next, -1., next == target)
                };
                ((s, a), vec![t])
            })
            .collect();

        Self {
            transitions: Rc::new(transitions),
        }
    }

    pub fn grid() -> Grid {
        Grid::new(HEIGHT, WIDTH)
    }

    pub fn is_target(&self, s: Discrete) -> bool {
        s == Self::grid().coords_to_state(TARGET_POSITION)
    }

    pub fn simulator(self) -> TableSimulator<CliffGridWorld> {
        let start: Discrete = Self::grid().coords_to_state(START_POSITION);
        TableSimulator::new("CliffGridWorld", self, StartState::Fixed(start))
    }
}

impl Default for CliffGridWorld {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_cliff((y, x): (usize, usize)) -> bool {
    y == HEIGHT - 1 && (1..WIDTH - 1).contains(&x)
}

impl Mdp for CliffGridWorld {
    fn n_s(&self) -> usize {
        HEIGHT * WIDTH
    }

    fn n_a(&self) -> usize {
        4
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
