use super::grid::Grid;
use super::table_simulator::{StartState, TableSimulator};
use crate::{Discrete, Mdp, Transition, Transitions};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub const HEIGHT: usize = 7;
pub const WIDTH: usize = 10;
pub const START_POSITION: (usize, usize) = (3, 0);
pub const TARGET_POSITION: (usize, usize) = (3, 7);
/// Upward push of each column.
pub const WINDS: [i64; WIDTH] = [0, 0, 0, 1, 1, 1, 2, 2, 1, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindyMoves {
    /// Up, down, right, left.
    Normal,
    /// Adds the four diagonals.
    King,
    /// King moves plus standing still.
    KingExtra,
}

impl WindyMoves {
    pub fn n_a(self) -> usize {
        match self {
            WindyMoves::Normal => 4,
            WindyMoves::King => 8,
            WindyMoves::KingExtra => 9,
        }
    }
}

/// Sutton & Barto example 6.5. The wind of the column the agent leaves
/// shifts it upwards; every move costs -1 until the target is reached.
#[derive(Debug, Clone)]
pub struct WindyGridWorld {
    moves: WindyMoves,
    transitions: Rc<Transitions>,
}

impl WindyGridWorld {
    pub fn new(moves: WindyMoves) -> Self {
        let grid = Self::grid();
        let target = grid.coords_to_state(TARGET_POSITION);

        let transitions = (0..grid.n_s())
            .cartesian_product(0..moves.n_a())
            .map(|(s, a)| {
                let t = if s == target {
                    Transition::absorbing(s)
                } else {
                    let (_, x) = grid.state_to_coords(s);
                    let next = grid.shifted(s, a, WINDS[x]);
                    Transition::new(1., next, -1., next == target)
                };
                ((s, a), vec![t])
            })
            .collect();

        Self {
            moves,
            transitions: Rc::new(transitions),
        }
    }

    pub fn grid() -> Grid {
        Grid::new(HEIGHT, WIDTH)
    }

    pub fn is_target(&self, s: Discrete) -> bool {
        s == Self::grid().coords_to_state(TARGET_POSITION)
    }

    pub fn moves(&self) -> WindyMoves {
        self.moves
    }

    pub fn simulator(self) -> TableSimulator<WindyGridWorld> {
        let start: Discrete = Self::grid().coords_to_state(START_POSITION);
        TableSimulator::new("WindyGridWorld", self, StartState::Fixed(start))
    }
}

impl Mdp for WindyGridWorld {
    fn n_s(&self) -> usize {
        HEIGHT * WIDTH
    }

    fn n_a(&self) -> usize {
        self.moves.n_a()
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::grid::{DOWN, LEFT, NO_MOVE, RIGHT, UP, UP_RIGHT};
    use crate::{outcomes, MdpSimulator};
    use rand::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(WindyMoves::Normal, 4)]
    #[case(WindyMoves::King, 8)]
    #[case(WindyMoves::KingExtra, 9)]
    fn action_count_follows_the_move_set(#[case] moves: WindyMoves, #[case] n_a: usize) {
        let env = WindyGridWorld::new(moves);
        assert_eq!(env.n_a(), n_a);
        assert_eq!(env.transitions().len(), HEIGHT * WIDTH * n_a);
        env.validate().unwrap();
    }

    #[rstest]
    #[case((3, 0), RIGHT, (3, 1))]
    #[case((3, 3), RIGHT, (2, 4))]
    #[case((3, 6), RIGHT, (1, 7))]
    #[case((0, 6), UP, (0, 6))]
    #[case((6, 6), DOWN, (5, 6))]
    #[case((3, 0), LEFT, (3, 0))]
    #[case((3, 8), NO_MOVE, (2, 8))]
    #[case((4, 8), UP_RIGHT, (2, 9))]
    fn wind_of_the_current_column_applies(
        #[case] from: (usize, usize),
        #[case] a: Discrete,
        #[case] to: (usize, usize),
    ) {
        let grid = WindyGridWorld::grid();
        let env = WindyGridWorld::new(WindyMoves::KingExtra);
        let ts = env.transitions();
        let t = &outcomes(&ts, grid.coords_to_state(from), a)[0];
        assert_eq!(grid.state_to_coords(t.next_state), to);
        assert_eq!(t.reward, -1.);
    }

    #[test]
    fn reaching_the_target_ends_the_episode() {
        let rng = &mut StdRng::seed_from_u64(3);
        let grid = WindyGridWorld::grid();
        let mut sim = WindyGridWorld::new(WindyMoves::Normal).simulator();
        assert_eq!(sim.reset(rng, None).unwrap(), grid.coords_to_state(START_POSITION));

        sim.reset(rng, Some(grid.coords_to_state((4, 8)))).unwrap();
        let si = sim.step(rng, LEFT).unwrap();
        assert_eq!(grid.state_to_coords(si.observation), TARGET_POSITION);
        assert!(si.terminated);
    }
}
