use super::grid::{Grid, DOWN, LEFT, RIGHT, UP};
use super::table_simulator::{StartState, TableSimulator};
use crate::{Discrete, Error, Mdp, Result, Transition, Transitions};
use std::rc::Rc;

/// Sutton & Barto example 4.1: the first and the last cell are terminal,
/// every move costs -1 and moves off the board leave the agent in place.
#[derive(Debug, Clone)]
pub struct GridWorld {
    grid: Grid,
    transitions: Rc<Transitions>,
}

impl GridWorld {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::invalid_parameter(
                "grid",
                format!("{height}x{width} has no cells"),
            ));
        }

        let grid = Grid::new(height, width);
        let is_done = |s: Discrete| s == 0 || s == grid.n_s() - 1;

        let mut transitions = Transitions::new();
        for s in 0..grid.n_s() {
            for a in [UP, DOWN, RIGHT, LEFT] {
                let t = if is_done(s) {
                    Transition::absorbing(s)
                } else {
                    let next = grid.shifted(s, a, 0);
                    Transition::new(1., next, -1., is_done(next))
                };
                transitions.insert((s, a), vec![t]);
            }
        }

        Ok(Self {
            grid,
            transitions: Rc::new(transitions),
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn is_done(&self, s: Discrete) -> bool {
        s == 0 || s == self.grid.n_s() - 1
    }

    /// Episodes start from a cell chosen uniformly at random.
    pub fn simulator(self) -> TableSimulator<GridWorld> {
        TableSimulator::new("GridWorld", self, StartState::Uniform)
    }
}

impl Mdp for GridWorld {
    fn n_s(&self) -> usize {
        self.grid.n_s()
    }

    fn n_a(&self) -> usize {
        4
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{outcomes, MdpSimulator};
    use rand::prelude::*;

    #[test]
    fn terminal_cells_are_absorbing() {
        let gw = GridWorld::new(4, 4).unwrap();
        let ts = gw.transitions();
        for a in 0..4 {
            assert_eq!(outcomes(&ts, 0, a), &[Transition::absorbing(0)]);
            assert_eq!(outcomes(&ts, 15, a), &[Transition::absorbing(15)]);
        }
        gw.validate().unwrap();
    }

    #[test]
    fn moves_cost_one_and_stay_on_the_board() {
        let gw = GridWorld::new(4, 4).unwrap();
        let ts = gw.transitions();
        assert_eq!(outcomes(&ts, 1, LEFT), &[Transition::new(1., 0, -1., true)]);
        assert_eq!(outcomes(&ts, 1, UP), &[Transition::new(1., 1, -1., false)]);
        assert_eq!(outcomes(&ts, 11, DOWN), &[Transition::new(1., 15, -1., true)]);
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(GridWorld::new(0, 4).is_err());
    }

    #[test]
    fn simulator_walks_the_table() {
        let rng = &mut StdRng::seed_from_u64(11);
        let mut sim = GridWorld::new(4, 4).unwrap().simulator();
        let s = sim.reset(rng, Some(2)).unwrap();
        assert_eq!(s, 2);

        let si = sim.step(rng, LEFT).unwrap();
        assert_eq!((si.observation, si.reward, si.terminated), (1, -1., false));
        let si = sim.step(rng, LEFT).unwrap();
        assert_eq!((si.observation, si.reward, si.terminated), (0, -1., true));
        assert_eq!(sim.moves(), 2);
        assert_eq!(sim.last_action(), Some(LEFT));

        let err = sim.step(rng, LEFT).unwrap_err();
        assert!(matches!(err, Error::UndefinedState { .. }));
    }

    #[test]
    fn simulator_rejects_bad_actions_and_early_steps() {
        let rng = &mut StdRng::seed_from_u64(11);
        let mut sim = GridWorld::new(4, 4).unwrap().simulator();
        assert!(matches!(
            sim.step(rng, UP).unwrap_err(),
            Error::UndefinedState { .. }
        ));

        sim.reset(rng, None).unwrap();
        assert_eq!(
            sim.step(rng, 4).unwrap_err(),
            Error::InvalidAction { action: 4, n_a: 4 }
        );
        assert!(sim.reset(rng, Some(16)).is_err());
    }
}
