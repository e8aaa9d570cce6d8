use crate::{Continous, Error, Mdp, Result, Transition, Transitions};
use std::rc::Rc;

pub const GOAL: usize = 100;

/// Sutton & Barto example 4.3. Capital 0..=100 is the state, the stake
/// 0..100 the action; a stake is legal only up to min(s, 100 - s).
#[derive(Debug, Clone)]
pub struct Gambler {
    ph: Continous,
    transitions: Rc<Transitions>,
}

impl Gambler {
    pub fn new(ph: Continous) -> Result<Self> {
        if !(0. ..=1.).contains(&ph) {
            return Err(Error::invalid_parameter(
                "ph",
                format!("{ph} is not a probability"),
            ));
        }

        let mut transitions = Transitions::new();
        for s in 1..GOAL {
            transitions.insert((s, 0), vec![Transition::new(1., s, 0., false)]);
            for a in 1..=s.min(GOAL - s) {
                let win = s + a;
                let lose = s - a;
                transitions.insert(
                    (s, a),
                    vec![
                        Transition::new(ph, win, if win == GOAL { 1. } else { 0. }, win == GOAL),
                        Transition::new(1. - ph, lose, 0., lose == 0),
                    ],
                );
            }
        }
        transitions.insert((0, 0), vec![Transition::absorbing(0)]);
        transitions.insert((GOAL, 0), vec![Transition::absorbing(GOAL)]);

        Ok(Self {
            ph,
            transitions: Rc::new(transitions),
        })
    }

    pub fn ph(&self) -> Continous {
        self.ph
    }
}

impl Mdp for Gambler {
    fn n_s(&self) -> usize {
        GOAL + 1
    }

    fn n_a(&self) -> usize {
        GOAL
    }

    fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}
