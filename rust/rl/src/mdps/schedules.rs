//! Exploration rates and step sizes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exploration {
    Constant { epsilon: f64 },
    /// GLIE decay on the number of visits to the state.
    VisitDecay { n0: f64 },
}

impl Exploration {
    pub fn epsilon(&self, state_visits: u64) -> f64 {
        match *self {
            Exploration::Constant { epsilon } => epsilon,
            Exploration::VisitDecay { n0 } => glie_epsilon(n0, state_visits),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Exploration::Constant { epsilon } if !(0. ..=1.).contains(&epsilon) => Err(
                Error::invalid_parameter("epsilon", format!("{epsilon} is not a probability")),
            ),
            Exploration::VisitDecay { n0 } if !(n0.is_finite() && n0 > 0.) => Err(
                Error::invalid_parameter("n0", format!("{n0} is not a positive number")),
            ),
            _ => Ok(()),
        }
    }
}

/// n0 / (n0 + N(s))
pub fn glie_epsilon(n0: f64, state_visits: u64) -> f64 {
    n0 / (n0 + state_visits as f64)
}

/// sqrt(c / (c + e)) for the e-th episode, counting from 0.
pub fn behavior_epsilon(c: f64, episode: usize) -> f64 {
    (c / (c + episode as f64)).sqrt()
}

/// (k / (k + N(s, a)))^(2/3): sums diverge, squares converge.
pub fn robbins_monro_alpha(k: f64, visits: u64) -> f64 {
    (k / (k + visits as f64)).powf(2. / 3.)
}
