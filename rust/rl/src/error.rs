//! Errors raised by the planners and learners.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no convergence after {iterations} sweeps (last delta {delta:e})")]
    NonConvergence { iterations: usize, delta: f64 },

    #[error("cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },

    #[error(transparent)]
    Env(#[from] rl_envs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
