//! Errors raised by environments.

use crate::Discrete;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid action {action}: the environment declares {n_a} actions")]
    InvalidAction { action: Discrete, n_a: usize },

    #[error("action {action} has no transition out of state {state}")]
    IllegalAction { state: String, action: Discrete },

    #[error("undefined state: {reason}")]
    UndefinedState { reason: String },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid distribution: {reason}")]
    InvalidDistribution { reason: String },
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
