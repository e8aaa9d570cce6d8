extern crate rand;
extern crate serde;

pub mod common;
pub mod envs;
pub mod error;
pub mod mdps;

pub use common::defs::*;
pub use common::utils::{pick_index, pick_next, Weighted};
pub use error::{Error, Result};
pub use mdps::*;
