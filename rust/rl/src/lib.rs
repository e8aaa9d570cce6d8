extern crate rand;
extern crate serde;

pub mod cancel;
pub mod config;
pub mod error;
pub mod mdps;

pub use cancel::CancelToken;
pub use config::{DpConfig, McControlConfig, PredictionConfig, TdConfig, VisitRule};
pub use error::{Error, Result};
pub use mdps::{
    mdp_solver_policy::MdpSolverPolicy,
    policy::TabularPolicy,
    schedules::Exploration,
    solvers::*,
    value_table::{ActionTable, QTable, VisitTable, WeightTable},
    MdpSolver, Policy,
};
