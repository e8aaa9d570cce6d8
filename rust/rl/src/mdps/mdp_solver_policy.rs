use super::{MdpSolver, Policy};
use rl_envs::Discrete;
use std::rc::Rc;

/// Follows a planner's deterministic optimal action.
pub struct MdpSolverPolicy {
    pub mdp_solver: Rc<dyn MdpSolver>,
}

impl MdpSolverPolicy {
    pub fn new(mdp_solver: Rc<dyn MdpSolver>) -> Self {
        Self { mdp_solver }
    }
}

impl Policy<Discrete> for MdpSolverPolicy {
    fn action(&self, s: &Discrete) -> Option<Discrete> {
        self.mdp_solver.pi_star(*s)
    }
}
