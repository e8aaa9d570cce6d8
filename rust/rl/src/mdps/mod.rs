pub mod mdp_solver_policy;
pub mod policy;
pub mod schedules;
pub mod solvers;
pub mod value_table;

use rl_envs::{Continous, Discrete};

/// Queries over the solution a planner computed for a model.
pub trait MdpSolver {
    fn v_star(&self, s: Discrete) -> Continous;

    /// -inf for actions with no transition out of `s`.
    fn q_star(&self, s: Discrete, a: Discrete) -> Continous;

    /// `None` when `s` has no legal action.
    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    fn optimal_actions(&self, s: Discrete) -> &[Discrete];
}

/// A fixed mapping from states to actions.
pub trait Policy<S> {
    fn action(&self, s: &S) -> Option<Discrete>;
}

impl<S, F> Policy<S> for F
where
    F: Fn(&S) -> Discrete,
{
    fn action(&self, s: &S) -> Option<Discrete> {
        Some(self(s))
    }
}
