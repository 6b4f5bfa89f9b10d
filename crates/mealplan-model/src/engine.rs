use mealplan_solver::{LpProblem, Solution, SolveError, Solver};

/// Solving backend used by [`LinearModel`](crate::LinearModel)
pub trait Engine {
    /// Solve a fully assembled problem.
    ///
    /// Infeasible or unbounded problems are an `Ok` solution with that status;
    /// `Err` is reserved for the engine failing to run.
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

impl Engine for Solver {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        Solver::solve(self, problem)
    }

    fn name(&self) -> &str {
        "simplex"
    }
}
