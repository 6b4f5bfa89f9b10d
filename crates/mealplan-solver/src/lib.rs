mod problem;
mod simplex;
mod solution;
mod solver;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Sense, VarKind, Variable, VariableError};
pub use solution::{Solution, SolutionStatus, SolveError};
pub use solver::Solver;
