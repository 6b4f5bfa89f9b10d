use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The result of solving an LP/MIP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values for each variable, empty unless optimal
    pub values: Vec<f64>,
    /// Objective value reported by the engine
    pub objective_value: f64,
    /// Branch-and-bound nodes explored (1 for a pure LP)
    pub nodes: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error
    Error,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::Unbounded => "UNBOUNDED",
            SolutionStatus::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Failures of the engine itself, as opposed to a model without a solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Problem is malformed: {0}")]
    DimensionMismatch(String),
    #[error("Simplex did not converge within {0} iterations")]
    IterationLimit(usize),
    #[error("Branch-and-bound exceeded {0} nodes")]
    NodeLimit(usize),
    #[error("Solve exceeded the time limit of {0:?}")]
    TimeLimit(Duration),
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, nodes: usize) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            nodes,
        }
    }

    pub fn infeasible(nodes: usize) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes,
        }
    }

    pub fn unbounded(nodes: usize) -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NAN,
            nodes,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
