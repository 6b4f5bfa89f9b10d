use std::fmt;

use mealplan_solver::{SolutionStatus, SolveError, VariableError};
use thiserror::Error;

/// Where a [`LinearModel`](crate::LinearModel) is in its lifecycle
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    VariablesRegistered,
    ObjectiveSet,
    Solved(SolutionStatus),
    ResultsCollected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Created => f.write_str("created"),
            Stage::VariablesRegistered => f.write_str("variables registered"),
            Stage::ObjectiveSet => f.write_str("objective set"),
            Stage::Solved(status) => write!(f, "solved ({})", status),
            Stage::ResultsCollected => f.write_str("results collected"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableCreationError {
    #[error(transparent)]
    Invalid(#[from] VariableError),
    #[error("Variable name {0} is already registered")]
    DuplicateName(String),
    #[error("Variable {0} has no solver handle yet")]
    NotRealized(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to register variable #{index} ({name}): {source}")]
pub struct VariableRegistrationError {
    pub index: usize,
    pub name: String,
    pub source: VariableCreationError,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoefficientDerivationError {
    #[error("Cannot take {selector} from variable {variable}")]
    Inapplicable { variable: String, selector: &'static str },
    #[error("Expected {expected} coefficients, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Coefficient for variable {0} is not finite")]
    NotFinite(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectiveConstructionError {
    #[error("Objective needs at least one variable")]
    Empty,
    #[error("No coefficients were derived or supplied for the objective")]
    MissingCoefficients,
    #[error("Expected {expected} objective coefficients, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Objective coefficient #{0} is not finite")]
    NotFinite(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintConstructionError {
    #[error("Constraint {name} expects {expected} coefficients, got {actual}")]
    LengthMismatch { name: String, expected: usize, actual: usize },
    #[error("Constraint {0} has a non-finite coefficient or limit")]
    NotFinite(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultExtractionError {
    #[error("Cannot read results of a {0} solve")]
    NotOptimal(SolutionStatus),
    #[error("Engine returned {actual} values for {expected} variables")]
    MissingValues { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot {operation} while the model is at stage '{current}'; requires '{required}'")]
pub struct SequenceViolationError {
    pub operation: &'static str,
    pub current: Stage,
    pub required: Stage,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Failed to create variable: {0}")]
    VariableCreation(#[from] VariableCreationError),
    #[error(transparent)]
    VariableRegistration(#[from] VariableRegistrationError),
    #[error("Failed to derive coefficients: {0}")]
    CoefficientDerivation(#[from] CoefficientDerivationError),
    #[error("Failed to set objective: {0}")]
    ObjectiveConstruction(#[from] ObjectiveConstructionError),
    #[error("Failed to add constraint: {0}")]
    ConstraintConstruction(#[from] ConstraintConstructionError),
    #[error("Solver failed: {0}")]
    SolveExecution(#[from] SolveError),
    #[error("Failed to collect results: {0}")]
    ResultExtraction(#[from] ResultExtractionError),
    #[error(transparent)]
    SequenceViolation(#[from] SequenceViolationError),
}
