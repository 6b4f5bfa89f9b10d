mod coefficients;
mod descriptor;
mod engine;
mod error;
mod model;

pub use coefficients::{derive_with, CoefficientSource};
pub use descriptor::{VariableDescriptor, Weight};
pub use engine::Engine;
pub use error::{
    CoefficientDerivationError, ConstraintConstructionError, ModelError, ObjectiveConstructionError,
    ResultExtractionError, SequenceViolationError, Stage, VariableCreationError, VariableRegistrationError,
};
pub use mealplan_solver::{ConstraintOp, Sense, SolutionStatus, VarKind};
pub use model::{LinearModel, VariableRecord};
