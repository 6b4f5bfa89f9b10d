use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Value space of a decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
    /// Integer restricted to {0, 1}
    Binary,
}

impl VarKind {
    pub fn is_integral(self) -> bool {
        matches!(self, VarKind::Integer | VarKind::Binary)
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarKind::Continuous => "Continuous",
            VarKind::Integer => "Integer",
            VarKind::Binary => "Binary",
        };
        f.write_str(name)
    }
}

impl FromStr for VarKind {
    type Err = VariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(VarKind::Continuous),
            "integer" => Ok(VarKind::Integer),
            "binary" => Ok(VarKind::Binary),
            _ => Err(VariableError::UnknownDomain(s.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    #[error("Variable name must not be empty")]
    EmptyName,
    #[error("Unknown variable domain: {0}")]
    UnknownDomain(String),
    #[error("Bound of variable {0} is not a number")]
    NanBound(String),
    #[error("Variable {0} has a bound at the wrong infinity")]
    InfiniteBound(String),
    #[error("Variable {name} has lower bound {lower} above upper bound {upper}")]
    InconsistentBounds { name: String, lower: f64, upper: f64 },
    #[error("Binary variable {0} must have bounds within [0, 1]")]
    BinaryOutOfRange(String),
}

/// A decision variable as the engine sees it
///
/// `None` bounds are unbounded in that direction. A variable with no lower
/// bound is free. Infinite bounds are stored as `None`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        kind: VarKind,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self, VariableError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VariableError::EmptyName);
        }
        if lower.is_some_and(f64::is_nan) || upper.is_some_and(f64::is_nan) {
            return Err(VariableError::NanBound(name));
        }
        if lower == Some(f64::INFINITY) || upper == Some(f64::NEG_INFINITY) {
            return Err(VariableError::InfiniteBound(name));
        }
        // -inf below and +inf above are the same as no bound at all
        let lower = lower.filter(|l| l.is_finite());
        let upper = upper.filter(|u| u.is_finite());

        let (lower, upper) = match kind {
            VarKind::Binary => {
                let lower = lower.unwrap_or(0.0);
                let upper = upper.unwrap_or(1.0);
                if lower < 0.0 || upper > 1.0 {
                    return Err(VariableError::BinaryOutOfRange(name));
                }
                (Some(lower), Some(upper))
            }
            _ => (lower, upper),
        };

        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(VariableError::InconsistentBounds { name, lower, upper });
            }
        }

        Ok(Self { name, kind, lower, upper })
    }

    /// Continuous variable bounded below by zero
    pub fn non_negative(name: impl Into<String>) -> Result<Self, VariableError> {
        Self::new(name, VarKind::Continuous, Some(0.0), None)
    }
}

/// Optimization direction
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
    /// Any feasible point will do; the objective is only evaluated
    Target,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sense::Maximize => "maximize",
            Sense::Minimize => "minimize",
            Sense::Target => "target",
        };
        f.write_str(name)
    }
}

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Optional label used in diagnostics
    pub name: Option<String>,
    pub variables: Vec<Variable>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    /// Operator after both sides of the row are negated
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl Constraint {
    /// Left-hand side evaluated at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients.iter().zip(values).map(|(a, x)| a * x).sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(values);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<Variable>) -> Self {
        let n = variables.len();
        Self {
            name: None,
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                sense: Sense::Minimize,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, sense: Sense) {
        self.objective = Objective { coefficients, sense };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn has_integer_variables(&self) -> bool {
        self.variables.iter().any(|v| v.kind.is_integral())
    }

    /// Objective expression evaluated at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }
}
