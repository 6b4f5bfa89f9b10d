use std::collections::HashSet;

use mealplan_solver::{VarKind, Variable};

use crate::error::VariableCreationError;

/// The scalar a descriptor carries into the objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weight {
    /// Profit earned per unit (primal problems)
    ProfitMargin(f64),
    /// Cost paid per unit (dual problems)
    UnitCost(f64),
}

/// Specification of one decision variable before it is handed to a model
///
/// Realizing the descriptor validates it and produces the engine's
/// [`Variable`]. Builder methods on a realized descriptor drop the handle so
/// it can never disagree with the descriptor.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    name: String,
    domain: VarKind,
    lower: Option<f64>,
    upper: Option<f64>,
    weight: Option<Weight>,
    #[cfg_attr(feature = "serde", serde(skip))]
    handle: Option<Variable>,
}

impl VariableDescriptor {
    pub fn new(name: impl Into<String>, domain: VarKind) -> Self {
        Self {
            name: name.into(),
            domain,
            lower: None,
            upper: None,
            weight: None,
            handle: None,
        }
    }

    /// A sellable item with a profit margin
    pub fn product(name: impl Into<String>, domain: VarKind, profit_margin: f64) -> Self {
        Self {
            weight: Some(Weight::ProfitMargin(profit_margin)),
            ..Self::new(name, domain)
        }
    }

    /// A production cost whose value the model decides
    pub fn cost(name: impl Into<String>, domain: VarKind) -> Self {
        Self::new(name, domain)
    }

    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self.handle = None;
        self
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self.handle = None;
        self
    }

    pub fn with_bounds(self, lower: f64, upper: f64) -> Self {
        self.with_lower(lower).with_upper(upper)
    }

    pub fn with_unit_cost(mut self, cost: f64) -> Self {
        self.weight = Some(Weight::UnitCost(cost));
        self.handle = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> VarKind {
        self.domain
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    pub fn weight(&self) -> Option<Weight> {
        self.weight
    }

    pub fn profit_margin(&self) -> Option<f64> {
        match self.weight {
            Some(Weight::ProfitMargin(p)) => Some(p),
            _ => None,
        }
    }

    pub fn unit_cost(&self) -> Option<f64> {
        match self.weight {
            Some(Weight::UnitCost(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_realized(&self) -> bool {
        self.handle.is_some()
    }

    /// Build the solver handle. `taken` holds the names already used in the
    /// target model. On failure no handle is kept.
    pub fn realize(&mut self, taken: &HashSet<String>) -> Result<&Variable, VariableCreationError> {
        if taken.contains(&self.name) {
            self.handle = None;
            return Err(VariableCreationError::DuplicateName(self.name.clone()));
        }

        let variable = match Variable::new(self.name.clone(), self.domain, self.lower, self.upper) {
            Ok(v) => v,
            Err(e) => {
                self.handle = None;
                return Err(e.into());
            }
        };
        Ok(self.handle.insert(variable))
    }

    pub fn handle(&self) -> Result<&Variable, VariableCreationError> {
        self.handle
            .as_ref()
            .ok_or_else(|| VariableCreationError::NotRealized(self.name.clone()))
    }
}
