//! The two sample problems: maximizing menu profit (primal) and minimizing
//! production cost (dual).

use mealplan_model::{
    CoefficientSource, ConstraintOp, Engine, LinearModel, ModelError, Sense, SolutionStatus, VarKind,
    VariableDescriptor,
};

/// Total number of meals the kitchen can serve
pub const MEAL_CAPACITY: f64 = 350.0;
/// Combined production cost the four meals must at least reach
pub const MINIMUM_TOTAL_COST: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Primal,
    Dual,
}

impl ProblemKind {
    pub fn label(self) -> &'static str {
        match self {
            ProblemKind::Primal => "Primal problem",
            ProblemKind::Dual => "Dual problem",
        }
    }
}

pub fn menu_items() -> Vec<VariableDescriptor> {
    vec![
        VariableDescriptor::product("Breakfast", VarKind::Integer, 25.0).with_bounds(30.0, 130.0),
        VariableDescriptor::product("Lunch", VarKind::Integer, 30.0).with_bounds(20.0, 70.0),
        VariableDescriptor::product("Coffee_Break", VarKind::Integer, 20.0).with_bounds(40.0, 150.0),
        VariableDescriptor::product("Dinner", VarKind::Integer, 40.0).with_bounds(20.0, 55.0),
    ]
}

pub fn production_costs() -> Vec<VariableDescriptor> {
    vec![
        VariableDescriptor::cost("Breakfast_production_cost", VarKind::Integer).with_bounds(10.0, 35.0),
        VariableDescriptor::cost("Lunch_production_cost", VarKind::Integer).with_bounds(15.0, 45.0),
        VariableDescriptor::cost("Coffee_Break_production_cost", VarKind::Integer).with_bounds(8.0, 30.0),
        VariableDescriptor::cost("Dinner_production_cost", VarKind::Integer).with_bounds(22.0, 60.0),
    ]
}

/// Build and solve the requested problem. Results are collected only when
/// the solve is optimal.
pub fn solve<E: Engine>(kind: ProblemKind, engine: &E) -> Result<LinearModel, ModelError> {
    let mut model = match kind {
        ProblemKind::Primal => {
            let mut model = LinearModel::new(Sense::Maximize).with_label(kind.label());
            model.register_variables(menu_items())?;
            model.derive_coefficients(CoefficientSource::ProfitMargin)?;
            model.set_objective(None)?;
            model.add_constraint(vec![1.0; 4], ConstraintOp::Le, MEAL_CAPACITY)?;
            model
        }
        ProblemKind::Dual => {
            let mut model = LinearModel::new(Sense::Minimize).with_label(kind.label());
            model.register_variables(production_costs())?;
            model.set_objective(Some(vec![1.0; 4]))?;
            model.add_constraint(vec![1.0; 4], ConstraintOp::Ge, MINIMUM_TOTAL_COST)?;
            model
        }
    };

    if model.solve_with(engine)? == SolutionStatus::Optimal {
        model.collect_results()?;
        model.compute_objective_value()?;
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_solver::Solver;

    #[test]
    fn test_primal_profit() {
        let model = solve(ProblemKind::Primal, &Solver::new()).unwrap();
        assert_eq!(model.status(), Some(SolutionStatus::Optimal));
        assert!((model.objective_value().unwrap() - 9450.0).abs() < 1e-6);
    }

    #[test]
    fn test_dual_cost() {
        let model = solve(ProblemKind::Dual, &Solver::new()).unwrap();
        assert_eq!(model.status(), Some(SolutionStatus::Optimal));
        assert!((model.objective_value().unwrap() - MINIMUM_TOTAL_COST).abs() < 1e-6);

        let values = model.values().unwrap();
        for (v, (lo, hi)) in values.iter().zip([(10.0, 35.0), (15.0, 45.0), (8.0, 30.0), (22.0, 60.0)]) {
            assert!(*v >= lo && *v <= hi);
        }
    }
}
