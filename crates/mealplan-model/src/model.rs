use std::collections::HashSet;

use log::{debug, warn};
use mealplan_solver::{Constraint, ConstraintOp, LpProblem, Sense, Solution, SolutionStatus, Solver};

use crate::coefficients::{self, CoefficientSource};
use crate::descriptor::VariableDescriptor;
use crate::engine::Engine;
use crate::error::{
    ConstraintConstructionError, ModelError, ObjectiveConstructionError, ResultExtractionError,
    SequenceViolationError, Stage, VariableRegistrationError,
};

/// Everything the model knows about one registered variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub descriptor: VariableDescriptor,
    /// Objective coefficient, once derived or supplied
    pub coefficient: Option<f64>,
    /// Value assigned by the last optimal solve, once collected
    pub value: Option<f64>,
}

/// A linear program assembled step by step from variable descriptors
///
/// Operations must run in order: register variables, (derive coefficients),
/// set the objective, add constraints, solve, collect results, compute the
/// objective value. Skipping a step fails with
/// [`ModelError::SequenceViolation`]; any failing operation leaves the model
/// as it was.
#[derive(Debug, Clone)]
pub struct LinearModel {
    direction: Sense,
    label: Option<String>,
    variables: Vec<VariableRecord>,
    constraints: Vec<Constraint>,
    stage: Stage,
    last_solution: Option<Solution>,
    objective_value: Option<f64>,
}

impl LinearModel {
    pub fn new(direction: Sense) -> Self {
        Self {
            direction,
            label: None,
            variables: Vec::new(),
            constraints: Vec::new(),
            stage: Stage::Created,
            last_solution: None,
            objective_value: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Realize each descriptor in order and append them to the model.
    ///
    /// Either the whole batch is registered or none of it is. Returns the
    /// number of variables added.
    pub fn register_variables<I>(&mut self, descriptors: I) -> Result<usize, ModelError>
    where
        I: IntoIterator<Item = VariableDescriptor>,
    {
        if !matches!(self.stage, Stage::Created | Stage::VariablesRegistered) {
            return Err(self.violation("register variables", Stage::VariablesRegistered));
        }

        let mut taken: HashSet<String> = self.names().into_iter().map(str::to_string).collect();
        let mut batch = Vec::new();
        for (index, mut descriptor) in descriptors.into_iter().enumerate() {
            let name = descriptor.name().to_string();
            if let Err(source) = descriptor.realize(&taken) {
                warn!("{}: rejected variable {}: {}", self.display_label(), name, source);
                return Err(VariableRegistrationError { index, name, source }.into());
            }
            taken.insert(name);
            batch.push(VariableRecord {
                descriptor,
                coefficient: None,
                value: None,
            });
        }

        let added = batch.len();
        self.variables.extend(batch);
        self.stage = Stage::VariablesRegistered;
        debug!("{}: registered {} variable(s)", self.display_label(), added);
        Ok(added)
    }

    /// Compute one coefficient per registered variable and keep them for
    /// [`set_objective`](Self::set_objective).
    pub fn derive_coefficients(&mut self, source: CoefficientSource) -> Result<Vec<f64>, ModelError> {
        self.require_exact("derive coefficients", Stage::VariablesRegistered)?;
        let derived = source.derive(self.variables.iter().map(|r| &r.descriptor))?;
        Ok(self.store_coefficients(derived))
    }

    /// Like [`derive_coefficients`](Self::derive_coefficients) with a caller-supplied selector
    pub fn derive_coefficients_with<F>(&mut self, selector: F) -> Result<Vec<f64>, ModelError>
    where
        F: Fn(&VariableDescriptor) -> Option<f64>,
    {
        self.require_exact("derive coefficients", Stage::VariablesRegistered)?;
        let derived = coefficients::derive_with(self.variables.iter().map(|r| &r.descriptor), selector)?;
        Ok(self.store_coefficients(derived))
    }

    fn store_coefficients(&mut self, derived: Vec<f64>) -> Vec<f64> {
        for (record, &c) in self.variables.iter_mut().zip(&derived) {
            record.coefficient = Some(c);
        }
        debug!("{}: derived coefficients {:?}", self.display_label(), derived);
        derived
    }

    /// Build the objective from `coefficients`, or from the derived ones when `None`
    pub fn set_objective(&mut self, coefficients: Option<Vec<f64>>) -> Result<(), ModelError> {
        self.require_exact("set the objective", Stage::VariablesRegistered)?;
        if self.variables.is_empty() {
            return Err(ObjectiveConstructionError::Empty.into());
        }

        let coefficients = match coefficients {
            Some(list) => {
                if list.len() != self.variables.len() {
                    return Err(ObjectiveConstructionError::LengthMismatch {
                        expected: self.variables.len(),
                        actual: list.len(),
                    }
                    .into());
                }
                list
            }
            None => self
                .variables
                .iter()
                .map(|r| r.coefficient)
                .collect::<Option<Vec<f64>>>()
                .ok_or(ObjectiveConstructionError::MissingCoefficients)?,
        };
        if let Some(i) = coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ObjectiveConstructionError::NotFinite(i).into());
        }

        for (record, c) in self.variables.iter_mut().zip(coefficients) {
            record.coefficient = Some(c);
        }
        self.stage = Stage::ObjectiveSet;
        debug!("{}: objective set ({})", self.display_label(), self.direction);
        Ok(())
    }

    /// Append `Σ coefficients[i]·x[i] op limit`. Returns the constraint index.
    pub fn add_constraint(&mut self, coefficients: Vec<f64>, op: ConstraintOp, limit: f64) -> Result<usize, ModelError> {
        let name = format!("constraint_{}", self.constraints.len() + 1);
        self.add_named_constraint(name, coefficients, op, limit)
    }

    /// Adding a constraint to a solved model discards its results so it can
    /// be solved again.
    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        limit: f64,
    ) -> Result<usize, ModelError> {
        self.require_objective("add a constraint")?;

        let name = name.into();
        if coefficients.len() != self.variables.len() {
            return Err(ConstraintConstructionError::LengthMismatch {
                name,
                expected: self.variables.len(),
                actual: coefficients.len(),
            }
            .into());
        }
        if !limit.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ConstraintConstructionError::NotFinite(name).into());
        }

        if self.stage != Stage::ObjectiveSet {
            debug!("{}: discarding results of the previous solve", self.display_label());
            self.reset_results();
        }

        debug!("{}: {} {} {}", self.display_label(), name, op.symbol(), limit);
        self.constraints.push(Constraint {
            name,
            coefficients,
            op,
            rhs: limit,
        });
        Ok(self.constraints.len() - 1)
    }

    /// Solve with the default engine
    pub fn solve(&mut self) -> Result<SolutionStatus, ModelError> {
        self.solve_with(&Solver::default())
    }

    /// Run `engine` once on the assembled problem.
    ///
    /// Infeasible and unbounded outcomes are returned as statuses. Only an
    /// engine failure is an error, and it leaves the model untouched.
    pub fn solve_with<E>(&mut self, engine: &E) -> Result<SolutionStatus, ModelError>
    where
        E: Engine + ?Sized,
    {
        self.require_objective("solve")?;
        let problem = self.problem()?;

        debug!("{}: solving with {}", self.display_label(), engine.name());
        let solution = engine.solve(&problem).inspect_err(|e| {
            warn!("{}: {} failed: {}", self.display_label(), engine.name(), e);
        })?;

        let status = solution.status;
        self.reset_results();
        self.last_solution = Some(solution);
        self.stage = Stage::Solved(status);
        debug!("{}: status {}", self.display_label(), status);
        Ok(status)
    }

    /// The problem as it would be handed to the engine
    pub fn problem(&self) -> Result<LpProblem, ModelError> {
        let variables = self
            .variables
            .iter()
            .map(|r| r.descriptor.handle().cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let coefficients = self.variables.iter().map(|r| r.coefficient.unwrap_or(0.0)).collect();

        let mut problem = LpProblem::new(variables);
        problem.name = self.label.clone();
        problem.set_objective(coefficients, self.direction);
        problem.constraints = self.constraints.clone();
        Ok(problem)
    }

    /// Copy the assigned value of every variable into its record
    pub fn collect_results(&mut self) -> Result<(), ModelError> {
        let solution = match (self.stage, &self.last_solution) {
            (Stage::Solved(SolutionStatus::Optimal) | Stage::ResultsCollected, Some(solution)) => solution,
            (Stage::Solved(status), _) => return Err(ResultExtractionError::NotOptimal(status).into()),
            _ => return Err(self.violation("collect results", Stage::Solved(SolutionStatus::Optimal))),
        };

        if solution.values.len() != self.variables.len() {
            return Err(ResultExtractionError::MissingValues {
                expected: self.variables.len(),
                actual: solution.values.len(),
            }
            .into());
        }

        let values = solution.values.clone();
        for (record, value) in self.variables.iter_mut().zip(values) {
            record.value = Some(value);
        }
        self.stage = Stage::ResultsCollected;
        Ok(())
    }

    /// Σ value·coefficient over the collected results.
    ///
    /// Recomputed from the assigned values rather than taken from the engine.
    pub fn compute_objective_value(&mut self) -> Result<f64, ModelError> {
        self.require_exact("compute the objective value", Stage::ResultsCollected)?;

        let total: f64 = self
            .variables
            .iter()
            .map(|r| r.value.unwrap_or(0.0) * r.coefficient.unwrap_or(0.0))
            .sum();
        self.objective_value = Some(total);
        debug!("{}: objective value {}", self.display_label(), total);
        Ok(total)
    }

    pub fn direction(&self) -> Sense {
        self.direction
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Status of the last solve, if any
    pub fn status(&self) -> Option<SolutionStatus> {
        self.last_solution.as_ref().map(|s| s.status)
    }

    pub fn variables(&self) -> &[VariableRecord] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|r| r.descriptor.name()).collect()
    }

    /// Objective coefficients in registration order, once all are known
    pub fn coefficients(&self) -> Option<Vec<f64>> {
        self.variables.iter().map(|r| r.coefficient).collect()
    }

    /// Collected values in registration order
    pub fn values(&self) -> Option<Vec<f64>> {
        self.variables.iter().map(|r| r.value).collect()
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    /// Objective value as reported by the engine, for comparison
    pub fn solver_objective_value(&self) -> Option<f64> {
        self.last_solution
            .as_ref()
            .filter(|s| s.is_optimal())
            .map(|s| s.objective_value)
    }

    fn reset_results(&mut self) {
        for record in &mut self.variables {
            record.value = None;
        }
        self.last_solution = None;
        self.objective_value = None;
        if matches!(self.stage, Stage::Solved(_) | Stage::ResultsCollected) {
            self.stage = Stage::ObjectiveSet;
        }
    }

    fn require_exact(&self, operation: &'static str, required: Stage) -> Result<(), ModelError> {
        if self.stage == required {
            Ok(())
        } else {
            Err(self.violation(operation, required))
        }
    }

    /// The objective has been set, whether or not the model was solved since
    fn require_objective(&self, operation: &'static str) -> Result<(), ModelError> {
        match self.stage {
            Stage::ObjectiveSet | Stage::Solved(_) | Stage::ResultsCollected => Ok(()),
            _ => Err(self.violation(operation, Stage::ObjectiveSet)),
        }
    }

    fn violation(&self, operation: &'static str, required: Stage) -> ModelError {
        warn!(
            "{}: cannot {} at stage '{}' (requires '{}')",
            self.display_label(),
            operation,
            self.stage,
            required
        );
        SequenceViolationError {
            operation,
            current: self.stage,
            required,
        }
        .into()
    }

    fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("model")
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::{CoefficientDerivationError, VariableCreationError};
    use mealplan_solver::{SolveError, VarKind, VariableError};

    fn menu() -> Vec<VariableDescriptor> {
        vec![
            VariableDescriptor::product("Breakfast", VarKind::Integer, 25.0).with_bounds(30.0, 130.0),
            VariableDescriptor::product("Lunch", VarKind::Integer, 30.0).with_bounds(20.0, 70.0),
            VariableDescriptor::product("Coffee_Break", VarKind::Integer, 20.0).with_bounds(40.0, 150.0),
            VariableDescriptor::product("Dinner", VarKind::Integer, 40.0).with_bounds(20.0, 55.0),
        ]
    }

    fn costs() -> Vec<VariableDescriptor> {
        vec![
            VariableDescriptor::cost("Breakfast_cost", VarKind::Integer).with_lower(10.0),
            VariableDescriptor::cost("Lunch_cost", VarKind::Integer).with_lower(15.0),
            VariableDescriptor::cost("Coffee_Break_cost", VarKind::Integer).with_lower(8.0),
            VariableDescriptor::cost("Dinner_cost", VarKind::Integer).with_lower(22.0),
        ]
    }

    fn primal_ready() -> LinearModel {
        let mut model = LinearModel::new(Sense::Maximize).with_label("primal");
        model.register_variables(menu()).unwrap();
        model.derive_coefficients(CoefficientSource::ProfitMargin).unwrap();
        model.set_objective(None).unwrap();
        model
    }

    struct FailingEngine;

    impl Engine for FailingEngine {
        fn solve(&self, _problem: &LpProblem) -> Result<Solution, SolveError> {
            Err(SolveError::IterationLimit(7))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[derive(Default)]
    struct CountingEngine {
        calls: Cell<usize>,
    }

    impl Engine for CountingEngine {
        fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
            self.calls.set(self.calls.get() + 1);
            Solver::new().solve(problem)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_feasible_maximize() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Optimal);
        model.collect_results().unwrap();
        let objective = model.compute_objective_value().unwrap();

        let values = model.values().unwrap();
        let bounds = [(30.0, 130.0), (20.0, 70.0), (40.0, 150.0), (20.0, 55.0)];
        for (v, (lo, hi)) in values.iter().zip(bounds) {
            assert!(*v >= lo && *v <= hi, "{} outside [{}, {}]", v, lo, hi);
            assert_eq!(*v, v.round());
        }
        assert!(values.iter().sum::<f64>() <= 350.0 + 1e-6);

        let expected: f64 = values.iter().zip([25.0, 30.0, 20.0, 40.0]).map(|(v, c)| v * c).sum();
        assert!((objective - expected).abs() < 1e-6);
        // Dinner and lunch at capacity, breakfast fills, coffee break takes the rest
        assert!((objective - 9450.0).abs() < 1e-6, "obj = {} (expected 9450)", objective);
        assert_eq!(model.names(), vec!["Breakfast", "Lunch", "Coffee_Break", "Dinner"]);
        assert_eq!(model.stage(), Stage::ResultsCollected);
    }

    #[test]
    fn test_feasible_minimize() {
        let mut model = LinearModel::new(Sense::Minimize).with_label("dual");
        model.register_variables(costs()).unwrap();
        model.set_objective(Some(vec![1.0; 4])).unwrap();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Ge, 100.0).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Optimal);
        model.collect_results().unwrap();
        let objective = model.compute_objective_value().unwrap();

        let values = model.values().unwrap();
        assert!(values.iter().sum::<f64>() >= 100.0 - 1e-6);
        for (v, lo) in values.iter().zip([10.0, 15.0, 8.0, 22.0]) {
            assert!(*v >= lo, "{} below {}", v, lo);
        }
        assert!((objective - 100.0).abs() < 1e-6, "obj = {} (expected 100)", objective);
    }

    #[test]
    fn test_contradictory_bounds_never_reach_solve() {
        let engine = CountingEngine::default();
        let mut model = LinearModel::new(Sense::Maximize);

        let err = model
            .register_variables(vec![VariableDescriptor::new("x", VarKind::Integer).with_bounds(10.0, 5.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::VariableRegistration(VariableRegistrationError {
                index: 0,
                source: VariableCreationError::Invalid(VariableError::InconsistentBounds { .. }),
                ..
            })
        ));
        assert!(model.variables().is_empty());
        assert_eq!(model.stage(), Stage::Created);

        assert!(matches!(model.solve_with(&engine), Err(ModelError::SequenceViolation(_))));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn test_unbounded() {
        let mut model = LinearModel::new(Sense::Maximize);
        model
            .register_variables(vec![VariableDescriptor::product("x", VarKind::Continuous, 3.0).with_lower(0.0)])
            .unwrap();
        model.derive_coefficients(CoefficientSource::ProfitMargin).unwrap();
        model.set_objective(None).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Unbounded);
        assert_eq!(model.status(), Some(SolutionStatus::Unbounded));
        assert_eq!(
            model.collect_results(),
            Err(ModelError::ResultExtraction(ResultExtractionError::NotOptimal(
                SolutionStatus::Unbounded
            )))
        );
        assert_eq!(model.objective_value(), None);
    }

    #[test]
    fn test_infinite_upper_bound_is_unbounded() {
        let mut model = LinearModel::new(Sense::Maximize);
        model
            .register_variables(vec![
                VariableDescriptor::product("x", VarKind::Continuous, 3.0).with_bounds(0.0, f64::INFINITY),
            ])
            .unwrap();
        model.derive_coefficients(CoefficientSource::ProfitMargin).unwrap();
        model.set_objective(None).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Unbounded);
        assert_eq!(model.objective_value(), None);
    }

    #[test]
    fn test_negative_infinite_lower_bound_is_free() {
        let mut model = LinearModel::new(Sense::Minimize);
        model
            .register_variables(vec![VariableDescriptor::new("x", VarKind::Continuous).with_lower(f64::NEG_INFINITY)])
            .unwrap();
        model.set_objective(Some(vec![1.0])).unwrap();
        model.add_constraint(vec![1.0], ConstraintOp::Ge, -4.0).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Optimal);
        model.collect_results().unwrap();
        let x = model.values().unwrap()[0];
        assert!((x + 4.0).abs() < 1e-6, "x = {} (expected -4)", x);
        assert!((model.compute_objective_value().unwrap() + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_way_infinite_bound_fails_registration() {
        let mut model = LinearModel::new(Sense::Minimize);
        let err = model
            .register_variables(vec![VariableDescriptor::new("x", VarKind::Continuous).with_lower(f64::INFINITY)])
            .unwrap_err();

        assert!(matches!(err, ModelError::VariableRegistration(_)), "got {:?}", err);
        assert_eq!(model.stage(), Stage::Created);
    }

    #[test]
    fn test_infeasible_is_a_status() {
        let mut model = LinearModel::new(Sense::Minimize);
        model
            .register_variables(vec![VariableDescriptor::new("x", VarKind::Integer).with_bounds(0.0, 5.0)])
            .unwrap();
        model.set_objective(Some(vec![1.0])).unwrap();
        model.add_constraint(vec![1.0], ConstraintOp::Ge, 8.0).unwrap();

        assert_eq!(model.solve().unwrap(), SolutionStatus::Infeasible);
        assert_eq!(model.stage(), Stage::Solved(SolutionStatus::Infeasible));
    }

    #[test]
    fn test_partial_batch_is_not_kept() {
        let mut model = LinearModel::new(Sense::Maximize);
        let mut batch = menu();
        batch.push(VariableDescriptor::product("Lunch", VarKind::Integer, 1.0));

        let err = model.register_variables(batch).unwrap_err();
        assert!(matches!(
            err,
            ModelError::VariableRegistration(VariableRegistrationError {
                index: 4,
                source: VariableCreationError::DuplicateName(_),
                ..
            })
        ));
        assert!(model.variables().is_empty());

        // The model is still usable
        assert_eq!(model.register_variables(menu()).unwrap(), 4);
    }

    #[test]
    fn test_objective_length_mismatch_leaves_state() {
        let mut model = LinearModel::new(Sense::Maximize);
        model.register_variables(menu()).unwrap();

        let err = model.set_objective(Some(vec![1.0, 2.0])).unwrap_err();
        assert_eq!(
            err,
            ModelError::ObjectiveConstruction(ObjectiveConstructionError::LengthMismatch { expected: 4, actual: 2 })
        );
        assert_eq!(model.stage(), Stage::VariablesRegistered);
        assert_eq!(model.coefficients(), None);

        model.set_objective(Some(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
        assert_eq!(model.coefficients(), Some(vec![1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_constraint_length_mismatch_leaves_state() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();

        let err = model.add_constraint(vec![1.0; 3], ConstraintOp::Le, 10.0).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConstraintConstruction(ConstraintConstructionError::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
        assert_eq!(model.constraints().len(), 1);
    }

    #[test]
    fn test_empty_objective_is_invalid() {
        let mut model = LinearModel::new(Sense::Maximize);
        assert_eq!(model.register_variables(Vec::new()).unwrap(), 0);

        assert_eq!(
            model.set_objective(Some(Vec::new())),
            Err(ModelError::ObjectiveConstruction(ObjectiveConstructionError::Empty))
        );
    }

    #[test]
    fn test_objective_without_coefficients() {
        let mut model = LinearModel::new(Sense::Maximize);
        model.register_variables(menu()).unwrap();

        assert_eq!(
            model.set_objective(None),
            Err(ModelError::ObjectiveConstruction(ObjectiveConstructionError::MissingCoefficients))
        );
    }

    #[test]
    fn test_inapplicable_selector() {
        let mut model = LinearModel::new(Sense::Minimize);
        model.register_variables(costs()).unwrap();

        let err = model.derive_coefficients(CoefficientSource::ProfitMargin).unwrap_err();
        assert_eq!(
            err,
            ModelError::CoefficientDerivation(CoefficientDerivationError::Inapplicable {
                variable: "Breakfast_cost".to_string(),
                selector: "profit margin",
            })
        );
        assert_eq!(model.coefficients(), None);
    }

    #[test]
    fn test_custom_selector() {
        let mut model = LinearModel::new(Sense::Minimize);
        model.register_variables(costs()).unwrap();

        let derived = model.derive_coefficients_with(|d| d.lower().map(|l| l / 2.0)).unwrap();
        assert_eq!(derived, vec![5.0, 7.5, 4.0, 11.0]);
    }

    #[test]
    fn test_sequence_violations() {
        let mut model = LinearModel::new(Sense::Maximize);

        let err = model.set_objective(Some(vec![1.0])).unwrap_err();
        assert_eq!(
            err,
            ModelError::SequenceViolation(SequenceViolationError {
                operation: "set the objective",
                current: Stage::Created,
                required: Stage::VariablesRegistered,
            })
        );

        model.register_variables(menu()).unwrap();
        assert!(matches!(
            model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 1.0),
            Err(ModelError::SequenceViolation(SequenceViolationError {
                required: Stage::ObjectiveSet,
                ..
            }))
        ));
        assert!(matches!(model.solve(), Err(ModelError::SequenceViolation(_))));
        assert!(matches!(model.collect_results(), Err(ModelError::SequenceViolation(_))));
        assert!(matches!(model.compute_objective_value(), Err(ModelError::SequenceViolation(_))));

        model.set_objective(Some(vec![1.0; 4])).unwrap();
        assert!(matches!(model.set_objective(Some(vec![1.0; 4])), Err(ModelError::SequenceViolation(_))));
        assert!(matches!(model.register_variables(costs()), Err(ModelError::SequenceViolation(_))));
    }

    #[test]
    fn test_engine_failure_is_reported() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();

        assert_eq!(
            model.solve_with(&FailingEngine),
            Err(ModelError::SolveExecution(SolveError::IterationLimit(7)))
        );
        assert_eq!(model.stage(), Stage::ObjectiveSet);
        assert_eq!(model.status(), None);
    }

    #[test]
    fn test_resolve_after_new_constraint() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();
        model.solve().unwrap();
        model.collect_results().unwrap();
        let first = model.compute_objective_value().unwrap();

        // Cap dinner further; results from the first solve are discarded
        model
            .add_named_constraint("dinner_cap", vec![0.0, 0.0, 0.0, 1.0], ConstraintOp::Le, 30.0)
            .unwrap();
        assert_eq!(model.stage(), Stage::ObjectiveSet);
        assert_eq!(model.values(), None);
        assert_eq!(model.objective_value(), None);

        assert_eq!(model.solve().unwrap(), SolutionStatus::Optimal);
        model.collect_results().unwrap();
        let second = model.compute_objective_value().unwrap();

        assert!(second < first);
        assert!(model.values().unwrap()[3] <= 30.0);
    }

    #[test]
    fn test_local_objective_matches_engine() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();
        model.solve().unwrap();
        model.collect_results().unwrap();

        let local = model.compute_objective_value().unwrap();
        let reported = model.solver_objective_value().unwrap();
        assert!((local - reported).abs() < 1e-6);
    }

    #[test]
    fn test_problem_mirrors_model() {
        let mut model = primal_ready();
        model.add_constraint(vec![1.0; 4], ConstraintOp::Le, 350.0).unwrap();

        let problem = model.problem().unwrap();
        assert_eq!(problem.name.as_deref(), Some("primal"));
        assert_eq!(problem.objective.coefficients, vec![25.0, 30.0, 20.0, 40.0]);
        assert_eq!(problem.objective.sense, Sense::Maximize);
        assert_eq!(problem.num_constraints(), 1);
        assert_eq!(problem.variables[3].upper, Some(55.0));
    }
}
