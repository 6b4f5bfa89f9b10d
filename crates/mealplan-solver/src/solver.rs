use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::problem::{LpProblem, Sense};
use crate::simplex::{Bounds, LpOutcome, Simplex};
use crate::solution::{Solution, SolveError};

/// LP/MIP solver: bounded simplex with depth-first branch-and-bound for
/// integer and binary variables
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum simplex iterations per phase
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Distance from an integer still accepted as integral
    integrality_tolerance: f64,
    /// Maximum branch-and-bound nodes before giving up
    max_nodes: usize,
    time_limit: Option<Duration>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            integrality_tolerance: 1e-6,
            max_nodes: 10000,
            time_limit: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Solve the problem.
    ///
    /// Infeasible and unbounded problems are reported through
    /// [`Solution::status`]; `Err` means the engine could not finish.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        self.validate(problem)?;
        debug!(
            "solving {}: {} variables, {} constraints, sense {}",
            problem.name.as_deref().unwrap_or("<unnamed>"),
            problem.num_variables(),
            problem.num_constraints(),
            problem.objective.sense
        );

        let simplex = Simplex {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            feasibility_tolerance: self.integrality_tolerance * 0.1,
            deadline: self.time_limit.map(|limit| (Instant::now() + limit, limit)),
        };
        let root = self.root_bounds(problem);

        let solution = if problem.has_integer_variables() {
            self.branch_and_bound(problem, &simplex, root)?
        } else {
            match simplex.solve(problem, &root)? {
                LpOutcome::Optimal(values) => self.finish(problem, values, 1),
                LpOutcome::Infeasible => Solution::infeasible(1),
                LpOutcome::Unbounded => Solution::unbounded(1),
            }
        };

        debug!("solve finished with status {} after {} node(s)", solution.status, solution.nodes);
        Ok(solution)
    }

    fn validate(&self, problem: &LpProblem) -> Result<(), SolveError> {
        let n = problem.num_variables();
        if problem.objective.coefficients.len() != n {
            return Err(SolveError::DimensionMismatch(format!(
                "objective has {} coefficients for {} variables",
                problem.objective.coefficients.len(),
                n
            )));
        }
        for c in &problem.constraints {
            if c.coefficients.len() != n {
                return Err(SolveError::DimensionMismatch(format!(
                    "constraint {} has {} coefficients for {} variables",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(SolveError::DimensionMismatch(format!(
                    "constraint {} has a non-finite entry",
                    c.name
                )));
            }
        }
        if problem.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::DimensionMismatch("objective has a non-finite coefficient".to_string()));
        }
        for v in &problem.variables {
            let bad_lower = v.lower.is_some_and(|l| l.is_nan() || l == f64::INFINITY);
            let bad_upper = v.upper.is_some_and(|u| u.is_nan() || u == f64::NEG_INFINITY);
            if bad_lower || bad_upper {
                return Err(SolveError::DimensionMismatch(format!(
                    "variable {} has an unusable bound",
                    v.name
                )));
            }
        }
        Ok(())
    }

    /// Variable bounds, tightened to integers for integral variables.
    /// Infinite bounds become `None`.
    fn root_bounds(&self, problem: &LpProblem) -> Vec<Bounds> {
        problem
            .variables
            .iter()
            .map(|v| {
                let lower = v.lower.filter(|l| l.is_finite());
                let upper = v.upper.filter(|u| u.is_finite());
                if v.kind.is_integral() {
                    Bounds {
                        lower: lower.map(|l| (l - self.integrality_tolerance).ceil()),
                        upper: upper.map(|u| (u + self.integrality_tolerance).floor()),
                    }
                } else {
                    Bounds { lower, upper }
                }
            })
            .collect()
    }

    fn branch_and_bound(
        &self,
        problem: &LpProblem,
        simplex: &Simplex,
        root: Vec<Bounds>,
    ) -> Result<Solution, SolveError> {
        let mut stack = vec![root];
        let mut incumbent: Option<(f64, Vec<f64>)> = None;
        let mut nodes = 0;

        while let Some(bounds) = stack.pop() {
            nodes += 1;
            if nodes > self.max_nodes {
                return Err(SolveError::NodeLimit(self.max_nodes));
            }
            simplex.check_deadline()?;

            let values = match simplex.solve(problem, &bounds)? {
                LpOutcome::Optimal(values) => values,
                LpOutcome::Infeasible => {
                    trace!("node {} infeasible", nodes);
                    continue;
                }
                // Tightening bounds never turns a bounded relaxation unbounded,
                // so this only happens at the root
                LpOutcome::Unbounded => return Ok(Solution::unbounded(nodes)),
            };

            let score = self.score(problem, &values);
            if let Some((best, _)) = &incumbent {
                if score <= best + self.tolerance {
                    trace!("node {} pruned at {}", nodes, score);
                    continue;
                }
            }

            match self.most_fractional(problem, &values) {
                None => {
                    trace!("node {} integral with score {}", nodes, score);
                    incumbent = Some((score, values));
                    if problem.objective.sense == Sense::Target {
                        break;
                    }
                }
                Some((j, value)) => {
                    let mut down = bounds.clone();
                    down[j].upper = Some(value.floor());
                    let mut up = bounds;
                    up[j].lower = Some(value.ceil());

                    // Explore the side nearer the relaxed value first
                    if value - value.floor() < 0.5 {
                        stack.push(up);
                        stack.push(down);
                    } else {
                        stack.push(down);
                        stack.push(up);
                    }
                }
            }
        }

        Ok(match incumbent {
            Some((_, values)) => self.finish(problem, values, nodes),
            None => Solution::infeasible(nodes),
        })
    }

    /// Objective in maximization terms
    fn score(&self, problem: &LpProblem, values: &[f64]) -> f64 {
        match problem.objective.sense {
            Sense::Maximize => problem.evaluate(values),
            Sense::Minimize => -problem.evaluate(values),
            Sense::Target => 0.0,
        }
    }

    fn most_fractional(&self, problem: &LpProblem, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (j, (var, &value)) in problem.variables.iter().zip(values).enumerate() {
            if !var.kind.is_integral() {
                continue;
            }
            let fraction = (value - value.round()).abs();
            if fraction <= self.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, _, f)| fraction > f) {
                best = Some((j, value, fraction));
            }
        }
        best.map(|(j, value, _)| (j, value))
    }

    fn finish(&self, problem: &LpProblem, values: Vec<f64>, nodes: usize) -> Solution {
        let values: Vec<f64> = problem
            .variables
            .iter()
            .zip(values)
            .map(|(var, value)| {
                if var.kind.is_integral() {
                    value.round()
                } else if value.abs() < self.tolerance {
                    0.0
                } else {
                    value
                }
            })
            .collect();
        let objective_value = problem.evaluate(&values);
        Solution::optimal(values, objective_value, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, VarKind, Variable};
    use crate::solution::SolutionStatus;

    fn integer(name: &str, lower: Option<f64>, upper: Option<f64>) -> Variable {
        Variable::new(name, VarKind::Integer, lower, upper).unwrap()
    }

    #[test]
    fn test_integer_rounding_by_branching() {
        // Maximize 5x + 4y
        // Subject to 6x + 4y <= 24, x + 2y <= 6
        // LP optimum is (3, 1.5); integer optimum is (4, 0) with 20
        let mut problem = LpProblem::new(vec![
            integer("x", Some(0.0), None),
            integer("y", Some(0.0), None),
        ]);
        problem.set_objective(vec![5.0, 4.0], Sense::Maximize);
        problem.add_constraint("c1", vec![6.0, 4.0], ConstraintOp::Le, 24.0);
        problem.add_constraint("c2", vec![1.0, 2.0], ConstraintOp::Le, 6.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 20.0).abs() < 1e-6, "obj = {}", solution.objective_value);
        for v in &solution.values {
            assert_eq!(*v, v.round());
        }
        assert!(solution.nodes > 1);
    }

    #[test]
    fn test_binary_knapsack() {
        // Values 10, 13, 7 with weights 4, 6, 3 and capacity 7 -> pick items 0 and 2
        let mut problem = LpProblem::new(vec![
            Variable::new("a", VarKind::Binary, None, None).unwrap(),
            Variable::new("b", VarKind::Binary, None, None).unwrap(),
            Variable::new("c", VarKind::Binary, None, None).unwrap(),
        ]);
        problem.set_objective(vec![10.0, 13.0, 7.0], Sense::Maximize);
        problem.add_constraint("weight", vec![4.0, 6.0, 3.0], ConstraintOp::Le, 7.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![1.0, 0.0, 1.0]);
        assert!((solution.objective_value - 17.0).abs() < 1e-6);
    }

    #[test]
    fn test_integer_infeasible_without_lattice_point() {
        // 2x = 3 has no integer solution
        let mut problem = LpProblem::new(vec![integer("x", Some(0.0), Some(10.0))]);
        problem.set_objective(vec![1.0], Sense::Minimize);
        problem.add_constraint("odd", vec![2.0], ConstraintOp::Eq, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_unbounded_integer_problem() {
        let mut problem = LpProblem::new(vec![integer("x", Some(0.0), None)]);
        problem.set_objective(vec![2.0], Sense::Maximize);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_target_sense_finds_feasible_point() {
        let mut problem = LpProblem::new(vec![
            integer("x", Some(0.0), Some(10.0)),
            integer("y", Some(0.0), Some(10.0)),
        ]);
        problem.set_objective(vec![1.0, 1.0], Sense::Target);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 7.0);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] + solution.values[1] - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let mut problem = LpProblem::new(vec![Variable::non_negative("x").unwrap()]);
        problem.set_objective(vec![1.0, 2.0], Sense::Minimize);

        assert!(matches!(
            Solver::new().solve(&problem),
            Err(SolveError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_infinite_bounds_are_treated_as_absent() {
        // Bypasses Variable::new, which would already normalize these
        let mut problem = LpProblem::new(vec![Variable {
            name: "x".to_string(),
            kind: VarKind::Continuous,
            lower: Some(0.0),
            upper: Some(f64::INFINITY),
        }]);
        problem.set_objective(vec![3.0], Sense::Maximize);
        assert_eq!(Solver::new().solve(&problem).unwrap().status, SolutionStatus::Unbounded);

        let mut problem = LpProblem::new(vec![Variable {
            name: "x".to_string(),
            kind: VarKind::Continuous,
            lower: Some(f64::NEG_INFINITY),
            upper: None,
        }]);
        problem.set_objective(vec![1.0], Sense::Minimize);
        problem.add_constraint("floor", vec![1.0], ConstraintOp::Ge, -4.0);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] + 4.0).abs() < 1e-6, "x = {} (expected -4)", solution.values[0]);
    }

    #[test]
    fn test_wrong_way_infinite_bound_is_rejected() {
        let mut problem = LpProblem::new(vec![Variable {
            name: "x".to_string(),
            kind: VarKind::Continuous,
            lower: Some(f64::INFINITY),
            upper: None,
        }]);
        problem.set_objective(vec![1.0], Sense::Minimize);

        assert!(matches!(
            Solver::new().solve(&problem),
            Err(SolveError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_time_limit_applies_to_plain_lp() {
        let mut problem = LpProblem::new(vec![
            Variable::non_negative("x").unwrap(),
            Variable::non_negative("y").unwrap(),
        ]);
        problem.set_objective(vec![3.0, 2.0], Sense::Maximize);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);

        let result = Solver::new().with_time_limit(Duration::ZERO).solve(&problem);
        assert_eq!(result.unwrap_err(), SolveError::TimeLimit(Duration::ZERO));
    }

    #[test]
    fn test_node_limit_surfaces_as_error() {
        let mut problem = LpProblem::new(vec![
            integer("x", Some(0.0), None),
            integer("y", Some(0.0), None),
        ]);
        problem.set_objective(vec![5.0, 4.0], Sense::Maximize);
        problem.add_constraint("c1", vec![6.0, 4.0], ConstraintOp::Le, 24.0);
        problem.add_constraint("c2", vec![1.0, 2.0], ConstraintOp::Le, 6.0);

        let result = Solver::new().with_max_nodes(1).solve(&problem);
        assert_eq!(result.unwrap_err(), SolveError::NodeLimit(1));
    }
}
