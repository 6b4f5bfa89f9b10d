use std::time::{Duration, Instant};

use crate::problem::{ConstraintOp, LpProblem, Sense};
use crate::solution::SolveError;

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_RUN_LIMIT: usize = 50;

/// Bounds of one variable at a branch-and-bound node
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Outcome of a single LP relaxation
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    Optimal(Vec<f64>),
    Infeasible,
    Unbounded,
}

/// Two-phase tableau simplex over a bounded problem
pub(crate) struct Simplex {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub feasibility_tolerance: f64,
    /// Wall-clock deadline and the limit it was derived from
    pub deadline: Option<(Instant, Duration)>,
}

/// How an original variable maps onto non-negative standard-form columns
#[derive(Debug, Clone, Copy)]
enum ColumnMap {
    /// x = offset + y
    Shifted { col: usize, offset: f64 },
    /// x = pos - neg
    Split { pos: usize, neg: usize },
}

struct Row {
    coefficients: Vec<f64>,
    op: ConstraintOp,
    rhs: f64,
}

/// The problem rewritten as `max c·y` over `y >= 0`
struct StandardForm {
    columns: Vec<ColumnMap>,
    n_cols: usize,
    rows: Vec<Row>,
    objective: Vec<f64>,
}

impl StandardForm {
    fn build(problem: &LpProblem, bounds: &[Bounds]) -> Self {
        let mut columns = Vec::with_capacity(bounds.len());
        let mut n_cols = 0;
        for b in bounds {
            match b.lower {
                Some(offset) => {
                    columns.push(ColumnMap::Shifted { col: n_cols, offset });
                    n_cols += 1;
                }
                None => {
                    columns.push(ColumnMap::Split { pos: n_cols, neg: n_cols + 1 });
                    n_cols += 2;
                }
            }
        }

        // Simplex maximizes, so minimization negates the objective
        let sign = match problem.objective.sense {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
            Sense::Target => 0.0,
        };
        let mut objective = vec![0.0; n_cols];
        for (map, &coef) in columns.iter().zip(&problem.objective.coefficients) {
            match *map {
                ColumnMap::Shifted { col, .. } => objective[col] += sign * coef,
                ColumnMap::Split { pos, neg } => {
                    objective[pos] += sign * coef;
                    objective[neg] -= sign * coef;
                }
            }
        }

        let mut rows = Vec::with_capacity(problem.num_constraints() + bounds.len());
        for c in &problem.constraints {
            let mut coefficients = vec![0.0; n_cols];
            let mut rhs = c.rhs;
            for (map, &a) in columns.iter().zip(&c.coefficients) {
                match *map {
                    ColumnMap::Shifted { col, offset } => {
                        coefficients[col] += a;
                        rhs -= a * offset;
                    }
                    ColumnMap::Split { pos, neg } => {
                        coefficients[pos] += a;
                        coefficients[neg] -= a;
                    }
                }
            }
            rows.push(Row { coefficients, op: c.op, rhs });
        }

        for (map, b) in columns.iter().zip(bounds) {
            let Some(upper) = b.upper else { continue };
            let mut coefficients = vec![0.0; n_cols];
            let rhs = match *map {
                ColumnMap::Shifted { col, offset } => {
                    coefficients[col] = 1.0;
                    upper - offset
                }
                ColumnMap::Split { pos, neg } => {
                    coefficients[pos] = 1.0;
                    coefficients[neg] = -1.0;
                    upper
                }
            };
            rows.push(Row { coefficients, op: ConstraintOp::Le, rhs });
        }

        Self { columns, n_cols, rows, objective }
    }

    fn recover(&self, y: &[f64]) -> Vec<f64> {
        self.columns
            .iter()
            .map(|map| match *map {
                ColumnMap::Shifted { col, offset } => offset + y[col],
                ColumnMap::Split { pos, neg } => y[pos] - y[neg],
            })
            .collect()
    }
}

struct Tableau {
    /// Constraint rows followed by the objective row; last column is the RHS
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn new(form: &StandardForm) -> Self {
        let n_vars = form.n_cols;
        let n_constraints = form.rows.len();

        // Keep every RHS non-negative so the slack/artificial basis is feasible
        let rows: Vec<Row> = form
            .rows
            .iter()
            .map(|r| {
                if r.rhs < 0.0 {
                    Row {
                        coefficients: r.coefficients.iter().map(|a| -a).collect(),
                        op: r.op.flipped(),
                        rhs: -r.rhs,
                    }
                } else {
                    Row {
                        coefficients: r.coefficients.clone(),
                        op: r.op,
                        rhs: r.rhs,
                    }
                }
            })
            .collect();

        let n_slack = rows.iter().filter(|r| r.op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.op != ConstraintOp::Le).count();
        let total_cols = n_vars + n_slack + n_artificial + 1;

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_constraints + 1],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;
        for (i, row) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(&row.coefficients);
            tableau.data[i][total_cols - 1] = row.rhs;

            match row.op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        tableau.data[n_constraints][..n_vars].copy_from_slice(&form.objective);
        tableau
    }

    fn n_constraints(&self) -> usize {
        self.basic_vars.len()
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for value in self.data[row].iter_mut() {
            *value /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor != 0.0 {
                for (value, &p) in current.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
            }
        }
    }

    fn structural_values(&self) -> Vec<f64> {
        let rhs_col = self.rhs_col();
        let mut values = vec![0.0; self.n_vars];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < self.n_vars {
                values[basic] = self.data[i][rhs_col];
            }
        }
        values
    }
}

impl Simplex {
    pub fn check_deadline(&self) -> Result<(), SolveError> {
        match self.deadline {
            Some((deadline, limit)) if Instant::now() >= deadline => Err(SolveError::TimeLimit(limit)),
            _ => Ok(()),
        }
    }

    pub fn solve(&self, problem: &LpProblem, bounds: &[Bounds]) -> Result<LpOutcome, SolveError> {
        let crossed = bounds.iter().any(|b| match (b.lower, b.upper) {
            (Some(lower), Some(upper)) => lower > upper + self.feasibility_tolerance,
            _ => false,
        });
        if crossed {
            return Ok(LpOutcome::Infeasible);
        }

        let form = StandardForm::build(problem, bounds);
        let mut tableau = Tableau::new(&form);

        if tableau.n_artificial > 0 && !self.phase1(&mut tableau)? {
            return Ok(LpOutcome::Infeasible);
        }

        if !self.phase2(&mut tableau)? {
            return Ok(LpOutcome::Unbounded);
        }

        Ok(LpOutcome::Optimal(form.recover(&tableau.structural_values())))
    }

    /// Drives the artificial variables to zero. Returns false if that is impossible.
    fn phase1(&self, tableau: &mut Tableau) -> Result<bool, SolveError> {
        let n_constraints = tableau.n_constraints();
        let obj_row = n_constraints;
        let art_start = tableau.artificial_start();
        let art_end = art_start + tableau.n_artificial;
        let rhs_col = tableau.rhs_col();

        let original = std::mem::take(&mut tableau.data[obj_row]);

        // maximize -sum(artificials), expressed in terms of the non-basic columns
        let mut phase_row = vec![0.0; rhs_col + 1];
        for value in &mut phase_row[art_start..art_end] {
            *value = -1.0;
        }
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for (value, &a) in phase_row.iter_mut().zip(&tableau.data[i]) {
                    *value += a;
                }
            }
        }
        tableau.data[obj_row] = phase_row;

        if !self.optimize(tableau, rhs_col)? {
            return Ok(false);
        }

        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col] > self.feasibility_tolerance {
                return Ok(false);
            }
        }

        // Artificials still basic sit at zero; pivot them out where a structural column allows it
        for i in 0..n_constraints {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.pivot(i, col);
            }
        }

        tableau.data[obj_row] = original;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                let row = tableau.data[i].clone();
                for (value, a) in tableau.data[obj_row].iter_mut().zip(row) {
                    *value -= ratio * a;
                }
            }
        }

        Ok(true)
    }

    /// Returns false if the objective is unbounded
    fn phase2(&self, tableau: &mut Tableau) -> Result<bool, SolveError> {
        // Artificial columns never re-enter the basis
        let limit = tableau.artificial_start();
        self.optimize(tableau, limit)
    }

    fn optimize(&self, tableau: &mut Tableau, column_limit: usize) -> Result<bool, SolveError> {
        let rhs_col = tableau.rhs_col();
        let mut degenerate_run = 0;

        for _ in 0..self.max_iterations {
            self.check_deadline()?;
            let bland = degenerate_run >= DEGENERATE_RUN_LIMIT;
            let Some(col) = self.entering_column(tableau, column_limit, bland) else {
                return Ok(true);
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                return Ok(false);
            };

            if tableau.data[row][rhs_col] <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            tableau.pivot(row, col);
        }

        Err(SolveError::IterationLimit(self.max_iterations))
    }

    fn entering_column(&self, tableau: &Tableau, column_limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.n_constraints()];
        let mut candidates = (0..column_limit).filter(|&j| obj[j] > self.tolerance);

        if bland {
            return candidates.next();
        }

        // Most positive reduced cost
        candidates.fold(None, |best: Option<usize>, j| match best {
            Some(b) if obj[b] >= obj[j] => Some(b),
            _ => Some(j),
        })
    }

    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();
        let mut best: Option<(usize, f64)> = None;

        for i in 0..tableau.n_constraints() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((_, min_ratio)) if ratio < min_ratio - self.tolerance => Some((i, ratio)),
                // Ties go to the lowest basic index
                Some((row, min_ratio))
                    if (ratio - min_ratio).abs() <= self.tolerance
                        && tableau.basic_vars[i] < tableau.basic_vars[row] =>
                {
                    Some((i, ratio))
                }
                keep => keep,
            };
        }

        best.map(|(row, _)| row)
    }
}
