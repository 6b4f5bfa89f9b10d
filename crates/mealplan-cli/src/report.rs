use std::io::{self, Write};

use mealplan_model::{LinearModel, SolutionStatus};
use serde::Serialize;

use crate::menu::ProblemKind;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub problem: String,
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variables: Vec<ReportLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub name: String,
    pub value: f64,
}

impl Report {
    pub fn from_model(kind: ProblemKind, model: &LinearModel) -> Self {
        let variables = match model.values() {
            Some(values) => model
                .names()
                .into_iter()
                .zip(values)
                .map(|(name, value)| ReportLine {
                    name: name.to_string(),
                    value,
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            problem: model.label().unwrap_or(kind.label()).to_string(),
            status: model.status().unwrap_or(SolutionStatus::Error),
            objective_value: model.objective_value(),
            variables,
        }
    }
}

/// Variable names use underscores in place of spaces
pub fn display_name(name: &str) -> String {
    name.replace('_', " ")
}

pub fn format_currency(value: f64) -> String {
    format!("R${:.2}", value)
}

/// Console text for one problem, followed by a blank line
pub fn render(kind: ProblemKind, report: &Report) -> String {
    let mut lines = Vec::new();

    match report.objective_value.filter(|_| report.status == SolutionStatus::Optimal) {
        None => {
            lines.push(report.problem.clone());
            lines.push(format!("Status: {}", report.status));
        }
        Some(total) => {
            lines.push("Results:".to_string());
            match kind {
                ProblemKind::Primal => {
                    lines.push(format!("Profit: {}", format_currency(total)));
                    lines.extend(
                        report
                            .variables
                            .iter()
                            .map(|line| format!("{}: {:.0} unit(s)", display_name(&line.name), line.value)),
                    );
                }
                ProblemKind::Dual => {
                    lines.push(format!("Minimum total cost of the 4 meals: {}", format_currency(total)));
                    lines.extend(
                        report
                            .variables
                            .iter()
                            .map(|line| format!("{}: {}", display_name(&line.name), format_currency(line.value))),
                    );
                }
            }
        }
    }
    lines.push(String::new());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn clear_screen() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"\x1B[2J\x1B[1;1H")?;
    stdout.flush()
}
