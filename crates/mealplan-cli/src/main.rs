mod menu;
mod report;

use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info};
use mealplan_model::SolutionStatus;
use mealplan_solver::Solver;

use crate::menu::ProblemKind;
use crate::report::Report;

#[derive(Parser)]
#[command(name = "mealplan")]
#[command(about = "Solve the primal (profit) and dual (cost) menu planning problems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Output format (pretty, json)
    #[arg(short, long, default_value = "pretty", global = true)]
    format: String,
    /// Keep the terminal contents instead of clearing before the results
    #[arg(long, global = true)]
    no_clear: bool,
    /// Maximum branch-and-bound nodes per problem
    #[arg(long, default_value_t = 10000, global = true)]
    max_nodes: usize,
    /// Time limit per problem, in seconds
    #[arg(long, global = true)]
    time_limit: Option<f64>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Maximize the profit of the menu
    Primal,
    /// Minimize the production cost of the four meals
    Dual,
    /// Solve both problems (default)
    All,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut solver = Solver::new().with_max_nodes(cli.max_nodes);
    if let Some(secs) = cli.time_limit {
        match Duration::try_from_secs_f64(secs) {
            Ok(limit) => solver = solver.with_time_limit(limit),
            Err(e) => {
                eprintln!("Invalid time limit {}: {}", secs, e);
                std::process::exit(2);
            }
        }
    }

    let kinds: &[ProblemKind] = match cli.command.unwrap_or(Commands::All) {
        Commands::Primal => &[ProblemKind::Primal],
        Commands::Dual => &[ProblemKind::Dual],
        Commands::All => &[ProblemKind::Primal, ProblemKind::Dual],
    };

    let mut reports = Vec::new();
    for &kind in kinds {
        match menu::solve(kind, &solver) {
            Ok(model) => {
                info!("{} finished with status {:?}", kind.label(), model.status());
                reports.push((kind, Report::from_model(kind, &model)));
            }
            Err(e) => {
                error!("{} failed: {}", kind.label(), e);
                eprintln!("Failed to solve {}: {}", kind.label().to_lowercase(), e);
                std::process::exit(1);
            }
        }
    }

    if cli.format == "json" {
        let payload: Vec<&Report> = reports.iter().map(|(_, r)| r).collect();
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing results: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if !cli.no_clear {
            if let Err(e) = report::clear_screen() {
                error!("could not clear the screen: {}", e);
            }
        }
        for (kind, r) in &reports {
            print!("{}", report::render(*kind, r));
        }
    }

    if reports.iter().any(|(_, r)| r.status != SolutionStatus::Optimal) {
        std::process::exit(1);
    }
}
