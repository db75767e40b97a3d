//! sfma: objectives for stochastic frontier meta-analysis models.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sfma",
    version,
    about = "SFMA-RS: linear mixed-effects objectives for stochastic frontier meta-analysis",
    long_about = "Builds marginal or maximal linear-model objectives from a data table and a\n\
                   JSON model description, and evaluates or exports them for an external optimizer."
)]
struct Cli {
    /// Worker threads for evaluating candidates (0 uses every core)
    #[arg(long, default_value = "1", global = true)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the objective at one or more candidate vectors
    Evaluate(commands::evaluate::EvaluateArgs),

    /// Write fixed-effect predictions for a candidate vector
    Predict(commands::predict::PredictArgs),

    /// Export variables, bounds and constraints for an optimizer
    Problem(commands::problem::ProblemArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Evaluate(_) => "evaluate",
            Commands::Predict(_) => "predict",
            Commands::Problem(_) => "problem",
        }
    }
}

/// Crates whose events follow `-v`; everything else stays at `warn`.
const LOG_TARGETS: [&str; 3] = ["sfma", "sfma_core", "sfma_data"];

fn log_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => return "warn".to_string(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["warn".to_string()];
    directives.extend(LOG_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // num_threads(0) lets rayon pick one thread per core
    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    tracing::info!(
        "sfma {} v{} on {} threads",
        cli.command.name(),
        env!("CARGO_PKG_VERSION"),
        rayon::current_num_threads()
    );

    match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Predict(args) => commands::predict::run(args),
        Commands::Problem(args) => commands::problem::run(args),
    }
}
