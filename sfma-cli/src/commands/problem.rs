//! Export the optimization problem of a model.
//!
//! sfma problem --data-file ... --model-config ... --output-prefix fit

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use sfma_core::model::serialization::{problem_summary, save_problem, save_problem_json};
use sfma_core::model::{LinearMarginal, LinearMaximal, ModelKind, OptimizationProblem};

use super::{load_inputs, InputArgs};

#[derive(Args)]
pub struct ProblemArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output file prefix
    #[arg(long)]
    output_prefix: String,

    /// Also save JSON sidecar for debugging
    #[arg(long, default_value = "false")]
    save_json: bool,
}

pub fn run(args: ProblemArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;

    let problem = match inputs.kind {
        ModelKind::Marginal => {
            OptimizationProblem::from_model(&LinearMarginal::new(&inputs.param_set)?)
        }
        ModelKind::Maximal => {
            OptimizationProblem::from_model(&LinearMaximal::from_param_set(&inputs.param_set)?)
        }
    };

    let path = format!("{}.sfma.problem", args.output_prefix);
    save_problem(&problem, Path::new(&path))?;
    info!("Problem saved to {}", path);

    if args.save_json {
        let json_path = format!("{}.json", path);
        save_problem_json(&problem, Path::new(&json_path))?;
        info!("JSON sidecar saved to {}", json_path);
    }

    println!("{}", problem_summary(&problem));
    Ok(())
}
