//! Evaluate the objective at candidate vectors.
//!
//! sfma evaluate --data-file ... --model-config ... (--x 0.1,0.2 | --x-file candidates.txt)

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use sfma_core::data::Data;
use sfma_core::model::{LinearMarginal, LinearMaximal, LinearModel, ModelKind};

use super::{load_inputs, read_candidates, InputArgs};

#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Candidate vector (comma-separated)
    #[arg(long, allow_hyphen_values = true)]
    x: Option<String>,

    /// File with one comma-separated candidate vector per line
    #[arg(long)]
    x_file: Option<String>,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;
    let xs = read_candidates(args.x.as_deref(), args.x_file.as_deref())?;

    info!("=== Evaluating {} objective ===", inputs.kind);
    info!("Candidates: {}", xs.len());

    match inputs.kind {
        ModelKind::Marginal => {
            evaluate_with(&LinearMarginal::new(&inputs.param_set)?, &xs, &inputs.data)
        }
        ModelKind::Maximal => evaluate_with(
            &LinearMaximal::from_param_set(&inputs.param_set)?,
            &xs,
            &inputs.data,
        ),
    }
}

/// Print one objective per candidate; failed evaluations print NA.
fn evaluate_with<M: LinearModel + Sync>(model: &M, xs: &[Vec<f64>], data: &Data) -> Result<()> {
    let results = model.evaluate_batch(xs, data);

    let mut n_failed = 0;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(value) => println!("{:.10}", value),
            Err(e) => {
                warn!("Candidate {}: {}", i + 1, e);
                println!("NA");
                n_failed += 1;
            }
        }
    }

    if n_failed == xs.len() && !xs.is_empty() {
        anyhow::bail!("All {} candidate evaluations failed", n_failed);
    }
    Ok(())
}
