//! Fixed-effect predictions for a candidate vector.
//!
//! sfma predict --data-file ... --model-config ... --x 0.1,0.2 [--output pred.tsv]

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use sfma_core::model::{LinearMarginal, LinearMaximal, LinearModel, ModelKind};

use super::{load_inputs, parse_vector, InputArgs};

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Candidate vector (comma-separated)
    #[arg(long, allow_hyphen_values = true)]
    x: String,

    /// Output file (stdout if omitted)
    #[arg(long)]
    output: Option<String>,
}

pub fn run(args: PredictArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;
    let x = parse_vector(&args.x)?;

    let pred = match inputs.kind {
        ModelKind::Marginal => LinearMarginal::new(&inputs.param_set)?.forward(&x)?,
        ModelKind::Maximal => LinearMaximal::from_param_set(&inputs.param_set)?.forward(&x)?,
    };

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(out);

    writeln!(writer, "obs\tpred")?;
    for (y, p) in inputs.data.y().iter().zip(&pred) {
        writeln!(writer, "{}\t{:.10}", y, p)?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("Wrote {} predictions to {}", pred.len(), path);
    }
    Ok(())
}
