//! Subcommands and the input loading they share.

pub mod evaluate;
pub mod predict;
pub mod problem;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use sfma_core::data::Data;
use sfma_core::model::ModelKind;
use sfma_core::param::{ModelConfig, ParameterSet};
use sfma_data::DataTable;

#[derive(Args)]
pub struct InputArgs {
    /// Data file (tab, comma or whitespace delimited, with header)
    #[arg(long)]
    data_file: String,

    /// JSON model description
    #[arg(long)]
    model_config: String,

    /// Observation column name
    #[arg(long, default_value = "obs")]
    obs_col: String,

    /// Observation standard error column name
    #[arg(long, default_value = "obs_se")]
    obs_se_col: String,

    /// Objective: marginal or maximal
    #[arg(long, default_value = "marginal")]
    model: String,
}

/// Everything needed to build a model.
pub struct Inputs {
    pub kind: ModelKind,
    pub param_set: ParameterSet,
    pub data: Data,
}

/// Read the data and model description, drop incomplete rows, and process.
pub fn load_inputs(args: &InputArgs) -> Result<Inputs> {
    let kind: ModelKind = args.model.parse().map_err(anyhow::Error::msg)?;

    let table = DataTable::read(Path::new(&args.data_file))?;
    let config = ModelConfig::load(Path::new(&args.model_config))?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.columns.len(),
        args.data_file
    );

    let mut needed = vec![args.obs_col.as_str(), args.obs_se_col.as_str()];
    needed.extend(config.covariate_columns());
    let mut keep = table.complete_rows(&needed)?;
    if keep.len() < table.n_rows() {
        warn!(
            "Dropping {} rows with missing values in {:?}",
            table.n_rows() - keep.len(),
            needed
        );
    }
    let groups = config.group_columns();
    let labelled = table.labelled_rows(&groups)?;
    if labelled.len() < table.n_rows() {
        warn!(
            "Dropping {} rows with missing group labels in {:?}",
            table.n_rows() - labelled.len(),
            groups
        );
    }
    keep.retain(|i| labelled.binary_search(i).is_ok());
    if keep.is_empty() {
        bail!("No complete rows in {}", args.data_file);
    }
    let table = table.subset(&keep);

    let param_set = ParameterSet::process(&config, &table)
        .with_context(|| format!("Failed to process model config {}", args.model_config))?;
    let data = Data::from_table(&table, &args.obs_col, &args.obs_se_col)?;

    Ok(Inputs {
        kind,
        param_set,
        data,
    })
}

/// Parse a comma-separated candidate vector.
pub fn parse_vector(s: &str) -> Result<Vec<f64>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number '{}' in candidate vector", v.trim()))
        })
        .collect()
}

/// Candidate vectors from `--x` or one per non-empty line of `--x-file`.
pub fn read_candidates(x: Option<&str>, x_file: Option<&str>) -> Result<Vec<Vec<f64>>> {
    match (x, x_file) {
        (Some(x), None) => Ok(vec![parse_vector(x)?]),
        (None, Some(path)) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read candidate file: {}", path))?;
            contents
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| {
                    parse_vector(line).with_context(|| format!("{}:{}", path, i + 1))
                })
                .collect()
        }
        _ => bail!("Exactly one of --x or --x-file is required"),
    }
}
