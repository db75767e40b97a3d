//! Building a ParameterSet from a model description and a data table.
//!
//! Fixed effects become columns of the fixed-effect design matrix (ones
//! for an intercept). Each random effect expands into one indicator column
//! per level of its grouping column, scaled by its covariate for random
//! slopes, and shares a single variance parameter across those columns.

use anyhow::{bail, Context, Result};
use sfma_data::table::is_missing;
use sfma_data::{DataTable, GroupLevels};
use sfma_linalg::DenseMatrix;
use tracing::{debug, info, warn};

use super::config::{ConstraintConfig, ModelConfig, PriorConfig};
use super::parameter_set::ParameterSet;
use crate::constraint::LinearConstraint;
use crate::error::ModelError;
use crate::prior::Prior;

impl ParameterSet {
    /// Process a model description against the rows of `table`.
    ///
    /// Covariate columns must be finite on every row and grouping columns
    /// must carry a label on every row; callers drop incomplete rows first
    /// with [`DataTable::complete_rows`] and [`DataTable::labelled_rows`].
    pub fn process(config: &ModelConfig, table: &DataTable) -> Result<Self> {
        let n = table.n_rows();

        let fe_names: Vec<String> = config.fixed_effects.iter().map(|fe| fe.name.clone()).collect();
        let re_var_names: Vec<String> =
            config.random_effects.iter().map(|re| re.name.clone()).collect();
        check_unique(&fe_names, &re_var_names)?;

        // Fixed effects
        let mut fe_data = Vec::with_capacity(n * fe_names.len());
        for fe in &config.fixed_effects {
            let col = covariate_values(table, fe.covariate.as_deref())
                .with_context(|| format!("Fixed effect '{}'", fe.name))?;
            fe_data.extend(col);
        }
        let design_matrix_fe = DenseMatrix::from_col_major(n, fe_names.len(), fe_data);

        // Random effects
        let mut re_data = Vec::new();
        let mut var_index = Vec::new();
        for (k, re) in config.random_effects.iter().enumerate() {
            let labels = table
                .text_column(&re.group)
                .with_context(|| format!("Random effect '{}'", re.name))?;
            let n_missing = labels.iter().filter(|l| is_missing(l)).count();
            if n_missing > 0 {
                bail!(
                    "Random effect '{}': {} row(s) have no label in column '{}'",
                    re.name,
                    n_missing,
                    re.group
                );
            }
            let groups = GroupLevels::from_labels(&labels);
            if groups.n_levels() == 1 {
                warn!(
                    "Random effect '{}' has a single level in column '{}'",
                    re.name, re.group
                );
            }
            let values = covariate_values(table, re.covariate.as_deref())
                .with_context(|| format!("Random effect '{}'", re.name))?;

            for level in 0..groups.n_levels() {
                re_data.extend(
                    groups
                        .codes
                        .iter()
                        .zip(&values)
                        .map(|(&code, &v)| if code == level { v } else { 0.0 }),
                );
                var_index.push(k);
            }
            debug!(
                "Random effect '{}': {} levels over column '{}', smallest level has {} rows",
                re.name,
                groups.n_levels(),
                re.group,
                groups.counts().into_iter().min().unwrap_or(0)
            );
        }
        let n_re_cols = var_index.len();
        let design_matrix_re = DenseMatrix::from_col_major(n, n_re_cols, re_data);

        let mut re_var_padding = DenseMatrix::zeros(n_re_cols, re_var_names.len());
        for (col, &k) in var_index.iter().enumerate() {
            re_var_padding.set(col, k, 1.0);
        }

        // Priors and bounds
        let fe_priors: Vec<Prior> = config
            .fixed_effects
            .iter()
            .map(|fe| scalar_prior(fe.prior.as_ref(), f64::NEG_INFINITY))
            .collect();
        let re_var_priors: Vec<Prior> = config
            .random_effects
            .iter()
            .map(|re| scalar_prior(re.prior.as_ref(), 0.0))
            .collect();
        let (lb_fe, ub_fe) = group_bounds(&fe_priors, f64::NEG_INFINITY);
        let (lb_re_var, ub_re_var) = group_bounds(&re_var_priors, 0.0);

        // Constraints
        let constr_fe = build_constraint(&config.fe_constraints, &fe_names)
            .context("Invalid fixed-effect constraint")?;
        let constr_re_var = build_constraint(&config.re_var_constraints, &re_var_names)
            .context("Invalid variance constraint")?;

        let param_set = ParameterSet {
            fe_names,
            re_var_names,
            design_matrix_fe,
            design_matrix_re,
            re_var_padding,
            lb_fe,
            ub_fe,
            lb_re_var,
            ub_re_var,
            constr_fe,
            constr_re_var,
            fe_priors,
            re_var_priors,
        };
        param_set.validate()?;

        info!(
            "Parameter set: {} observations, {} fixed effects, {} random-effect columns, {} variance parameters",
            n,
            param_set.num_fe(),
            n_re_cols,
            param_set.num_re_var()
        );

        Ok(param_set)
    }
}

fn check_unique(fe_names: &[String], re_var_names: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for name in fe_names.iter().chain(re_var_names) {
        if !seen.insert(name.as_str()) {
            bail!("Duplicate variable name '{}'", name);
        }
    }
    Ok(())
}

/// Covariate column, or ones for an intercept.
fn covariate_values(table: &DataTable, covariate: Option<&str>) -> Result<Vec<f64>> {
    let Some(name) = covariate else {
        return Ok(vec![1.0; table.n_rows()]);
    };
    let values = table.numeric_column(name)?;
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        bail!("Covariate '{}' is missing or non-finite at row {}", name, i);
    }
    Ok(values)
}

fn scalar_prior(prior: Option<&PriorConfig>, default_lb: f64) -> Prior {
    match prior {
        Some(p) => p.to_prior(default_lb),
        None => Prior::uniform(default_lb, f64::INFINITY),
    }
}

/// Bounds of a group: uniform priors set them; others keep the default.
fn group_bounds(priors: &[Prior], default_lb: f64) -> (Vec<f64>, Vec<f64>) {
    let mut lb = Vec::with_capacity(priors.len());
    let mut ub = Vec::with_capacity(priors.len());
    for prior in priors {
        match prior {
            Prior::Uniform { lb: l, ub: u } => {
                lb.extend_from_slice(l);
                ub.extend_from_slice(u);
            }
            Prior::Gaussian { mean, .. } => {
                lb.extend(std::iter::repeat(default_lb).take(mean.len()));
                ub.extend(std::iter::repeat(f64::INFINITY).take(mean.len()));
            }
        }
    }
    (lb, ub)
}

/// One constraint row per entry, over the columns named in `names`.
fn build_constraint(
    rows: &[ConstraintConfig],
    names: &[String],
) -> Result<LinearConstraint, ModelError> {
    let mut matrix = DenseMatrix::zeros(rows.len(), names.len());
    for (i, row) in rows.iter().enumerate() {
        if row.terms.is_empty() {
            return Err(ModelError::InvalidConstraint(format!(
                "constraint {} has no terms",
                i
            )));
        }
        for (name, &coef) in &row.terms {
            let j = names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ModelError::UnknownVariable(name.clone()))?;
            matrix.set(i, j, coef);
        }
    }
    let lb = rows
        .iter()
        .map(|r| r.lb.unwrap_or(f64::NEG_INFINITY))
        .collect();
    let ub = rows.iter().map(|r| r.ub.unwrap_or(f64::INFINITY)).collect();
    LinearConstraint::new(matrix, lb, ub)
}
