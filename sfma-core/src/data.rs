//! Observations and their standard errors.

use anyhow::Result;
use sfma_data::levels::reorder_f64;
use sfma_data::DataTable;

use crate::error::{ModelError, ModelResult};

/// Observed outcomes `y` with per-observation standard errors `obs_se`.
///
/// Immutable once built; `obs_se` is strictly positive everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    y: Vec<f64>,
    obs_se: Vec<f64>,
}

impl Data {
    /// Build from observation and standard-error vectors.
    pub fn new(y: Vec<f64>, obs_se: Vec<f64>) -> ModelResult<Self> {
        if y.len() != obs_se.len() {
            return Err(ModelError::DimensionMismatch {
                what: "obs_se length",
                expected: y.len(),
                got: obs_se.len(),
            });
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData(format!(
                "observation {} is not finite: {}",
                i, y[i]
            )));
        }
        if let Some(i) = obs_se.iter().position(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(ModelError::InvalidData(format!(
                "standard error {} must be finite and positive, got {}",
                i, obs_se[i]
            )));
        }
        Ok(Self { y, obs_se })
    }

    /// Pull the observation and standard-error columns from a table.
    pub fn from_table(table: &DataTable, obs_col: &str, obs_se_col: &str) -> Result<Self> {
        let y = table.numeric_column(obs_col)?;
        let obs_se = table.numeric_column(obs_se_col)?;
        Ok(Self::new(y, obs_se)?)
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn obs_se(&self) -> &[f64] {
        &self.obs_se
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    /// Data with rows gathered in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            y: reorder_f64(&self.y, indices),
            obs_se: reorder_f64(&self.obs_se, indices),
        }
    }
}
