//! The common interface of linear models.
//!
//! A model is initialized once from a [`ParameterSet`], after which its
//! objective is a pure function of the candidate vector and the data. An
//! optimizer reads the bounds and the stacked constraint system and calls
//! [`LinearModel::objective`] repeatedly.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sfma_linalg::DenseMatrix;

use crate::constraint::LinearConstraint;
use crate::data::Data;
use crate::error::{ModelError, ModelResult};
use crate::param::ParameterSet;

/// Which objective a model evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Random effects integrated out through the marginal covariance.
    Marginal,
    /// Weighted least squares on the fixed effects.
    Maximal,
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "marginal" => Ok(ModelKind::Marginal),
            "maximal" => Ok(ModelKind::Maximal),
            _ => Err(format!(
                "Unknown model kind: '{}'. Expected 'marginal' or 'maximal'",
                s
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Marginal => write!(f, "marginal"),
            ModelKind::Maximal => write!(f, "maximal"),
        }
    }
}

/// Interface shared by the linear models.
pub trait LinearModel {
    /// Rebuild every derived field from `param_set`.
    ///
    /// On error the model keeps its previous state.
    fn initialize(&mut self, _param_set: &ParameterSet) -> ModelResult<()> {
        Err(ModelError::NotImplemented {
            operation: "initialize",
        })
    }

    fn kind(&self) -> ModelKind;

    /// The parameter set the model was last initialized from, if any.
    fn param_set(&self) -> Option<&ParameterSet>;

    /// Length every candidate vector must have.
    fn x_dim(&self) -> usize;

    /// Matrix used for point prediction.
    fn design_matrix(&self) -> &DenseMatrix;

    /// Names of the entries of `x`.
    fn variable_names(&self) -> &[String];

    /// Box bounds `(lb, ub)` over `x`.
    fn bounds(&self) -> (&[f64], &[f64]);

    /// Stacked linear constraints over `x`.
    fn constraint(&self) -> &LinearConstraint;

    /// Objective to minimize at `x`.
    fn objective(&self, x: &[f64], data: &Data) -> ModelResult<f64>;

    /// Fail unless `x` has exactly `x_dim()` entries.
    fn prerun_check(&self, x: &[f64]) -> ModelResult<()> {
        if x.len() != self.x_dim() {
            return Err(ModelError::LengthMismatch {
                actual: x.len(),
                expected: self.x_dim(),
            });
        }
        Ok(())
    }

    /// `design_matrix() * x`.
    fn forward(&self, x: &[f64]) -> ModelResult<Vec<f64>> {
        self.forward_with(x, self.design_matrix())
    }

    /// `mat * x`.
    fn forward_with(&self, x: &[f64], mat: &DenseMatrix) -> ModelResult<Vec<f64>> {
        linear_forward(mat, x)
    }

    /// Evaluate the objective at many candidate vectors in parallel.
    fn evaluate_batch(&self, xs: &[Vec<f64>], data: &Data) -> Vec<ModelResult<f64>>
    where
        Self: Sync,
    {
        xs.par_iter().map(|x| self.objective(x, data)).collect()
    }
}

/// Matrix-vector product with a column-count check.
pub fn linear_forward(mat: &DenseMatrix, x: &[f64]) -> ModelResult<Vec<f64>> {
    if mat.ncols() != x.len() {
        return Err(ModelError::DimensionMismatch {
            what: "forward vector length",
            expected: mat.ncols(),
            got: x.len(),
        });
    }
    Ok(mat.mat_vec(x))
}

/// Fail unless the data rows match the design matrix rows.
pub(crate) fn check_data_rows(design: &DenseMatrix, data: &Data) -> ModelResult<()> {
    if data.n_obs() != design.nrows() {
        return Err(ModelError::DimensionMismatch {
            what: "number of observations",
            expected: design.nrows(),
            got: data.n_obs(),
        });
    }
    Ok(())
}

/// Reject a non-finite objective value.
pub(crate) fn finite_objective(value: f64) -> ModelResult<f64> {
    if !value.is_finite() {
        return Err(ModelError::NonFiniteObjective { value });
    }
    Ok(value)
}
