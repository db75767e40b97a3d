//! LinearMaximal: weighted least squares on the fixed effects.
//!
//! objective(x) = sum((y - X x)^2 / (2 obs_se^2)) + prior(x)

use sfma_linalg::DenseMatrix;
use tracing::{debug, warn};

use super::linear::{check_data_rows, finite_objective, LinearModel, ModelKind};
use crate::constraint::LinearConstraint;
use crate::data::Data;
use crate::error::{ModelError, ModelResult};
use crate::param::ParameterSet;
use crate::prior::{collect_priors, Prior, PriorPenalty};

#[derive(Debug, Clone)]
pub struct LinearMaximal {
    param_set: Option<ParameterSet>,
    x_mat: DenseMatrix,
    lb: Vec<f64>,
    ub: Vec<f64>,
    constraint: LinearConstraint,
    prior_fun: PriorPenalty,
    names: Vec<String>,
}

impl LinearMaximal {
    /// Wire a model directly from a design matrix and its priors.
    ///
    /// Bounds come from uniform priors; there are no linear constraints.
    pub fn new(design_matrix: DenseMatrix, priors: Vec<Prior>) -> ModelResult<Self> {
        let x_dim = design_matrix.ncols();
        if !design_matrix.is_finite() {
            return Err(ModelError::InvalidData(
                "design matrix must contain only finite values".to_string(),
            ));
        }
        let (lb, ub) = priors.iter().fold((Vec::new(), Vec::new()), |(mut lb, mut ub), p| {
            let (l, u) = p.bounds();
            lb.extend(l);
            ub.extend(u);
            (lb, ub)
        });
        let prior_fun = prior_penalty(priors, x_dim)?;

        Ok(Self {
            param_set: None,
            x_mat: design_matrix,
            lb,
            ub,
            constraint: LinearConstraint::empty(x_dim),
            prior_fun,
            names: (0..x_dim).map(|i| format!("beta_{i}")).collect(),
        })
    }

    /// Build from the fixed-effect part of a parameter set.
    pub fn from_param_set(param_set: &ParameterSet) -> ModelResult<Self> {
        param_set.validate()?;
        if param_set.num_re_var() > 0 {
            warn!(
                "LinearMaximal ignores {} variance parameter(s)",
                param_set.num_re_var()
            );
        }
        let x_dim = param_set.num_fe();
        let prior_fun = prior_penalty(param_set.fe_priors.clone(), x_dim)?;

        debug!(
            "LinearMaximal: {} betas, {} constraint rows",
            x_dim,
            param_set.constr_fe.nrows()
        );

        Ok(Self {
            param_set: Some(param_set.clone()),
            x_mat: param_set.design_matrix_fe.clone(),
            lb: param_set.lb_fe.clone(),
            ub: param_set.ub_fe.clone(),
            constraint: param_set.constr_fe.clone(),
            prior_fun,
            names: param_set.fe_names.clone(),
        })
    }
}

fn prior_penalty(priors: Vec<Prior>, x_dim: usize) -> ModelResult<PriorPenalty> {
    let prior_fun = collect_priors(priors)?;
    if prior_fun.dim() != x_dim {
        return Err(ModelError::DimensionMismatch {
            what: "prior dimension",
            expected: x_dim,
            got: prior_fun.dim(),
        });
    }
    Ok(prior_fun)
}

impl LinearModel for LinearMaximal {
    fn initialize(&mut self, param_set: &ParameterSet) -> ModelResult<()> {
        *self = Self::from_param_set(param_set)?;
        Ok(())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Maximal
    }

    fn param_set(&self) -> Option<&ParameterSet> {
        self.param_set.as_ref()
    }

    fn x_dim(&self) -> usize {
        self.x_mat.ncols()
    }

    fn design_matrix(&self) -> &DenseMatrix {
        &self.x_mat
    }

    fn variable_names(&self) -> &[String] {
        &self.names
    }

    fn bounds(&self) -> (&[f64], &[f64]) {
        (&self.lb, &self.ub)
    }

    fn constraint(&self) -> &LinearConstraint {
        &self.constraint
    }

    fn objective(&self, x: &[f64], data: &Data) -> ModelResult<f64> {
        self.prerun_check(x)?;
        check_data_rows(&self.x_mat, data)?;

        let pred = self.x_mat.mat_vec(x);
        let sse: f64 = data
            .y()
            .iter()
            .zip(&pred)
            .zip(data.obs_se())
            .map(|((y, p), se)| (y - p).powi(2) / (2.0 * se * se))
            .sum();

        finite_objective(sse + self.prior_fun.evaluate(x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn intercept_only() -> LinearMaximal {
        LinearMaximal::new(
            DenseMatrix::from_row_major(3, 1, &[1.0, 1.0, 1.0]),
            vec![Prior::flat(1)],
        )
        .unwrap()
    }

    #[test]
    fn test_concrete_objective() {
        let m = intercept_only();
        let data = Data::new(vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0]).unwrap();
        let value = m.objective(&[2.0], &data).unwrap();
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighting_by_se() {
        let m = intercept_only();
        let data = Data::new(vec![1.0, 2.0, 3.0], vec![0.5, 1.0, 2.0]).unwrap();
        // 1 / (2 * 0.25) + 0 + 1 / (2 * 4)
        let value = m.objective(&[2.0], &data).unwrap();
        assert!((value - 2.125).abs() < 1e-12);
    }

    #[test]
    fn test_prior_added() {
        let m = LinearMaximal::new(
            DenseMatrix::from_row_major(3, 1, &[1.0, 1.0, 1.0]),
            vec![Prior::gaussian(0.0, 1.0)],
        )
        .unwrap();
        let data = Data::new(vec![1.0, 2.0, 3.0], vec![1.0; 3]).unwrap();
        // 1.0 + 0.5 * 2^2
        assert!((m.objective(&[2.0], &data).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_from_priors() {
        let m = LinearMaximal::new(
            DenseMatrix::from_row_major(1, 2, &[1.0, 1.0]),
            vec![Prior::uniform(-1.0, 1.0), Prior::gaussian(0.0, 1.0)],
        )
        .unwrap();
        let (lb, ub) = m.bounds();
        assert_eq!(lb, &[-1.0, f64::NEG_INFINITY]);
        assert_eq!(ub, &[1.0, f64::INFINITY]);
        assert_eq!(m.constraint().ncols(), 2);
        assert!(m.param_set().is_none());
    }

    #[test]
    fn test_prior_dimension_checked() {
        let err = LinearMaximal::new(DenseMatrix::zeros(2, 2), vec![Prior::flat(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_length_mismatch() {
        let m = intercept_only();
        let data = Data::new(vec![1.0, 2.0, 3.0], vec![1.0; 3]).unwrap();
        assert!(m.objective(&[], &data).is_err());
        assert!(m.objective(&[1.0, 2.0], &data).is_err());
    }

    #[test]
    fn test_initialize_from_param_set() {
        let mut ps = ParameterSet::new(
            DenseMatrix::from_row_major(2, 2, &[1.0, 0.5, 1.0, 1.5]),
            DenseMatrix::from_row_major(2, 1, &[1.0, 1.0]),
            DenseMatrix::from_row_major(1, 1, &[1.0]),
        );
        ps.fe_names = vec!["intercept".into(), "slope".into()];
        let mut m = intercept_only();
        m.initialize(&ps).unwrap();
        assert_eq!(m.x_dim(), 2);
        assert_eq!(m.variable_names(), &["intercept".to_string(), "slope".to_string()]);
        assert_eq!(m.forward(&[1.0, 2.0]).unwrap(), vec![2.0, 4.0]);
        assert!(m.param_set().is_some());
    }
}
