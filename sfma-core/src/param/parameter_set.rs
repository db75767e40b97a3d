//! ParameterSet: the processed description of a linear mixed-effects model.
//!
//! Holds the fixed- and random-effect design matrices, the padding matrix
//! that maps variance parameters onto random-effect columns, and the bounds,
//! constraints and priors of each parameter group. Models read it once at
//! initialization and never mutate it.

use sfma_linalg::DenseMatrix;

use crate::constraint::LinearConstraint;
use crate::error::{ModelError, ModelResult};
use crate::prior::Prior;

#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Names of the fixed effects, one per column of `design_matrix_fe`.
    pub fe_names: Vec<String>,
    /// Names of the random-effect variance parameters.
    pub re_var_names: Vec<String>,
    /// Fixed-effect design matrix (n_obs x num_fe).
    pub design_matrix_fe: DenseMatrix,
    /// Random-effect design matrix (n_obs x n_random_effects).
    pub design_matrix_re: DenseMatrix,
    /// Maps variance parameters to per-column variances (n_random_effects x num_re_var).
    pub re_var_padding: DenseMatrix,
    pub lb_fe: Vec<f64>,
    pub ub_fe: Vec<f64>,
    pub lb_re_var: Vec<f64>,
    pub ub_re_var: Vec<f64>,
    /// Constraints over the fixed effects (num_fe columns).
    pub constr_fe: LinearConstraint,
    /// Constraints over the variance parameters (num_re_var columns).
    pub constr_re_var: LinearConstraint,
    pub fe_priors: Vec<Prior>,
    pub re_var_priors: Vec<Prior>,
}

impl ParameterSet {
    /// Build a parameter set with generated names, unbounded fixed effects,
    /// non-negative variances, no constraints and flat priors.
    pub fn new(
        design_matrix_fe: DenseMatrix,
        design_matrix_re: DenseMatrix,
        re_var_padding: DenseMatrix,
    ) -> Self {
        let num_fe = design_matrix_fe.ncols();
        let num_re_var = re_var_padding.ncols();
        Self {
            fe_names: (0..num_fe).map(|i| format!("beta_{i}")).collect(),
            re_var_names: (0..num_re_var).map(|i| format!("gamma_{i}")).collect(),
            design_matrix_fe,
            design_matrix_re,
            re_var_padding,
            lb_fe: vec![f64::NEG_INFINITY; num_fe],
            ub_fe: vec![f64::INFINITY; num_fe],
            lb_re_var: vec![0.0; num_re_var],
            ub_re_var: vec![f64::INFINITY; num_re_var],
            constr_fe: LinearConstraint::empty(num_fe),
            constr_re_var: LinearConstraint::empty(num_re_var),
            fe_priors: vec![Prior::flat(num_fe)],
            re_var_priors: vec![Prior::Uniform {
                lb: vec![0.0; num_re_var],
                ub: vec![f64::INFINITY; num_re_var],
            }],
        }
    }

    /// A parameter set without random effects.
    pub fn fixed_only(design_matrix_fe: DenseMatrix) -> Self {
        let n = design_matrix_fe.nrows();
        Self::new(design_matrix_fe, DenseMatrix::zeros(n, 0), DenseMatrix::zeros(0, 0))
    }

    /// Number of fixed effects.
    pub fn num_fe(&self) -> usize {
        self.design_matrix_fe.ncols()
    }

    /// Number of random-effect variance parameters.
    pub fn num_re_var(&self) -> usize {
        self.re_var_padding.ncols()
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.design_matrix_fe.nrows()
    }

    /// Parameter names in x order: fixed effects, then variances.
    pub fn variable_names(&self) -> Vec<String> {
        self.fe_names
            .iter()
            .chain(&self.re_var_names)
            .cloned()
            .collect()
    }

    /// Check every shape relationship between the fields.
    pub fn validate(&self) -> ModelResult<()> {
        let num_fe = self.num_fe();
        let num_re_var = self.num_re_var();

        check_len("design_matrix_re rows", self.n_obs(), self.design_matrix_re.nrows())?;
        check_len(
            "re_var_padding rows",
            self.design_matrix_re.ncols(),
            self.re_var_padding.nrows(),
        )?;
        check_len("fe_names length", num_fe, self.fe_names.len())?;
        check_len("re_var_names length", num_re_var, self.re_var_names.len())?;

        if !self.design_matrix_fe.is_finite() || !self.design_matrix_re.is_finite() {
            return Err(ModelError::InvalidData(
                "design matrices must contain only finite values".to_string(),
            ));
        }
        if !self.re_var_padding.is_finite() {
            return Err(ModelError::InvalidData(
                "re_var_padding must contain only finite values".to_string(),
            ));
        }

        check_bounds("lb_fe length", "ub_fe length", num_fe, &self.lb_fe, &self.ub_fe)?;
        check_bounds(
            "lb_re_var length",
            "ub_re_var length",
            num_re_var,
            &self.lb_re_var,
            &self.ub_re_var,
        )?;

        check_len("constr_fe columns", num_fe, self.constr_fe.ncols())?;
        check_len("constr_re_var columns", num_re_var, self.constr_re_var.ncols())?;

        let fe_prior_dim: usize = self.fe_priors.iter().map(Prior::dim).sum();
        check_len("fe_priors dimension", num_fe, fe_prior_dim)?;
        let re_prior_dim: usize = self.re_var_priors.iter().map(Prior::dim).sum();
        check_len("re_var_priors dimension", num_re_var, re_prior_dim)?;

        Ok(())
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> ModelResult<()> {
    if expected != got {
        return Err(ModelError::DimensionMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

fn check_bounds(
    lb_what: &'static str,
    ub_what: &'static str,
    dim: usize,
    lb: &[f64],
    ub: &[f64],
) -> ModelResult<()> {
    check_len(lb_what, dim, lb.len())?;
    check_len(ub_what, dim, ub.len())?;
    if let Some(i) = lb
        .iter()
        .zip(ub)
        .position(|(l, u)| l.is_nan() || u.is_nan() || l > u)
    {
        return Err(ModelError::InvalidBounds {
            index: i,
            lb: lb[i],
            ub: ub[i],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_group() -> ParameterSet {
        let x = DenseMatrix::from_row_major(3, 2, &[1.0, 0.1, 1.0, 0.2, 1.0, 0.3]);
        let z = DenseMatrix::from_row_major(3, 1, &[1.0, 1.0, 1.0]);
        let d = DenseMatrix::from_row_major(1, 1, &[1.0]);
        ParameterSet::new(x, z, d)
    }

    #[test]
    fn test_new_defaults() {
        let ps = one_group();
        assert_eq!(ps.num_fe(), 2);
        assert_eq!(ps.num_re_var(), 1);
        assert_eq!(ps.n_obs(), 3);
        assert_eq!(ps.variable_names(), vec!["beta_0", "beta_1", "gamma_0"]);
        assert_eq!(ps.lb_re_var, vec![0.0]);
        assert!(ps.validate().is_ok());
    }

    #[test]
    fn test_fixed_only() {
        let ps = ParameterSet::fixed_only(DenseMatrix::from_row_major(2, 1, &[1.0, 1.0]));
        assert_eq!(ps.num_re_var(), 0);
        assert_eq!(ps.design_matrix_re.nrows(), 2);
        assert!(ps.validate().is_ok());
    }

    #[test]
    fn test_validate_row_mismatch() {
        let mut ps = one_group();
        ps.design_matrix_re = DenseMatrix::zeros(4, 1);
        assert!(matches!(
            ps.validate(),
            Err(ModelError::DimensionMismatch {
                what: "design_matrix_re rows",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_padding_mismatch() {
        let mut ps = one_group();
        ps.re_var_padding = DenseMatrix::zeros(2, 1);
        assert!(ps.validate().is_err());
    }

    #[test]
    fn test_validate_bounds() {
        let mut ps = one_group();
        ps.lb_fe = vec![1.0, 0.0];
        ps.ub_fe = vec![0.0, 1.0];
        assert!(matches!(
            ps.validate(),
            Err(ModelError::InvalidBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_prior_dimension() {
        let mut ps = one_group();
        ps.fe_priors = vec![Prior::gaussian(0.0, 1.0)];
        assert!(ps.validate().is_err());
    }

    #[test]
    fn test_validate_constraint_width() {
        let mut ps = one_group();
        ps.constr_fe = LinearConstraint::empty(3);
        assert!(ps.validate().is_err());
    }
}
