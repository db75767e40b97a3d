//! LinearMarginal: marginal likelihood with random effects integrated out.
//!
//! For x = [beta, gamma] the objective is
//!
//!   0.5 * r' V^{-1} r + 0.5 * log|V| + prior(x)
//!
//! with r = y - X beta and V = diag(obs_se^2) + Z diag(D gamma) Z'.
//! V^{-1} r and log|V| both come from one Cholesky factorization of V.

use sfma_linalg::{CholeskyDecomp, DenseMatrix};
use tracing::debug;

use super::linear::{check_data_rows, finite_objective, linear_forward, LinearModel, ModelKind};
use crate::constraint::{build_linear_constraint, LinearConstraint};
use crate::data::Data;
use crate::error::{ModelError, ModelResult};
use crate::param::ParameterSet;
use crate::prior::{collect_priors, PriorPenalty};

#[derive(Debug, Clone)]
pub struct LinearMarginal {
    param_set: Option<ParameterSet>,
    n_betas: usize,
    n_gammas: usize,
    x_dim: usize,
    /// Fixed-effect design matrix.
    x_mat: DenseMatrix,
    /// Random-effect design matrix.
    z_mat: DenseMatrix,
    /// Variance padding.
    d_mat: DenseMatrix,
    lb: Vec<f64>,
    ub: Vec<f64>,
    constraint: LinearConstraint,
    prior_fun: PriorPenalty,
    names: Vec<String>,
}

impl LinearMarginal {
    /// Build an initialized model.
    pub fn new(param_set: &ParameterSet) -> ModelResult<Self> {
        param_set.validate()?;

        let n_betas = param_set.num_fe();
        let n_gammas = param_set.num_re_var();
        let x_dim = n_betas + n_gammas;

        let lb: Vec<f64> = param_set
            .lb_fe
            .iter()
            .chain(&param_set.lb_re_var)
            .copied()
            .collect();
        let ub: Vec<f64> = param_set
            .ub_fe
            .iter()
            .chain(&param_set.ub_re_var)
            .copied()
            .collect();

        let constraint = build_linear_constraint(&[
            param_set.constr_fe.lift(0, x_dim)?,
            param_set.constr_re_var.lift(n_betas, x_dim)?,
        ])?;

        let priors = param_set
            .fe_priors
            .iter()
            .chain(&param_set.re_var_priors)
            .cloned()
            .collect();
        let prior_fun = collect_priors(priors)?;
        if prior_fun.dim() != x_dim {
            return Err(ModelError::DimensionMismatch {
                what: "prior dimension",
                expected: x_dim,
                got: prior_fun.dim(),
            });
        }

        debug!(
            "LinearMarginal: {} betas, {} gammas, {} constraint rows",
            n_betas,
            n_gammas,
            constraint.nrows()
        );

        Ok(Self {
            param_set: Some(param_set.clone()),
            n_betas,
            n_gammas,
            x_dim,
            x_mat: param_set.design_matrix_fe.clone(),
            z_mat: param_set.design_matrix_re.clone(),
            d_mat: param_set.re_var_padding.clone(),
            lb,
            ub,
            constraint,
            prior_fun,
            names: param_set.variable_names(),
        })
    }

    /// A model with no parameters, awaiting [`LinearModel::initialize`].
    pub fn empty() -> Self {
        Self {
            param_set: None,
            n_betas: 0,
            n_gammas: 0,
            x_dim: 0,
            x_mat: DenseMatrix::zeros(0, 0),
            z_mat: DenseMatrix::zeros(0, 0),
            d_mat: DenseMatrix::zeros(0, 0),
            lb: Vec::new(),
            ub: Vec::new(),
            constraint: LinearConstraint::empty(0),
            prior_fun: PriorPenalty::default(),
            names: Vec::new(),
        }
    }

    pub fn n_betas(&self) -> usize {
        self.n_betas
    }

    pub fn n_gammas(&self) -> usize {
        self.n_gammas
    }

    /// Random-effect design matrix.
    pub fn z(&self) -> &DenseMatrix {
        &self.z_mat
    }

    /// Variance padding matrix.
    pub fn d(&self) -> &DenseMatrix {
        &self.d_mat
    }

    /// Marginal covariance V for the variance parameters `gammas`.
    pub fn covariance(&self, gammas: &[f64], obs_se: &[f64]) -> DenseMatrix {
        let re_var = self.d_mat.mat_vec(gammas);
        let mut v = self.z_mat.zdzt(&re_var);
        for (i, se) in obs_se.iter().enumerate() {
            v.set(i, i, v.get(i, i) + se * se);
        }
        v
    }
}

impl Default for LinearMarginal {
    fn default() -> Self {
        Self::empty()
    }
}

impl LinearModel for LinearMarginal {
    fn initialize(&mut self, param_set: &ParameterSet) -> ModelResult<()> {
        *self = Self::new(param_set)?;
        Ok(())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Marginal
    }

    fn param_set(&self) -> Option<&ParameterSet> {
        self.param_set.as_ref()
    }

    fn x_dim(&self) -> usize {
        self.x_dim
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

        let (betas, gammas) = x.split_at(self.n_betas);

        let v = self.covariance(gammas, data.obs_se());
        let pred = self.x_mat.mat_vec(betas);
        let r: Vec<f64> = data.y().iter().zip(&pred).map(|(y, p)| y - p).collect();

        let chol = CholeskyDecomp::new(&v)?;
        let v_inv_r = chol.solve(&r)?;
        let quad = DenseMatrix::dot(&r, &v_inv_r);

        let value = 0.5 * quad + 0.5 * chol.log_det() + self.prior_fun.evaluate(x)?;
        finite_objective(value)
    }

    /// Fixed-effect prediction; the variance part of `x` is ignored.
    fn forward_with(&self, x: &[f64], mat: &DenseMatrix) -> ModelResult<Vec<f64>> {
        self.prerun_check(x)?;
        linear_forward(mat, &x[..self.n_betas])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::prior::Prior;

    /// Two groups of two observations, one random intercept.
    fn grouped() -> ParameterSet {
        let x = DenseMatrix::from_row_major(4, 1, &[1.0; 4]);
        let z = DenseMatrix::from_row_major(4, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
        let d = DenseMatrix::from_row_major(2, 1, &[1.0, 1.0]);
        ParameterSet::new(x, z, d)
    }

    #[test]
    fn test_initialize_dimensions() {
        let m = LinearMarginal::new(&grouped()).unwrap();
        assert_eq!(m.n_betas(), 1);
        assert_eq!(m.n_gammas(), 1);
        assert_eq!(m.x_dim(), 2);
        assert_eq!(m.variable_names(), &["beta_0".to_string(), "gamma_0".to_string()]);
        let (lb, ub) = m.bounds();
        assert_eq!(lb, &[f64::NEG_INFINITY, 0.0]);
        assert_eq!(ub, &[f64::INFINITY, f64::INFINITY]);
        assert_eq!(m.constraint().ncols(), 2);
        assert_eq!(m.constraint().nrows(), 0);
        assert!(m.param_set().is_some());
    }

    #[test]
    fn test_initialize_replaces_state() {
        let mut m = LinearMarginal::empty();
        assert_eq!(m.x_dim(), 0);
        m.initialize(&grouped()).unwrap();
        assert_eq!(m.x_dim(), 2);

        let fixed = ParameterSet::fixed_only(DenseMatrix::from_row_major(
            3,
            3,
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        ));
        m.initialize(&fixed).unwrap();
        assert_eq!(m.x_dim(), 3);
        assert_eq!(m.n_gammas(), 0);
        assert_eq!(m.z().ncols(), 0);
    }

    #[test]
    fn test_failed_initialize_keeps_state() {
        let mut m = LinearMarginal::new(&grouped()).unwrap();
        let mut bad = grouped();
        bad.fe_priors = vec![Prior::flat(2)];
        assert!(m.initialize(&bad).is_err());
        assert_eq!(m.x_dim(), 2);
    }

    #[test]
    fn test_constraints_lifted_and_stacked() {
        let mut ps = grouped();
        ps.constr_fe = LinearConstraint::new(
            DenseMatrix::from_row_major(1, 1, &[1.0]),
            vec![0.0],
            vec![1.0],
        )
        .unwrap();
        ps.constr_re_var = LinearConstraint::new(
            DenseMatrix::from_row_major(2, 1, &[1.0, 2.0]),
            vec![0.0, 0.0],
            vec![5.0, 6.0],
        )
        .unwrap();
        let m = LinearMarginal::new(&ps).unwrap();
        let c = m.constraint();
        assert_eq!(c.nrows(), 3);
        assert_eq!(c.ncols(), 2);
        assert_eq!(c.matrix.to_row_major(), vec![1.0, 0.0, 0.0, 1.0, 0.0, 2.0]);
        assert_eq!(c.lb, vec![0.0, 0.0, 0.0]);
        assert_eq!(c.ub, vec![1.0, 5.0, 6.0]);
    }

    #[test]
    fn test_objective_single_observation() {
        // V = se^2 + gamma = 1 + 3 = 4, r = 2 - 0 = 2
        let ps = ParameterSet::new(
            DenseMatrix::from_row_major(1, 1, &[1.0]),
            DenseMatrix::from_row_major(1, 1, &[1.0]),
            DenseMatrix::from_row_major(1, 1, &[1.0]),
        );
        let m = LinearMarginal::new(&ps).unwrap();
        let data = Data::new(vec![2.0], vec![1.0]).unwrap();
        let value = m.objective(&[0.0, 3.0], &data).unwrap();
        let expected = 0.5 * 4.0 / 4.0 + 0.5 * 4.0_f64.ln();
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_objective_block_covariance() {
        // Each group block is [[1 + g, g], [g, 1 + g]] with det 1 + 2g.
        let m = LinearMarginal::new(&grouped()).unwrap();
        let data = Data::new(vec![1.0, 1.0, -1.0, -1.0], vec![1.0; 4]).unwrap();
        let g = 0.5;
        let value = m.objective(&[0.0, g], &data).unwrap();
        // r = [1, 1] per block: r' V^{-1} r = 2 / (1 + 2g)
        let per_block = 0.5 * 2.0 / (1.0 + 2.0 * g) + 0.5 * (1.0 + 2.0 * g).ln();
        assert!((value - 2.0 * per_block).abs() < 1e-12);
    }

    #[test]
    fn test_objective_adds_prior() {
        let mut ps = grouped();
        ps.fe_priors = vec![Prior::gaussian(1.0, 0.5)];
        let with_prior = LinearMarginal::new(&ps).unwrap();
        let without = LinearMarginal::new(&grouped()).unwrap();
        let data = Data::new(vec![0.3, 0.1, -0.2, 0.4], vec![0.5; 4]).unwrap();
        let x = [2.0, 0.2];
        let diff = with_prior.objective(&x, &data).unwrap() - without.objective(&x, &data).unwrap();
        // 0.5 * ((2 - 1) / 0.5)^2 = 2
        assert!((diff - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_objective_length_mismatch() {
        let m = LinearMarginal::new(&grouped()).unwrap();
        let data = Data::new(vec![0.0; 4], vec![1.0; 4]).unwrap();
        for x in [vec![], vec![1.0], vec![1.0, 1.0, 1.0]] {
            let err = m.objective(&x, &data).unwrap_err();
            assert!(matches!(err, ModelError::LengthMismatch { expected: 2, .. }));
        }
    }

    #[test]
    fn test_objective_data_rows_mismatch() {
        let m = LinearMarginal::new(&grouped()).unwrap();
        let data = Data::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(m.objective(&[0.0, 0.0], &data).is_err());
    }

    #[test]
    fn test_singular_covariance_is_numerical() {
        // V = 1 + (-1) = 0
        let ps = ParameterSet::new(
            DenseMatrix::from_row_major(1, 1, &[1.0]),
            DenseMatrix::from_row_major(1, 1, &[1.0]),
            DenseMatrix::from_row_major(1, 1, &[1.0]),
        );
        let m = LinearMarginal::new(&ps).unwrap();
        let data = Data::new(vec![1.0], vec![1.0]).unwrap();
        let err = m.objective(&[0.0, -1.0], &data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Numerical);
    }

    #[test]
    fn test_forward_ignores_gammas() {
        let m = LinearMarginal::new(&grouped()).unwrap();
        let a = m.forward(&[2.0, 0.0]).unwrap();
        let b = m.forward(&[2.0, 100.0]).unwrap();
        assert_eq!(a, vec![2.0; 4]);
        assert_eq!(a, b);
        assert!(m.forward(&[2.0]).is_err());
    }
}
