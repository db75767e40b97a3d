#![allow(clippy::needless_range_loop)]
//! Matrix decompositions and solvers.
//!
//! Cholesky factorization of symmetric positive definite matrices, used to
//! solve V x = r and to compute log|V| for the marginal covariance without
//! forming V^{-1} or det(V) explicitly.

use crate::dense::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Matrix is not positive definite (pivot {pivot:.3e} at index {index})")]
    NotPositiveDefinite { index: usize, pivot: f64 },

    #[error("Matrix is not square: {nrows} x {ncols}")]
    NotSquare { nrows: usize, ncols: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result of a Cholesky decomposition.
pub struct CholeskyDecomp {
    /// Lower triangular factor L such that A = L * L'.
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    /// Compute the Cholesky decomposition of a symmetric positive definite matrix.
    ///
    /// Only the lower triangle of `a` is read. A pivot that is zero, negative
    /// or NaN fails the factorization.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LinalgError::NotSquare {
                nrows: n,
                ncols: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let pivot = a.get(j, j) - sum;
            if pivot.is_nan() || pivot <= 0.0 {
                return Err(LinalgError::NotPositiveDefinite { index: j, pivot });
            }
            let l_jj = pivot.sqrt();
            l.set(j, j, l_jj);

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l_jj);
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.l.nrows()
    }

    /// Solve L * L' * x = b.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
        let n = self.dim();
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: b.len(),
            });
        }

        // Forward substitution: L * y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l.get(i, j) * y[j];
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }

        // Backward substitution: L' * x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }

        Ok(x)
    }

    /// log|A| = 2 * sum(log L_ii).
    ///
    /// The determinant of an SPD matrix is positive, so no sign is carried.
    pub fn log_det(&self) -> f64 {
        2.0 * (0..self.dim()).map(|i| self.l.get(i, i).ln()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesky() {
        // A = [[4, 2], [2, 3]]
        let a = DenseMatrix::from_row_major(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let chol = CholeskyDecomp::new(&a).unwrap();
        // L should be [[2, 0], [1, sqrt(2)]]
        assert!((chol.l.get(0, 0) - 2.0).abs() < 1e-10);
        assert!((chol.l.get(1, 0) - 1.0).abs() < 1e-10);
        assert!((chol.l.get(1, 1) - 2.0f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_cholesky_solve() {
        let a = DenseMatrix::from_row_major(3, 3, &[4.0, 2.0, 1.0, 2.0, 5.0, 3.0, 1.0, 3.0, 6.0]);
        let b = vec![1.0, 2.0, 3.0];
        let x = CholeskyDecomp::new(&a).unwrap().solve(&b).unwrap();
        let ax = a.mat_vec(&x);
        for i in 0..3 {
            assert!(
                (ax[i] - b[i]).abs() < 1e-10,
                "ax[{}]={} != b[{}]={}",
                i,
                ax[i],
                i,
                b[i]
            );
        }
    }

    #[test]
    fn test_solve_wrong_length() {
        let chol = CholeskyDecomp::new(&DenseMatrix::from_diag(&[1.0, 1.0])).unwrap();
        let err = chol.solve(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, LinalgError::DimensionMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_log_det() {
        // det([[4, 2], [2, 3]]) = 8
        let a = DenseMatrix::from_row_major(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let ld = CholeskyDecomp::new(&a).unwrap().log_det();
        assert!((ld - 8.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_det_large_diagonal_does_not_overflow() {
        // det = 1e300^4 overflows f64, its log does not.
        let a = DenseMatrix::from_diag(&[1e300; 4]);
        let ld = CholeskyDecomp::new(&a).unwrap().log_det();
        assert!(ld.is_finite());
        assert!((ld - 4.0 * 1e300f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_matrix() {
        let chol = CholeskyDecomp::new(&DenseMatrix::zeros(0, 0)).unwrap();
        assert_eq!(chol.log_det(), 0.0);
        assert!(chol.solve(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_cholesky_not_pd() {
        let a = DenseMatrix::from_row_major(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        assert!(matches!(
            CholeskyDecomp::new(&a),
            Err(LinalgError::NotPositiveDefinite { index: 1, .. })
        ));
    }

    #[test]
    fn test_cholesky_singular() {
        let a = DenseMatrix::from_row_major(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(CholeskyDecomp::new(&a).is_err());
        assert!(CholeskyDecomp::new(&DenseMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn test_cholesky_nan_pivot() {
        let a = DenseMatrix::from_diag(&[1.0, f64::NAN]);
        assert!(matches!(
            CholeskyDecomp::new(&a),
            Err(LinalgError::NotPositiveDefinite { index: 1, .. })
        ));
    }

    #[test]
    fn test_not_square() {
        let a = DenseMatrix::zeros(2, 3);
        assert_eq!(
            CholeskyDecomp::new(&a).err(),
            Some(LinalgError::NotSquare { nrows: 2, ncols: 3 })
        );
    }
}
