//! Linear constraint systems `c_lb <= C x <= c_ub`.
//!
//! Each effect group declares its own block; blocks are stacked row-wise
//! into a single system handed to the optimizer.

use sfma_linalg::DenseMatrix;

use crate::error::{ModelError, ModelResult};

/// One block of linear constraints.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub matrix: DenseMatrix,
    pub lb: Vec<f64>,
    pub ub: Vec<f64>,
}

impl LinearConstraint {
    /// Build a block, checking that bounds match the matrix rows and `lb <= ub`.
    pub fn new(matrix: DenseMatrix, lb: Vec<f64>, ub: Vec<f64>) -> ModelResult<Self> {
        if lb.len() != matrix.nrows() {
            return Err(ModelError::DimensionMismatch {
                what: "constraint lower bound length",
                expected: matrix.nrows(),
                got: lb.len(),
            });
        }
        if ub.len() != matrix.nrows() {
            return Err(ModelError::DimensionMismatch {
                what: "constraint upper bound length",
                expected: matrix.nrows(),
                got: ub.len(),
            });
        }
        if let Some(i) = lb
            .iter()
            .zip(&ub)
            .position(|(l, u)| l.is_nan() || u.is_nan() || l > u)
        {
            return Err(ModelError::InvalidBounds {
                index: i,
                lb: lb[i],
                ub: ub[i],
            });
        }
        if !matrix.is_finite() {
            return Err(ModelError::InvalidConstraint(
                "constraint matrix must contain only finite values".to_string(),
            ));
        }
        Ok(Self { matrix, lb, ub })
    }

    /// A block with no rows over `ncols` parameters.
    pub fn empty(ncols: usize) -> Self {
        Self {
            matrix: DenseMatrix::zeros(0, ncols),
            lb: Vec::new(),
            ub: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    /// Re-express the block over a wider parameter vector, its columns
    /// starting at `offset`.
    pub fn lift(&self, offset: usize, total_cols: usize) -> ModelResult<Self> {
        if offset + self.ncols() > total_cols {
            return Err(ModelError::DimensionMismatch {
                what: "lifted constraint width",
                expected: total_cols,
                got: offset + self.ncols(),
            });
        }
        Ok(Self {
            matrix: self.matrix.embed_columns(offset, total_cols),
            lb: self.lb.clone(),
            ub: self.ub.clone(),
        })
    }

    /// Whether `C x` lies within the bounds, up to `tol`.
    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        if x.len() != self.ncols() {
            return false;
        }
        self.matrix
            .mat_vec(x)
            .iter()
            .zip(self.lb.iter().zip(&self.ub))
            .all(|(v, (l, u))| *v >= l - tol && *v <= u + tol)
    }
}

/// Stack constraint blocks vertically into one system.
///
/// Blocks with zero rows are skipped. Non-empty blocks must share a column
/// count. With no rows overall the result is a zero-row system as wide as
/// the first block.
pub fn build_linear_constraint(blocks: &[LinearConstraint]) -> ModelResult<LinearConstraint> {
    let non_empty: Vec<(usize, &LinearConstraint)> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_empty())
        .collect();

    let ncols = match (non_empty.first(), blocks.first()) {
        (Some((_, b)), _) => b.ncols(),
        (None, Some(b)) => return Ok(LinearConstraint::empty(b.ncols())),
        (None, None) => return Ok(LinearConstraint::empty(0)),
    };
    for &(block, b) in &non_empty {
        if b.ncols() != ncols {
            return Err(ModelError::ConstraintColumnMismatch {
                block,
                expected: ncols,
                got: b.ncols(),
            });
        }
    }

    let matrices: Vec<&DenseMatrix> = non_empty.iter().map(|(_, b)| &b.matrix).collect();
    let matrix = DenseMatrix::vstack(&matrices, ncols);
    let lb = non_empty.iter().flat_map(|(_, b)| b.lb.iter().copied()).collect();
    let ub = non_empty.iter().flat_map(|(_, b)| b.ub.iter().copied()).collect();

    Ok(LinearConstraint { matrix, lb, ub })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn block(nrows: usize, ncols: usize, fill: f64) -> LinearConstraint {
        LinearConstraint::new(
            DenseMatrix::from_row_major(nrows, ncols, &vec![fill; nrows * ncols]),
            vec![-1.0; nrows],
            vec![1.0; nrows],
        )
        .unwrap()
    }

    #[test]
    fn test_stack_two_blocks() {
        let c = build_linear_constraint(&[block(2, 3, 1.0), block(3, 3, 2.0)]).unwrap();
        assert_eq!(c.nrows(), 5);
        assert_eq!(c.ncols(), 3);
        assert_eq!(c.lb.len(), 5);
        assert_eq!(c.ub.len(), 5);
        assert_eq!(c.matrix.get(1, 0), 1.0);
        assert_eq!(c.matrix.get(2, 0), 2.0);
    }

    #[test]
    fn test_stack_with_empty_block() {
        let full = block(3, 3, 4.0);
        let c = build_linear_constraint(&[LinearConstraint::empty(3), full.clone()]).unwrap();
        assert_eq!(c.nrows(), 3);
        assert_eq!(c.matrix.to_row_major(), full.matrix.to_row_major());
        assert_eq!(c.lb, full.lb);
        assert_eq!(c.ub, full.ub);
    }

    #[test]
    fn test_stack_all_empty() {
        let c =
            build_linear_constraint(&[LinearConstraint::empty(4), LinearConstraint::empty(4)])
                .unwrap();
        assert_eq!(c.nrows(), 0);
        assert_eq!(c.ncols(), 4);
        assert!(c.lb.is_empty());
    }

    #[test]
    fn test_stack_no_blocks() {
        let c = build_linear_constraint(&[]).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn test_column_mismatch() {
        let err = build_linear_constraint(&[block(1, 2, 1.0), block(1, 3, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConstraintColumnMismatch {
                block: 1,
                expected: 2,
                got: 3
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_empty_block_width_is_not_checked() {
        let full = block(3, 3, 5.0);
        let c = build_linear_constraint(&[LinearConstraint::empty(2), full.clone()]).unwrap();
        assert_eq!(c.nrows(), 3);
        assert_eq!(c.ncols(), 3);
        assert_eq!(c.matrix.to_row_major(), full.matrix.to_row_major());
        assert_eq!(c.lb, full.lb);
        assert_eq!(c.ub, full.ub);
    }

    #[test]
    fn test_mismatch_after_empty_block_reports_block_index() {
        let err = build_linear_constraint(&[
            LinearConstraint::empty(7),
            block(1, 2, 1.0),
            block(2, 3, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::ConstraintColumnMismatch {
                block: 2,
                expected: 2,
                got: 3
            }
        ));
    }

    #[test]
    fn test_new_rejects_bad_bounds() {
        let m = DenseMatrix::from_row_major(1, 2, &[1.0, 1.0]);
        assert!(LinearConstraint::new(m.clone(), vec![0.0, 0.0], vec![1.0]).is_err());
        assert!(LinearConstraint::new(m, vec![2.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_lift_and_satisfied() {
        // beta_0 - beta_1 >= 0 over a 3-parameter vector.
        let c = LinearConstraint::new(
            DenseMatrix::from_row_major(1, 2, &[1.0, -1.0]),
            vec![0.0],
            vec![f64::INFINITY],
        )
        .unwrap();
        let lifted = c.lift(0, 3).unwrap();
        assert_eq!(lifted.ncols(), 3);
        assert!(lifted.is_satisfied(&[2.0, 1.0, 99.0], 0.0));
        assert!(!lifted.is_satisfied(&[1.0, 2.0, 0.0], 0.0));
        assert!(c.lift(2, 3).is_err());
    }
}
