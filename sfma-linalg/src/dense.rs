#![allow(clippy::needless_range_loop)]
//! Dense matrix operations backed by faer.
//!
//! Wraps faer's column-major Mat<f64> with the handful of operations the
//! objectives need: matrix-vector products, the structured covariance
//! product Z * diag(d) * Z', row gathering and vertical stacking.

use faer::Mat;

/// A dense matrix wrapper around faer's `Mat<f64>`.
///
/// Zero-row and zero-column matrices are valid values and are used to
/// represent empty effect groups and empty constraint blocks.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from a flat vec (column-major order).
    pub fn from_col_major(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i]);
        Self { inner }
    }

    /// Create a dense matrix from a flat slice in row-major order.
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Self { inner }
    }

    /// Create a diagonal matrix from a vector.
    pub fn from_diag(diag: &[f64]) -> Self {
        let n = diag.len();
        let inner = Mat::from_fn(n, n, |i, j| if i == j { diag[i] } else { 0.0 });
        Self { inner }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Matrix-vector product: self * v -> result vector.
    pub fn mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.ncols(), v.len());
        let n = self.nrows();
        let mut result = vec![0.0; n];
        for j in 0..self.ncols() {
            let vj = v[j];
            for i in 0..n {
                result[i] += self.inner.read(i, j) * vj;
            }
        }
        result
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.ncols(), other.nrows());
        let result = &self.inner * &other.inner;
        DenseMatrix { inner: result }
    }

    /// Transpose.
    pub fn transpose(&self) -> DenseMatrix {
        let inner = self.inner.transpose().to_owned();
        DenseMatrix { inner }
    }

    /// Extract column as a Vec<f64>.
    pub fn col(&self, j: usize) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.inner.read(i, j)).collect()
    }

    /// Extract row as a Vec<f64>.
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.ncols()).map(|j| self.inner.read(i, j)).collect()
    }

    /// Dot product of two vectors.
    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    /// Compute Z * diag(d) * Z' for this matrix Z (n x q) and weights d (length q).
    ///
    /// Returns a symmetric n x n matrix. With q = 0 the result is all zeros.
    pub fn zdzt(&self, d: &[f64]) -> DenseMatrix {
        let n = self.nrows();
        let q = self.ncols();
        assert_eq!(d.len(), q);
        let mut result = DenseMatrix::zeros(n, n);
        for i in 0..n {
            for k in i..n {
                let mut s = 0.0;
                for j in 0..q {
                    s += self.inner.read(i, j) * d[j] * self.inner.read(k, j);
                }
                result.set(i, k, s);
                if i != k {
                    result.set(k, i, s);
                }
            }
        }
        result
    }

    /// Stack matrices vertically.
    ///
    /// All blocks must share `ncols`; blocks with zero rows contribute nothing.
    pub fn vstack(blocks: &[&DenseMatrix], ncols: usize) -> DenseMatrix {
        let nrows: usize = blocks.iter().map(|b| b.nrows()).sum();
        let mut result = DenseMatrix::zeros(nrows, ncols);
        let mut offset = 0;
        for block in blocks {
            assert_eq!(block.ncols(), ncols);
            for i in 0..block.nrows() {
                for j in 0..ncols {
                    result.set(offset + i, j, block.get(i, j));
                }
            }
            offset += block.nrows();
        }
        result
    }

    /// Place this matrix at column `offset` inside a zero matrix of width `total_cols`.
    pub fn embed_columns(&self, offset: usize, total_cols: usize) -> DenseMatrix {
        assert!(offset + self.ncols() <= total_cols);
        let mut result = DenseMatrix::zeros(self.nrows(), total_cols);
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                result.set(i, offset + j, self.get(i, j));
            }
        }
        result
    }

    /// Gather rows in the given order (indices may repeat).
    pub fn select_rows(&self, indices: &[usize]) -> DenseMatrix {
        let inner = Mat::from_fn(indices.len(), self.ncols(), |i, j| {
            self.inner.read(indices[i], j)
        });
        DenseMatrix { inner }
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        (0..self.ncols()).all(|j| (0..self.nrows()).all(|i| self.inner.read(i, j).is_finite()))
    }

    /// Extract data as a flat Vec in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(self.nrows() * self.ncols());
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                data.push(self.inner.read(i, j));
            }
        }
        data
    }
}
