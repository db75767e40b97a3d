//! sfma-linalg: Linear algebra wrappers for SFMA-RS
//!
//! Provides the dense matrix type and the Cholesky-based solve and
//! log-determinant used by the marginal likelihood.

pub mod dense;
pub mod decomposition;

pub use decomposition::{CholeskyDecomp, LinalgError};
pub use dense::DenseMatrix;
