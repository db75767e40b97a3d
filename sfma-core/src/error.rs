//! Error surface for model construction and objective evaluation.

use sfma_linalg::LinalgError;
use thiserror::Error;

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Broad classification of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Length or shape mismatch, or otherwise invalid input.
    Validation,
    /// An operation the model type does not provide.
    NotImplemented,
    /// Singular or indefinite covariance, or a non-finite result.
    Numerical,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("length of x = {actual} is not equal to the number of unknowns = {expected}")]
    LengthMismatch { actual: usize, expected: usize },

    #[error("{what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("constraint block {block} has {got} columns, expected {expected}")]
    ConstraintColumnMismatch {
        block: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("invalid bounds at index {index}: lower {lb} exceeds upper {ub}")]
    InvalidBounds { index: usize, lb: f64, ub: f64 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid prior: {0}")]
    InvalidPrior(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("{operation} is not implemented for this model")]
    NotImplemented { operation: &'static str },

    #[error("numerical failure: {0}")]
    Numerical(#[from] LinalgError),

    #[error("objective evaluated to a non-finite value: {value}")]
    NonFiniteObjective { value: f64 },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::NotImplemented { .. } => ErrorKind::NotImplemented,
            ModelError::Numerical(_) | ModelError::NonFiniteObjective { .. } => {
                ErrorKind::Numerical
            }
            _ => ErrorKind::Validation,
        }
    }
}
