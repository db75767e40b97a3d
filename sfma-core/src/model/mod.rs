//! Linear models and their exported optimization problems.

pub mod linear;
pub mod marginal;
pub mod maximal;
pub mod problem;
pub mod serialization;

pub use linear::{linear_forward, LinearModel, ModelKind};
pub use marginal::LinearMarginal;
pub use maximal::LinearMaximal;
pub use problem::OptimizationProblem;
