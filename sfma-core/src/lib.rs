//! sfma-core: Objectives for linear mixed-effects stochastic frontier models
//!
//! Implements the marginal objective (random effects integrated out through
//! the covariance), the maximal weighted least-squares objective, priors,
//! linear constraint stacking, parameter-set processing and problem export.

pub mod constraint;
pub mod data;
pub mod error;
pub mod model;
pub mod param;
pub mod prior;

pub use constraint::{build_linear_constraint, LinearConstraint};
pub use data::Data;
pub use error::{ErrorKind, ModelError, ModelResult};
pub use model::{LinearMarginal, LinearMaximal, LinearModel, ModelKind, OptimizationProblem};
pub use param::{ModelConfig, ParameterSet};
pub use prior::{collect_priors, Prior, PriorPenalty};
