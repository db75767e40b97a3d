//! Model description and parameter-set processing.

pub mod config;
pub mod parameter_set;
pub mod process;

pub use config::{ConstraintConfig, FixedEffectConfig, ModelConfig, PriorConfig, RandomEffectConfig};
pub use parameter_set::ParameterSet;
