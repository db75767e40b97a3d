//! JSON model description.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prior::Prior;

/// Model structure: effects, their priors and linear constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub fixed_effects: Vec<FixedEffectConfig>,
    #[serde(default)]
    pub random_effects: Vec<RandomEffectConfig>,
    #[serde(default)]
    pub fe_constraints: Vec<ConstraintConfig>,
    #[serde(default)]
    pub re_var_constraints: Vec<ConstraintConfig>,
}

/// A fixed effect. Without a covariate it is an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEffectConfig {
    pub name: String,
    #[serde(default)]
    pub covariate: Option<String>,
    #[serde(default)]
    pub prior: Option<PriorConfig>,
}

/// A random effect over the levels of `group`; the prior applies to its
/// variance parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEffectConfig {
    pub name: String,
    pub group: String,
    #[serde(default)]
    pub covariate: Option<String>,
    #[serde(default)]
    pub prior: Option<PriorConfig>,
}

/// One constraint row `lb <= sum(coef * variable) <= ub`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintConfig {
    pub terms: BTreeMap<String, f64>,
    #[serde(default)]
    pub lb: Option<f64>,
    #[serde(default)]
    pub ub: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriorConfig {
    Gaussian {
        mean: f64,
        sd: f64,
    },
    Uniform {
        #[serde(default)]
        lb: Option<f64>,
        #[serde(default)]
        ub: Option<f64>,
    },
}

impl PriorConfig {
    /// Scalar prior; a missing uniform lower bound falls back to `default_lb`.
    pub fn to_prior(&self, default_lb: f64) -> Prior {
        match *self {
            PriorConfig::Gaussian { mean, sd } => Prior::gaussian(mean, sd),
            PriorConfig::Uniform { lb, ub } => {
                Prior::uniform(lb.unwrap_or(default_lb), ub.unwrap_or(f64::INFINITY))
            }
        }
    }
}

impl ModelConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse model config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model config: {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("In {}", path.display()))
    }

    /// Numeric covariate columns referenced by any effect.
    pub fn covariate_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self
            .fixed_effects
            .iter()
            .filter_map(|fe| fe.covariate.as_deref())
            .chain(
                self.random_effects
                    .iter()
                    .filter_map(|re| re.covariate.as_deref()),
            )
            .collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    /// Grouping columns referenced by random effects.
    pub fn group_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.random_effects.iter().map(|re| re.group.as_str()).collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }
}
