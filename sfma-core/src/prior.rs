//! Priors on model parameters and their combined penalty.
//!
//! A prior covers a contiguous block of the parameter vector. Gaussian
//! priors add `0.5 * sum(((x - mean) / sd)^2)` to the objective; uniform
//! priors add nothing and only carry bounds.

use crate::error::{ModelError, ModelResult};

/// Prior over a block of `dim()` consecutive parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Prior {
    Gaussian { mean: Vec<f64>, sd: Vec<f64> },
    Uniform { lb: Vec<f64>, ub: Vec<f64> },
}

impl Prior {
    /// Scalar Gaussian prior.
    pub fn gaussian(mean: f64, sd: f64) -> Self {
        Prior::Gaussian {
            mean: vec![mean],
            sd: vec![sd],
        }
    }

    /// Scalar uniform prior.
    pub fn uniform(lb: f64, ub: f64) -> Self {
        Prior::Uniform {
            lb: vec![lb],
            ub: vec![ub],
        }
    }

    /// Unbounded uniform prior over `dim` parameters.
    pub fn flat(dim: usize) -> Self {
        Prior::Uniform {
            lb: vec![f64::NEG_INFINITY; dim],
            ub: vec![f64::INFINITY; dim],
        }
    }

    /// Number of parameters covered.
    pub fn dim(&self) -> usize {
        match self {
            Prior::Gaussian { mean, .. } => mean.len(),
            Prior::Uniform { lb, .. } => lb.len(),
        }
    }

    /// Box bounds implied by the prior; Gaussian priors are unbounded.
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        match self {
            Prior::Gaussian { mean, .. } => (
                vec![f64::NEG_INFINITY; mean.len()],
                vec![f64::INFINITY; mean.len()],
            ),
            Prior::Uniform { lb, ub } => (lb.clone(), ub.clone()),
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> ModelResult<()> {
        match self {
            Prior::Gaussian { mean, sd } => {
                if mean.len() != sd.len() {
                    return Err(ModelError::InvalidPrior(format!(
                        "gaussian mean has {} entries but sd has {}",
                        mean.len(),
                        sd.len()
                    )));
                }
                if let Some(m) = mean.iter().find(|m| !m.is_finite()) {
                    return Err(ModelError::InvalidPrior(format!(
                        "gaussian mean must be finite, got {m}"
                    )));
                }
                if let Some(s) = sd.iter().find(|&&s| !(s.is_finite() && s > 0.0)) {
                    return Err(ModelError::InvalidPrior(format!(
                        "gaussian sd must be finite and > 0, got {s}"
                    )));
                }
            }
            Prior::Uniform { lb, ub } => {
                if lb.len() != ub.len() {
                    return Err(ModelError::InvalidPrior(format!(
                        "uniform lb has {} entries but ub has {}",
                        lb.len(),
                        ub.len()
                    )));
                }
                if let Some(i) = lb
                    .iter()
                    .zip(ub)
                    .position(|(l, u)| l.is_nan() || u.is_nan() || l > u)
                {
                    return Err(ModelError::InvalidBounds {
                        index: i,
                        lb: lb[i],
                        ub: ub[i],
                    });
                }
            }
        }
        Ok(())
    }

    /// Penalty contribution for the block `x` (of length `dim()`).
    pub fn error_value(&self, x: &[f64]) -> f64 {
        match self {
            Prior::Gaussian { mean, sd } => {
                0.5 * x
                    .iter()
                    .zip(mean.iter().zip(sd))
                    .map(|(xi, (m, s))| ((xi - m) / s).powi(2))
                    .sum::<f64>()
            }
            Prior::Uniform { .. } => 0.0,
        }
    }
}

/// Ordered priors compiled into a single scalar penalty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriorPenalty {
    priors: Vec<Prior>,
}

impl PriorPenalty {
    /// Total number of parameters covered by all priors.
    pub fn dim(&self) -> usize {
        self.priors.iter().map(Prior::dim).sum()
    }

    pub fn priors(&self) -> &[Prior] {
        &self.priors
    }

    /// Sum of the priors' penalties over consecutive segments of `x`.
    ///
    /// Trailing entries beyond `dim()` are ignored; a shorter `x` is a
    /// length mismatch.
    pub fn evaluate(&self, x: &[f64]) -> ModelResult<f64> {
        if x.len() < self.dim() {
            return Err(ModelError::LengthMismatch {
                actual: x.len(),
                expected: self.dim(),
            });
        }
        let mut start = 0;
        let mut total = 0.0;
        for prior in &self.priors {
            let end = start + prior.dim();
            total += prior.error_value(&x[start..end]);
            start = end;
        }
        Ok(total)
    }
}

/// Validate and compile an ordered list of priors.
pub fn collect_priors(priors: Vec<Prior>) -> ModelResult<PriorPenalty> {
    for prior in &priors {
        prior.validate()?;
    }
    Ok(PriorPenalty { priors })
}
