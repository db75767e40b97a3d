//! OptimizationProblem: everything an external optimizer needs besides the
//! objective itself.

use serde::{Deserialize, Serialize};

use super::linear::{LinearModel, ModelKind};

/// Variables, bounds and linear constraints of an initialized model,
/// serialized to .sfma.problem files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProblem {
    /// Magic bytes for validation.
    pub magic: [u8; 4],
    /// Version number for forward compatibility.
    pub version: u32,
    pub model_kind: ModelKind,
    /// Names of the entries of x, in order.
    pub variable_names: Vec<String>,
    pub x_dim: usize,
    pub lb: Vec<f64>,
    pub ub: Vec<f64>,
    /// Constraint matrix C as flat row-major (n_constraints x x_dim).
    pub c_flat: Vec<f64>,
    pub n_constraints: usize,
    pub c_lb: Vec<f64>,
    pub c_ub: Vec<f64>,
}

impl OptimizationProblem {
    /// Magic bytes: "SFMP" (SFma Problem).
    pub const MAGIC: [u8; 4] = [b'S', b'F', b'M', b'P'];
    /// Current format version.
    pub const VERSION: u32 = 1;

    /// Snapshot the problem definition of a model.
    pub fn from_model<M: LinearModel + ?Sized>(model: &M) -> Self {
        let (lb, ub) = model.bounds();
        let constraint = model.constraint();
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            model_kind: model.kind(),
            variable_names: model.variable_names().to_vec(),
            x_dim: model.x_dim(),
            lb: lb.to_vec(),
            ub: ub.to_vec(),
            c_flat: constraint.matrix.to_row_major(),
            n_constraints: constraint.nrows(),
            c_lb: constraint.lb.clone(),
            c_ub: constraint.ub.clone(),
        }
    }

    /// Row `i` of the constraint matrix.
    pub fn constraint_row(&self, i: usize) -> &[f64] {
        &self.c_flat[i * self.x_dim..(i + 1) * self.x_dim]
    }
}
