//! Problem serialization and deserialization.
//!
//! Uses bincode for compact binary serialization.
//! Format: magic bytes (SFMP) + version (u32) + bincode payload.
//! Optional JSON sidecar for human inspection; infinite bounds are written
//! as null there, so it is not read back.

use anyhow::{bail, Result};
use std::path::Path;

use super::problem::OptimizationProblem;

/// Save a problem to a binary file (.sfma.problem).
pub fn save_problem(problem: &OptimizationProblem, path: &Path) -> Result<()> {
    let encoded = bincode::serialize(problem)?;
    std::fs::write(path, &encoded)?;
    Ok(())
}

/// Load a problem from a binary file (.sfma.problem).
pub fn load_problem(path: &Path) -> Result<OptimizationProblem> {
    let data = std::fs::read(path)?;
    let problem: OptimizationProblem = bincode::deserialize(&data)?;

    if problem.magic != OptimizationProblem::MAGIC {
        bail!(
            "Invalid problem file: expected magic bytes {:?}, got {:?}",
            OptimizationProblem::MAGIC,
            problem.magic
        );
    }
    if problem.version > OptimizationProblem::VERSION {
        bail!(
            "Problem file version {} is newer than supported version {}",
            problem.version,
            OptimizationProblem::VERSION
        );
    }

    Ok(problem)
}

/// Save a JSON sidecar for debugging (.sfma.problem.json).
pub fn save_problem_json(problem: &OptimizationProblem, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(problem)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Summary of a problem (for display).
pub fn problem_summary(problem: &OptimizationProblem) -> String {
    let bounded = problem
        .lb
        .iter()
        .zip(&problem.ub)
        .filter(|(l, u)| l.is_finite() || u.is_finite())
        .count();
    format!(
        "SFMA Optimization Problem v{}\n\
         Model: {}\n\
         Variables: {} ({})\n\
         Bounded variables: {}\n\
         Linear constraints: {}",
        problem.version,
        problem.model_kind,
        problem.x_dim,
        problem.variable_names.join(", "),
        bounded,
        problem.n_constraints,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearMaximal, ModelKind};
    use crate::prior::Prior;
    use sfma_linalg::DenseMatrix;

    fn problem() -> OptimizationProblem {
        let m = LinearMaximal::new(
            DenseMatrix::from_row_major(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            vec![Prior::uniform(0.0, 1.0), Prior::flat(1)],
        )
        .unwrap();
        OptimizationProblem::from_model(&m)
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sfma.problem");

        save_problem(&problem(), &path).unwrap();
        let loaded = load_problem(&path).unwrap();

        assert_eq!(loaded.model_kind, ModelKind::Maximal);
        assert_eq!(loaded.x_dim, 2);
        assert_eq!(loaded.variable_names, vec!["beta_0", "beta_1"]);
        assert_eq!(loaded.lb, vec![0.0, f64::NEG_INFINITY]);
        assert_eq!(loaded.ub, vec![1.0, f64::INFINITY]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.sfma.problem");
        let mut p = problem();
        p.magic = *b"XXXX";
        save_problem(&p, &path).unwrap();
        assert!(load_problem(&path).is_err());
    }

    #[test]
    fn test_summary() {
        let s = problem_summary(&problem());
        assert!(s.contains("Model: maximal"));
        assert!(s.contains("Variables: 2 (beta_0, beta_1)"));
        assert!(s.contains("Bounded variables: 1"));
        assert!(s.contains("Linear constraints: 0"));
    }

    #[test]
    fn test_json_sidecar_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sfma.problem.json");
        save_problem_json(&problem(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"x_dim\": 2"));
    }
}
