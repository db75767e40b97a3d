//! Grouping-column encoding.
//!
//! Random effects are indexed by the distinct values of a grouping column
//! (a study ID, a location). Levels are numbered in order of first
//! appearance so that the encoding is stable for a given file.

use std::collections::HashMap;

/// Distinct levels of a grouping column and the level of each row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLevels {
    /// Distinct labels in first-appearance order.
    pub levels: Vec<String>,
    /// Level index for each row.
    pub codes: Vec<usize>,
}

impl GroupLevels {
    /// Encode a column of labels.
    pub fn from_labels(labels: &[String]) -> Self {
        let mut lookup: HashMap<&str, usize> = HashMap::new();
        let mut levels = Vec::new();
        let mut codes = Vec::with_capacity(labels.len());

        for label in labels {
            let code = *lookup.entry(label.as_str()).or_insert_with(|| {
                levels.push(label.clone());
                levels.len() - 1
            });
            codes.push(code);
        }

        Self { levels, codes }
    }

    /// Number of distinct levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of rows in each level.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_levels()];
        for &c in &self.codes {
            counts[c] += 1;
        }
        counts
    }
}

/// Gather `data[indices[k]]` for each k; indices may repeat.
pub fn reorder_vec<T: Clone>(data: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| data[i].clone()).collect()
}

/// [`reorder_vec`] for plain floats.
pub fn reorder_f64(data: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| data[i]).collect()
}
