//! Delimited text table reader.
//!
//! Reads a header line followed by data rows. Cells are kept as text so that
//! grouping columns (study IDs, locations) and numeric columns can live in
//! the same file; numeric views are parsed on demand.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::levels::reorder_vec;

/// A table of text cells with named columns.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Cell values: rows[i][j] = row i, column j.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Read a table from a tab-, comma- or whitespace-delimited file.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file: {}", path.display()))?;
        let table = Self::parse(&contents)
            .with_context(|| format!("Failed to parse data file: {}", path.display()))?;
        debug!(
            "Read {} rows x {} columns from {}",
            table.n_rows(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse a table from text.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines().filter(|l| !l.trim().is_empty());
        let header_line = lines
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty data file"))?;

        let delim = Delimiter::detect(header_line);
        let columns: Vec<String> = delim.split(header_line).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (line_num, line) in lines.enumerate() {
            let fields: Vec<String> = delim.split(line).map(str::to_string).collect();
            if fields.len() != columns.len() {
                bail!(
                    "Line {} has {} fields, expected {}",
                    line_num + 2,
                    fields.len(),
                    columns.len()
                );
            }
            rows.push(fields);
        }

        Ok(Self { columns, rows })
    }

    /// Number of data rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in header", name))
    }

    /// Raw text values of a column.
    pub fn text_column(&self, name: &str) -> Result<Vec<String>> {
        let j = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[j].clone()).collect())
    }

    /// Numeric values of a column, with missing or unparsable cells as NaN.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let j = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| parse_value(&row[j])).collect())
    }

    /// Indices of rows whose listed numeric columns are all finite.
    pub fn complete_rows(&self, columns: &[&str]) -> Result<Vec<usize>> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.n_rows())
            .filter(|&i| {
                indices
                    .iter()
                    .all(|&j| parse_value(&self.rows[i][j]).is_finite())
            })
            .collect())
    }

    /// Indices of rows whose listed label columns are all present.
    pub fn labelled_rows(&self, columns: &[&str]) -> Result<Vec<usize>> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.n_rows())
            .filter(|&i| indices.iter().all(|&j| !is_missing(&self.rows[i][j])))
            .collect())
    }

    /// A new table holding the given rows, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: reorder_vec(&self.rows, indices),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else if header.contains(',') {
            Delimiter::Comma
        } else {
            Delimiter::Whitespace
        }
    }

    fn split<'a>(self, line: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Delimiter::Tab => Box::new(line.split('\t').map(str::trim)),
            Delimiter::Comma => Box::new(line.split(',').map(str::trim)),
            Delimiter::Whitespace => Box::new(line.split_whitespace()),
        }
    }
}

/// Whether a raw cell is one of the missing-value markers.
pub fn is_missing(s: &str) -> bool {
    matches!(s, "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan")
}

/// Parse a string value to f64, treating NA/missing as NaN.
fn parse_value(s: &str) -> f64 {
    if is_missing(s) {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}
