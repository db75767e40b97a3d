//! sfma-data: Tabular input for SFMA-RS
//!
//! Reads delimited observation tables and encodes grouping columns
//! used to build random-effect design matrices.

pub mod levels;
pub mod table;

pub use levels::GroupLevels;
pub use table::DataTable;
