//! Time-indexed numeric tables.
//!
//! A `ChannelTable` is the normalized in-memory form shared by every stage:
//! a time-indexed row axis with named f64 columns. The schema (label plus
//! column names) comes from the producing side: instrument channel kinds
//! for ingested data, a fixed three-column schema for trajectory series.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from table construction and merging.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Row {row} has {got} values, expected {expected}")]
    RowWidth {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("Cannot merge an empty set of tables")]
    EmptyMerge,

    #[error("Tables have different schemas: {0} and {1}")]
    SchemaMismatch(String, String),
}

/// A time-indexed table of named numeric columns.
///
/// Values are stored column-major; every column has exactly one value per
/// timestamp. After [`ChannelTable::merge`], timestamps are strictly
/// increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTable {
    label: String,
    times: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl ChannelTable {
    /// Create an empty table with the given schema.
    pub fn new(label: impl Into<String>, columns: Vec<String>) -> Self {
        let values = vec![Vec::new(); columns.len()];
        Self {
            label: label.into(),
            times: Vec::new(),
            columns,
            values,
        }
    }

    /// Build a table from `(timestamp, row)` pairs in schema column order.
    /// Rows are taken as-is; use [`ChannelTable::merge`] to sort and
    /// deduplicate.
    pub fn from_rows(
        label: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<(DateTime<Utc>, Vec<f64>)>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(label, columns);
        for (time, row) in rows {
            table.push_row(time, row)?;
        }
        Ok(table)
    }

    /// Append one row. The row must match the schema width.
    pub fn push_row(&mut self, time: DateTime<Utc>, row: Vec<f64>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.times.len(),
                got: row.len(),
                expected: self.columns.len(),
            });
        }
        self.times.push(time);
        for (col, value) in self.values.iter_mut().zip(row) {
            col.push(value);
        }
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn n_rows(&self) -> usize {
        self.times.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Column values by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[idx])
    }

    /// Column values by index.
    pub fn column_at(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    /// One row in column order.
    pub fn row(&self, idx: usize) -> Vec<f64> {
        self.values.iter().map(|col| col[idx]).collect()
    }

    /// Merge several tables with identical schemas into one normalized
    /// table: rows concatenated in input order, sorted ascending by
    /// timestamp, duplicate timestamps resolved last-write-wins (the row
    /// from the latest input position survives).
    pub fn merge(tables: Vec<ChannelTable>) -> Result<ChannelTable, TableError> {
        let first = tables.first().ok_or(TableError::EmptyMerge)?;
        let label = first.label.clone();
        let columns = first.columns.clone();
        if let Some(other) = tables
            .iter()
            .find(|t| t.label != label || t.columns != columns)
        {
            return Err(TableError::SchemaMismatch(
                label,
                other.label.clone(),
            ));
        }

        let mut rows: Vec<(DateTime<Utc>, Vec<f64>)> = Vec::new();
        for table in &tables {
            for i in 0..table.n_rows() {
                rows.push((table.times[i], table.row(i)));
            }
        }

        // Stable sort keeps input order within equal timestamps, so taking
        // the last row of each equal run is last-write-wins.
        rows.sort_by_key(|(time, _)| *time);

        let mut merged = ChannelTable::new(label, columns);
        let mut iter = rows.into_iter().peekable();
        while let Some((time, row)) = iter.next() {
            if iter.peek().map(|(next, _)| *next == time).unwrap_or(false) {
                continue;
            }
            merged.push_row(time, row)?;
        }
        Ok(merged)
    }

    /// Structural equality within a floating-point tolerance, for comparing
    /// a table against its text-serialized round trip. Label, timestamps
    /// and column names must match exactly; values match when within `tol`
    /// relative to the larger magnitude, or when both are NaN.
    pub fn approx_eq(&self, other: &ChannelTable, tol: f64) -> bool {
        if self.label != other.label
            || self.times != other.times
            || self.columns != other.columns
        {
            return false;
        }
        self.values
            .iter()
            .zip(&other.values)
            .all(|(a, b)| a.iter().zip(b).all(|(x, y)| approx(*x, *y, tol)))
    }
}

fn approx(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tol * scale
}
