//! FILENAME: core/crosstab-engine/src/view.rs
//! Pivot View - the result object handed to the rendering layer.
//!
//! Everything here is owned data; nothing borrows from the input rows.

use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Label of the row-total column and of the totals record's row-field cells.
pub const TOTAL_LABEL: &str = "Total";

// ============================================================================
// CELLS AND ROWS
// ============================================================================

/// One cell of an output record.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum PivotCell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl PivotCell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PivotCell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PivotCell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PivotCell {
    fn from(value: f64) -> Self {
        PivotCell::Number(value)
    }
}

impl From<String> for PivotCell {
    fn from(value: String) -> Self {
        PivotCell::Text(value)
    }
}

impl From<&str> for PivotCell {
    fn from(value: &str) -> Self {
        PivotCell::Text(value.to_string())
    }
}

/// An output record: an optional rendering key plus header-keyed cells.
/// Serializes as a flat JSON object with `key` first.
///
/// Cells are keyed by header text, so a bucket label equal to a row-field
/// name or to "Total" shares that cell: the later `set` wins. A cell named
/// `key` takes the place of the rendering key in the serialized object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotRow {
    pub key: Option<String>,
    cells: Vec<(String, PivotCell)>,
    index: FxHashMap<String, usize>,
}

impl PivotRow {
    pub fn new() -> Self {
        PivotRow::default()
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        PivotRow {
            key: Some(key.into()),
            ..PivotRow::default()
        }
    }

    /// Empty row with room for `columns` cells.
    pub fn with_capacity(key: Option<String>, columns: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(columns);
        PivotRow {
            key,
            cells: Vec::with_capacity(columns),
            index,
        }
    }

    pub fn get(&self, column: &str) -> Option<&PivotCell> {
        self.index.get(column).map(|&idx| &self.cells[idx].1)
    }

    /// Sets a cell, replacing an existing one in place.
    pub fn set(&mut self, column: impl Into<String>, cell: impl Into<PivotCell>) {
        let column = column.into();
        let cell = cell.into();
        match self.index.get(&column) {
            Some(&idx) => self.cells[idx].1 = cell,
            None => {
                self.index.insert(column.clone(), self.cells.len());
                self.cells.push((column, cell));
            }
        }
    }

    /// Cells in insertion order.
    pub fn cells(&self) -> &[(String, PivotCell)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(PivotCell::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(PivotCell::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.cells.is_empty()
    }
}

impl Serialize for PivotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row_key = self.key.as_ref().filter(|_| !self.index.contains_key("key"));
        let len = self.cells.len() + usize::from(row_key.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(key) = row_key {
            map.serialize_entry("key", key)?;
        }
        for (column, cell) in &self.cells {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub total_value: f64,
}

/// The complete reshaped table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotResult {
    /// Row fields, data column keys, then "Total" (list shape: first row's fields).
    pub headers: Vec<String>,

    /// Physical header rows when columns carry more than one header level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_rows: Option<Vec<Vec<String>>>,

    pub rows: Vec<PivotRow>,

    /// Column sums and the grand total.
    pub totals: PivotRow,

    pub summary: PivotSummary,
}

impl PivotResult {
    /// The "no data" result: no headers, no rows, `{}` totals, zero summary.
    pub fn empty() -> Self {
        PivotResult::default()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Row totals in output order.
    pub fn row_totals(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.number(TOTAL_LABEL).unwrap_or(0.0))
            .collect()
    }

    pub fn grand_total(&self) -> f64 {
        self.totals.number(TOTAL_LABEL).unwrap_or(0.0)
    }
}
