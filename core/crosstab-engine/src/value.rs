//! FILENAME: core/crosstab-engine/src/value.rs
//! Scalar values and flat input rows as delivered by the query service.
//!
//! Rows are dynamically shaped: which columns exist depends on the
//! configuration that produced them, so a row is an ordered list of
//! `(field name, scalar)` pairs rather than a fixed record.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returned by lookups for fields a row does not carry.
static NULL_VALUE: FieldValue = FieldValue::Null;

/// A raw scalar from the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value, if it has one.
    ///
    /// Text is parsed after trimming; booleans read as 1/0. Empty text,
    /// non-finite results and null have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Null => None,
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) => n.is_finite().then_some(*n),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }

    /// Metric reading used when folding: anything non-numeric counts as 0.
    pub fn metric(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
            Value::String(s) => FieldValue::Text(s.clone()),
            // Nested structures are not dimensions; keep their JSON text.
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

// ============================================================================
// FLAT INPUT ROW
// ============================================================================

/// One row of the query result: dimension values plus `<field>_<aggregation>` metrics.
/// Field order is preserved (simple-list headers follow the first row).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatInputRow {
    entries: Vec<(String, FieldValue)>,
    index: FxHashMap<String, usize>,
}

impl FlatInputRow {
    pub fn new() -> Self {
        FlatInputRow::default()
    }

    pub fn with_capacity(fields: usize) -> Self {
        let mut index = FxHashMap::default();
        index.reserve(fields);
        FlatInputRow {
            entries: Vec::with_capacity(fields),
            index,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field, replacing an earlier value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        match self.index.get(&field) {
            Some(&idx) => self.entries[idx].1 = value,
            None => {
                self.index.insert(field.clone(), self.entries.len());
                self.entries.push((field, value));
            }
        }
    }

    /// Value of a field; missing fields read as null.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.index
            .get(field)
            .map(|&idx| &self.entries[idx].1)
            .unwrap_or(&NULL_VALUE)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut row = FlatInputRow::with_capacity(object.len());
        for (name, value) in object {
            row.insert(name.as_str(), FieldValue::from(value));
        }
        row
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FlatInputRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = FlatInputRow::new();
        for (field, value) in iter {
            row.insert(field, value);
        }
        row
    }
}
