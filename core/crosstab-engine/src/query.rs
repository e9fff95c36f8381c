//! FILENAME: core/crosstab-engine/src/query.rs
//! Aggregation query service boundary: request shape, payload classification
//! and the client trait the service layer is generic over.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{AggregationType, FilterCondition, PivotConfiguration, SortConfig};
use crate::error::PivotError;
use crate::value::FlatInputRow;
use crate::{log_debug, log_warn};

// ============================================================================
// REQUEST
// ============================================================================

/// A metric the query service must compute per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub field: String,
    pub aggregation: AggregationType,
}

/// Arguments of the grouped query (`execute_multi_level_pivot_analysis`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub data_source: String,
    pub row_fields: Vec<String>,
    pub column_fields: Vec<String>,
    pub value_fields: Vec<MetricRequest>,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<SortConfig>,
}

impl QueryRequest {
    pub fn from_configuration(data_source: impl Into<String>, config: &PivotConfiguration) -> Self {
        QueryRequest {
            data_source: data_source.into(),
            row_fields: config.row_fields.clone(),
            column_fields: config.column_fields.clone(),
            value_fields: config
                .value_fields
                .iter()
                .map(|vf| MetricRequest {
                    field: vf.field.clone(),
                    aggregation: vf.aggregation,
                })
                .collect(),
            filters: config.filters.clone(),
            sort_by: config.sort_by.clone(),
        }
    }
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// What came back from the query service.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPayload {
    /// `{ result: [...] }` with object elements.
    Rows(Vec<FlatInputRow>),
    /// `{ error: ... }` with a non-empty error.
    Error(String),
    /// Anything else; the assembler treats it as "no data".
    Malformed(String),
}

impl QueryPayload {
    /// Classifies a raw payload. A bare array of row objects is accepted as
    /// rows; a debug `sql` member is logged and otherwise ignored.
    pub fn from_json(payload: &Value) -> Self {
        match payload {
            Value::Object(object) => {
                if let Some(sql) = object.get("sql").and_then(Value::as_str) {
                    log_debug!("QUERY", "sql: {}", sql);
                }
                if let Some(message) = object.get("error").and_then(error_message) {
                    return QueryPayload::Error(message);
                }
                match object.get("result") {
                    Some(result) => rows_from_array(result),
                    None => QueryPayload::Malformed("payload has no result".to_string()),
                }
            }
            Value::Array(_) => rows_from_array(payload),
            other => QueryPayload::Malformed(format!("unexpected payload type: {}", type_name(other))),
        }
    }

    /// Rows, or nothing for error and malformed payloads.
    pub fn rows(self) -> Vec<FlatInputRow> {
        match self {
            QueryPayload::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryPayload::Error(_))
    }
}

/// Text of an error member, if it signals an error at all.
fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(object) => Some(
            object
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| error.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

fn rows_from_array(result: &Value) -> QueryPayload {
    let Some(items) = result.as_array() else {
        return QueryPayload::Malformed(format!("result is {}, not an array", type_name(result)));
    };

    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item.as_object() {
            Some(object) => rows.push(FlatInputRow::from_json_object(object)),
            None => {
                log_warn!("QUERY", "result[{}] is {}, not an object", idx, type_name(item));
                return QueryPayload::Malformed(format!("result[{}] is not an object", idx));
            }
        }
    }
    QueryPayload::Rows(rows)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// The remote grouped-query executor, injected into `PivotService`.
///
/// Implementations return the raw payload; transport problems are reported
/// as `PivotError::Transport`.
pub trait AggregationQueryService {
    fn execute(&self, request: &QueryRequest) -> Result<Value, PivotError>;
}

impl<F> AggregationQueryService for F
where
    F: Fn(&QueryRequest) -> Result<Value, PivotError>,
{
    fn execute(&self, request: &QueryRequest) -> Result<Value, PivotError> {
        self(request)
    }
}
