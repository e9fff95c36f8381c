//! FILENAME: core/crosstab-engine/src/definition.rs
//! Pivot Configuration - The serializable description of a crosstab.
//!
//! This module contains all the types needed to DESCRIBE a pivot table.
//! These structures are designed to be:
//! - Serializable (camelCase JSON, as exchanged with the UI and query service)
//! - Immutable snapshots of user intent
//! - Free of any data: rows arrive separately from the query service

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PivotError;
use crate::normalize::parse_calendar_date;

/// Only this many column fields take part in the header hierarchy.
pub const MAX_COLUMN_LEVELS: usize = 2;

/// Filter values longer than this are cut short in the display echo.
const FILTER_ECHO_MAX_CHARS: usize = 20;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregation applied upstream by the query service for a value field.
///
/// The engine never re-applies it: rows that collapse onto the same cell are
/// always summed. The kind only names the metric column (`<field>_<kind>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    CountDistinct,
    Avg,
    Max,
    Min,
}

impl AggregationType {
    /// Wire name, also used as the metric key suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::CountDistinct => "count_distinct",
            AggregationType::Avg => "avg",
            AggregationType::Max => "max",
            AggregationType::Min => "min",
        }
    }

    /// Human-readable label for field chips and captions.
    pub fn label(&self) -> &'static str {
        match self {
            AggregationType::Sum => "Sum",
            AggregationType::Count => "Count",
            AggregationType::CountDistinct => "Distinct Count",
            AggregationType::Avg => "Average",
            AggregationType::Max => "Max",
            AggregationType::Min => "Min",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// A value field with the aggregation the query service should apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueField {
    /// Source field name (e.g. `id`, `deal_amount`).
    pub field: String,

    /// The aggregation function applied upstream.
    #[serde(default)]
    pub aggregation: AggregationType,

    /// Display hint (e.g. "#,##0.00"); echoed, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ValueField {
    pub fn new(field: impl Into<String>, aggregation: AggregationType) -> Self {
        ValueField {
            field: field.into(),
            aggregation,
            format: None,
        }
    }

    /// Key of the pre-aggregated metric in a flat input row: `<field>_<aggregation>`.
    pub fn metric_key(&self) -> String {
        format!("{}_{}", self.field, self.aggregation.as_str())
    }

    /// Caption such as "Count of id".
    pub fn display_name(&self) -> String {
        format!("{} of {}", self.aggregation.label(), self.field)
    }
}

/// How multiple value fields share the data columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueLayout {
    /// Every value field folds into the same bucket cell.
    #[default]
    Merged,
    /// Each bucket gets one sub-column per value field.
    Separate,
}

/// What to do with column fields beyond `MAX_COLUMN_LEVELS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDepthPolicy {
    /// Silently use the first two.
    #[default]
    Truncate,
    /// Refuse the configuration in `validate`.
    Reject,
}

// ============================================================================
// FILTER DEFINITIONS
// ============================================================================

/// Filter operators understood by the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    Between,
    DateBetween,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not equals",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "does not contain",
            FilterOperator::GreaterThan => "greater than",
            FilterOperator::LessThan => "less than",
            FilterOperator::Between => "between",
            FilterOperator::DateBetween => "date range",
            FilterOperator::IsNull => "is empty",
            FilterOperator::IsNotNull => "is not empty",
        }
    }

    /// Whether the operator carries no operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

/// A filter forwarded to the query service.
/// The engine does not apply filters; it only echoes them for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,

    pub operator: FilterOperator,

    #[serde(default)]
    pub value: Value,

    /// Upper bound for `between` / `date_between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        FilterCondition {
            field: field.into(),
            operator,
            value,
            value2: None,
        }
    }

    pub fn between(field: impl Into<String>, operator: FilterOperator, low: Value, high: Value) -> Self {
        FilterCondition {
            field: field.into(),
            operator,
            value: low,
            value2: Some(high),
        }
    }

    /// Display echo for the configuration panel, e.g. `stage (equals: Won)`.
    pub fn describe(&self) -> String {
        let label = self.operator.label();
        match self.operand_text() {
            Some(operand) => format!("{} ({}: {})", self.field, label, operand),
            None => format!("{} ({})", self.field, label),
        }
    }

    fn operand_text(&self) -> Option<String> {
        if self.operator.is_unary() {
            return None;
        }

        let low = value_text(&self.value);
        let high = self.value2.as_ref().map(value_text).unwrap_or_default();

        let text = match self.operator {
            FilterOperator::DateBetween => format_date_range(&low, &high),
            FilterOperator::Between => format!("{} ~ {}", low, high),
            FilterOperator::Contains | FilterOperator::NotContains => {
                if low.chars().count() > FILTER_ECHO_MAX_CHARS {
                    let head: String = low.chars().take(FILTER_ECHO_MAX_CHARS).collect();
                    format!("{}...", head)
                } else {
                    low
                }
            }
            _ => low,
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// "MM-DD ~ MM-DD", falling back to the raw bounds when either side is not a date.
fn format_date_range(start: &str, end: &str) -> String {
    match (parse_calendar_date(start), parse_calendar_date(end)) {
        (Some(s), Some(e)) => format!("{} ~ {}", s.format("%m-%d"), e.format("%m-%d")),
        _ => format!("{} ~ {}", start, end),
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort request forwarded to the query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete description of a crosstab, created fresh for every execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfiguration {
    /// User-facing name.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Dimensions grouped into rows, outermost first.
    #[serde(default)]
    pub row_fields: Vec<String>,

    /// Dimensions spread across columns (only the first two build headers).
    #[serde(default)]
    pub column_fields: Vec<String>,

    #[serde(default)]
    pub value_fields: Vec<ValueField>,

    #[serde(default)]
    pub filters: Vec<FilterCondition>,

    #[serde(default)]
    pub sort_by: Vec<SortConfig>,

    #[serde(default)]
    pub value_layout: ValueLayout,

    #[serde(default)]
    pub column_depth: ColumnDepthPolicy,
}

impl PivotConfiguration {
    /// Creates an empty configuration with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        PivotConfiguration {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_row_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_column_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value_field(mut self, field: impl Into<String>, aggregation: AggregationType) -> Self {
        self.value_fields.push(ValueField::new(field, aggregation));
        self
    }

    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_value_layout(mut self, layout: ValueLayout) -> Self {
        self.value_layout = layout;
        self
    }

    /// The column fields that take part in the header hierarchy.
    pub fn effective_column_fields(&self) -> &[String] {
        let depth = self.column_fields.len().min(MAX_COLUMN_LEVELS);
        &self.column_fields[..depth]
    }

    /// Whether a column dimension is configured at all.
    pub fn is_crosstab(&self) -> bool {
        !self.column_fields.is_empty()
    }

    /// Metric keys (`<field>_<aggregation>`) in value-field order.
    pub fn metric_keys(&self) -> Vec<String> {
        self.value_fields.iter().map(ValueField::metric_key).collect()
    }

    /// Display echo of every configured filter.
    pub fn filter_summary(&self) -> Vec<String> {
        self.filters.iter().map(FilterCondition::describe).collect()
    }

    /// Strict checks run before a query is issued.
    ///
    /// The assembler accepts anything; this is for callers that want to fail
    /// fast instead of rendering a degenerate table.
    pub fn validate(&self) -> Result<(), PivotError> {
        if self.is_crosstab() {
            if self.row_fields.is_empty() {
                return Err(PivotError::InvalidConfiguration(
                    "a crosstab needs at least one row field".to_string(),
                ));
            }
            if self.value_fields.is_empty() {
                return Err(PivotError::InvalidConfiguration(
                    "a crosstab needs at least one value field".to_string(),
                ));
            }
        }

        if let Some(shared) = self
            .row_fields
            .iter()
            .find(|f| self.column_fields.contains(f))
        {
            return Err(PivotError::InvalidConfiguration(format!(
                "field '{}' is used as both a row and a column dimension",
                shared
            )));
        }

        if self.column_depth == ColumnDepthPolicy::Reject
            && self.column_fields.len() > MAX_COLUMN_LEVELS
        {
            return Err(PivotError::InvalidConfiguration(format!(
                "{} column fields configured, at most {} are supported",
                self.column_fields.len(),
                MAX_COLUMN_LEVELS
            )));
        }

        Ok(())
    }
}
