//! FILENAME: core/crosstab-engine/src/aggregate.rs
//! Row Aggregator - folds flat input rows into one accumulator per row key.
//!
//! The upstream query has already applied the declared aggregation
//! (sum/avg/...). This stage only combines input rows that land on the same
//! (row key, bucket) pair, so the fold is always a plain numeric sum.

use rustc_hash::FxHashMap;

use crate::columns::ColumnPlan;
use crate::definition::ValueField;
use crate::key::{join_key, key_parts, value_column_key};
use crate::log_debug;
use crate::normalize::Normalizer;
use crate::value::FlatInputRow;

// ============================================================================
// GROUPED ROW
// ============================================================================

/// Accumulator for one distinct row key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    /// Composite row key (display values joined with `|`).
    pub key: String,

    /// Row-field display values captured on first sight, in row-field order.
    pub labels: Vec<(String, String)>,

    /// Folded metric per data column key.
    pub cells: FxHashMap<String, f64>,

    /// Number of input rows folded into this accumulator.
    pub source_rows: usize,
}

impl GroupedRow {
    fn new(key: String, labels: Vec<(String, String)>) -> Self {
        GroupedRow {
            key,
            labels,
            cells: FxHashMap::default(),
            source_rows: 0,
        }
    }

    /// Folded value of a column; buckets the row never touched read as 0.
    pub fn value(&self, column_key: &str) -> f64 {
        self.cells.get(column_key).copied().unwrap_or(0.0)
    }

    pub fn label(&self, field: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, label)| label.as_str())
    }

    fn add(&mut self, column_key: &str, amount: f64) {
        match self.cells.get_mut(column_key) {
            Some(cell) => *cell += amount,
            None => {
                self.cells.insert(column_key.to_string(), amount);
            }
        }
    }
}

/// Accumulators in first-seen order of their row keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedRows {
    rows: Vec<GroupedRow>,
    index: FxHashMap<String, usize>,
}

impl GroupedRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupedRow> {
        self.rows.iter()
    }

    pub fn get(&self, key: &str) -> Option<&GroupedRow> {
        self.index.get(key).map(|&idx| &self.rows[idx])
    }

    fn entry(&mut self, key: String, labels: impl FnOnce() -> Vec<(String, String)>) -> &mut GroupedRow {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.rows.len();
                self.index.insert(key.clone(), idx);
                self.rows.push(GroupedRow::new(key, labels()));
                idx
            }
        };
        &mut self.rows[idx]
    }
}

impl<'a> IntoIterator for &'a GroupedRows {
    type Item = &'a GroupedRow;
    type IntoIter = std::slice::Iter<'a, GroupedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ============================================================================
// FOLD
// ============================================================================

/// Groups `rows` by `row_fields` and folds the value-field metrics into the
/// bucket each row belongs to.
///
/// In the merged layout every value field adds into the same bucket cell, so
/// two configured metrics yield their sum. When the plan separates values,
/// each value field has its own sub-column instead.
///
/// With no column buckets the metrics are folded under the metric key itself.
pub fn aggregate(
    row_fields: &[String],
    plan: &ColumnPlan,
    value_fields: &[ValueField],
    rows: &[FlatInputRow],
    normalizer: &Normalizer,
) -> GroupedRows {
    let metric_keys: Vec<String> = value_fields.iter().map(ValueField::metric_key).collect();
    let mut grouped = GroupedRows::default();

    for row in rows {
        let parts = key_parts(row_fields, row, normalizer);
        let key = join_key(&parts);
        let bucket = plan.bucket_of(row, normalizer);

        let acc = grouped.entry(key, || {
            row_fields.iter().cloned().zip(parts.iter().cloned()).collect()
        });
        acc.source_rows += 1;

        for (vf, metric_key) in value_fields.iter().zip(&metric_keys) {
            let amount = row.get(metric_key).metric();
            match bucket.as_deref() {
                Some(bucket) if plan.separates_values() => {
                    acc.add(&value_column_key(bucket, vf), amount);
                }
                Some(bucket) => acc.add(bucket, amount),
                None => acc.add(metric_key, amount),
            }
        }
    }

    log_debug!(
        "AGG",
        "folded {} input rows into {} groups",
        rows.len(),
        grouped.len()
    );

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::build_columns;
    use crate::definition::AggregationType;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn create_stage_rows() -> Vec<FlatInputRow> {
        vec![
            FlatInputRow::new().with("stage", "A").with("source", "web").with("id_count", 3),
            FlatInputRow::new().with("stage", "A").with("source", "app").with("id_count", 2),
            FlatInputRow::new().with("stage", "B").with("source", "web").with("id_count", 1),
            FlatInputRow::new().with("stage", "A").with("source", "web").with("id_count", 4),
        ]
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let normalizer = Normalizer::default();
        let rows = create_stage_rows();
        let plan = build_columns(&fields(&["source"]), &rows, &normalizer);
        let value_fields = vec![ValueField::new("id", AggregationType::Count)];

        let grouped = aggregate(&fields(&["stage"]), &plan, &value_fields, &rows, &normalizer);

        let keys: Vec<&str> = grouped.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);

        let a = grouped.get("A").unwrap();
        assert_eq!(a.value("web"), 7.0);
        assert_eq!(a.value("app"), 2.0);
        assert_eq!(a.source_rows, 3);
        assert_eq!(a.label("stage"), Some("A"));

        let b = grouped.get("B").unwrap();
        assert_eq!(b.value("app"), 0.0);
    }

    #[test]
    fn test_missing_and_non_numeric_metrics_count_as_zero() {
        let normalizer = Normalizer::default();
        let rows = vec![
            FlatInputRow::new().with("stage", "A").with("source", "web").with("id_count", "n/a"),
            FlatInputRow::new().with("stage", "A").with("source", "web"),
            FlatInputRow::new().with("stage", "A").with("source", "web").with("id_count", "5"),
        ];
        let plan = build_columns(&fields(&["source"]), &rows, &normalizer);
        let value_fields = vec![ValueField::new("id", AggregationType::Count)];

        let grouped = aggregate(&fields(&["stage"]), &plan, &value_fields, &rows, &normalizer);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get("A").unwrap().value("web"), 5.0);
    }

    #[test]
    fn test_multiple_value_fields_share_bucket_cell() {
        let normalizer = Normalizer::default();
        let rows = vec![FlatInputRow::new()
            .with("stage", "A")
            .with("source", "web")
            .with("id_count", 3)
            .with("amount_sum", 100)];
        let plan = build_columns(&fields(&["source"]), &rows, &normalizer);
        let value_fields = vec![
            ValueField::new("id", AggregationType::Count),
            ValueField::new("amount", AggregationType::Sum),
        ];

        let grouped = aggregate(&fields(&["stage"]), &plan, &value_fields, &rows, &normalizer);
        assert_eq!(grouped.get("A").unwrap().value("web"), 103.0);
    }

    #[test]
    fn test_separate_layout_keeps_value_fields_apart() {
        let normalizer = Normalizer::default();
        let rows = vec![FlatInputRow::new()
            .with("stage", "A")
            .with("source", "web")
            .with("id_count", 3)
            .with("amount_sum", 100)];
        let value_fields = vec![
            ValueField::new("id", AggregationType::Count),
            ValueField::new("amount", AggregationType::Sum),
        ];
        let plan = build_columns(&fields(&["source"]), &rows, &normalizer)
            .with_value_columns(&value_fields);

        let grouped = aggregate(&fields(&["stage"]), &plan, &value_fields, &rows, &normalizer);
        let a = grouped.get("A").unwrap();
        assert_eq!(a.value("web_id_count"), 3.0);
        assert_eq!(a.value("web_amount_sum"), 100.0);
        assert_eq!(a.value("web"), 0.0);
    }

    #[test]
    fn test_two_level_bucket_keys() {
        let normalizer = Normalizer::default();
        let rows = vec![
            FlatInputRow::new().with("community", "East").with("year", "2024").with("quarter", "Q1").with("id_count", 2),
            FlatInputRow::new().with("community", "East").with("year", "2024").with("quarter", "Q1").with("id_count", 1),
            FlatInputRow::new().with("community", "West").with("year", "2023").with("quarter", "Q4").with("id_count", 6),
        ];
        let plan = build_columns(&fields(&["year", "quarter"]), &rows, &normalizer);
        let value_fields = vec![ValueField::new("id", AggregationType::Count)];

        let grouped = aggregate(&fields(&["community"]), &plan, &value_fields, &rows, &normalizer);
        assert_eq!(grouped.get("East").unwrap().value("2024_Q1"), 3.0);
        assert_eq!(grouped.get("West").unwrap().value("2023_Q4"), 6.0);
    }

    #[test]
    fn test_row_labels_are_masked_and_normalized() {
        let normalizer = Normalizer::default();
        let rows = vec![FlatInputRow::new()
            .with("phone", "13812345678")
            .with("created_at", "2024-03-01T18:30:00Z")
            .with("source", "web")
            .with("id_count", 1)];
        let plan = build_columns(&fields(&["source"]), &rows, &normalizer);
        let value_fields = vec![ValueField::new("id", AggregationType::Count)];

        let grouped = aggregate(&fields(&["phone", "created_at"]), &plan, &value_fields, &rows, &normalizer);
        let row = grouped.iter().next().unwrap();
        assert_eq!(row.key, "138****5678|2024-03-02");
        assert_eq!(row.label("created_at"), Some("2024-03-02"));
    }
}
