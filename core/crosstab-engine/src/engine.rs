//! FILENAME: core/crosstab-engine/src/engine.rs
//! Pivot Assembler - turns a configuration and flat query rows into a PivotResult.
//!
//! Algorithm:
//! 1. Pick the shape once: simple list (no column fields), single-level or
//!    two-level crosstab (column fields past the second are ignored).
//! 2. Crosstab: build the column plan, fold rows per row key, compute totals.
//! 3. Materialize headers, header rows, output rows, the totals record and the
//!    summary.
//!
//! The assembler never fails: empty input yields `PivotResult::empty()`.

use serde_json::Value;

use crate::aggregate::{aggregate, GroupedRows};
use crate::columns::{build_columns, ColumnPlan};
use crate::definition::{PivotConfiguration, ValueLayout};
use crate::normalize::Normalizer;
use crate::query::QueryPayload;
use crate::totals::{compute_totals, Totals};
use crate::value::{FieldValue, FlatInputRow};
use crate::view::{PivotCell, PivotResult, PivotRow, PivotSummary, TOTAL_LABEL};
use crate::{log_debug, log_info, log_warn};

// ============================================================================
// SHAPE
// ============================================================================

/// Output shape, chosen once per assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotShape {
    SimpleList,
    SingleLevel,
    TwoLevel,
}

impl PivotShape {
    pub fn for_configuration(config: &PivotConfiguration) -> Self {
        match config.column_fields.len() {
            0 => PivotShape::SimpleList,
            1 => PivotShape::SingleLevel,
            _ => PivotShape::TwoLevel,
        }
    }
}

// ============================================================================
// ASSEMBLER
// ============================================================================

pub struct PivotAssembler<'a> {
    config: &'a PivotConfiguration,
    normalizer: &'a Normalizer,
}

impl<'a> PivotAssembler<'a> {
    pub fn new(config: &'a PivotConfiguration, normalizer: &'a Normalizer) -> Self {
        PivotAssembler { config, normalizer }
    }

    pub fn shape(&self) -> PivotShape {
        PivotShape::for_configuration(self.config)
    }

    pub fn assemble(&self, rows: &[FlatInputRow]) -> PivotResult {
        if rows.is_empty() {
            log_debug!("PIVOT", "no input rows, returning empty result");
            return PivotResult::empty();
        }

        let shape = self.shape();
        log_info!("PIVOT", "assembling {:?} from {} rows", shape, rows.len());

        match shape {
            PivotShape::SimpleList => self.assemble_simple_list(rows),
            PivotShape::SingleLevel | PivotShape::TwoLevel => self.assemble_crosstab(rows),
        }
    }

    /// Every input row verbatim, plus a per-row "Total" of the value metrics.
    pub fn assemble_simple_list(&self, rows: &[FlatInputRow]) -> PivotResult {
        let headers: Vec<String> = match rows.first() {
            Some(first) => first.field_names().map(String::from).collect(),
            None => return PivotResult::empty(),
        };
        let metric_keys = self.config.metric_keys();

        let out_rows: Vec<PivotRow> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut out = PivotRow::with_capacity(Some(idx.to_string()), headers.len() + 1);
                for header in &headers {
                    out.set(header.as_str(), self.list_cell(header, row.get(header)));
                }
                let row_total: f64 = metric_keys
                    .iter()
                    .filter_map(|key| row.get(key).as_number())
                    .sum();
                out.set(TOTAL_LABEL, row_total);
                out
            })
            .collect();

        let mut totals = PivotRow::with_capacity(None, headers.len() + 1);
        let mut grand_total = 0.0;
        for header in &headers {
            let is_metric = metric_keys.iter().any(|key| key == header);
            let total = list_column_total(header, is_metric, rows);
            if is_metric {
                grand_total += total;
            }
            totals.set(header.as_str(), total);
        }
        totals.set(TOTAL_LABEL, grand_total);

        let summary = PivotSummary {
            total_rows: out_rows.len(),
            total_columns: headers.len(),
            total_value: grand_total,
        };

        PivotResult {
            headers,
            header_rows: None,
            rows: out_rows,
            totals,
            summary,
        }
    }

    /// Single- or two-level crosstab.
    pub fn assemble_crosstab(&self, rows: &[FlatInputRow]) -> PivotResult {
        let config = self.config;
        let column_fields = config.effective_column_fields();
        if column_fields.len() < config.column_fields.len() {
            log_warn!(
                "PIVOT",
                "{} column fields configured, using only {:?}",
                config.column_fields.len(),
                column_fields
            );
        }

        let mut plan = build_columns(column_fields, rows, self.normalizer);
        if config.value_layout == ValueLayout::Separate {
            plan = plan.with_value_columns(&config.value_fields);
        }

        let grouped = aggregate(
            &config.row_fields,
            &plan,
            &config.value_fields,
            rows,
            self.normalizer,
        );
        let totals = compute_totals(&grouped, &plan.column_keys());

        let headers = plan.headers(&config.row_fields);
        let header_rows = plan.header_rows(&config.row_fields);
        let out_rows = self.crosstab_rows(&grouped, &plan, &totals);
        let totals_row = self.totals_row(&totals);

        log_debug!(
            "PIVOT",
            "rows={} columns={} grand_total={}",
            out_rows.len(),
            plan.columns().len(),
            totals.grand_total
        );

        let summary = PivotSummary {
            total_rows: out_rows.len(),
            total_columns: headers.len(),
            total_value: totals.grand_total,
        };

        PivotResult {
            headers,
            header_rows,
            rows: out_rows,
            totals: totals_row,
            summary,
        }
    }

    fn crosstab_rows(&self, grouped: &GroupedRows, plan: &ColumnPlan, totals: &Totals) -> Vec<PivotRow> {
        grouped
            .iter()
            .zip(&totals.row_totals)
            .enumerate()
            .map(|(idx, (group, row_total))| {
                let width = group.labels.len() + plan.columns().len() + 1;
                let mut out = PivotRow::with_capacity(Some(format!("row-{}", idx)), width);
                for (field, label) in &group.labels {
                    out.set(field.as_str(), label.as_str());
                }
                for column in plan.columns() {
                    out.set(column.key.as_str(), group.value(&column.key));
                }
                out.set(TOTAL_LABEL, *row_total);
                out
            })
            .collect()
    }

    fn totals_row(&self, totals: &Totals) -> PivotRow {
        let width = self.config.row_fields.len() + totals.column_totals.len() + 1;
        let mut out = PivotRow::with_capacity(None, width);
        for field in &self.config.row_fields {
            out.set(field.as_str(), TOTAL_LABEL);
        }
        for (key, total) in &totals.column_totals {
            out.set(key.as_str(), *total);
        }
        out.set(TOTAL_LABEL, totals.grand_total);
        out
    }

    fn list_cell(&self, field: &str, value: &FieldValue) -> PivotCell {
        match value {
            FieldValue::Null => PivotCell::Empty,
            FieldValue::Number(n) => PivotCell::Number(*n),
            FieldValue::Boolean(b) => PivotCell::Text(b.to_string()),
            FieldValue::Text(s) => PivotCell::Text(self.normalizer.mask(field, s)),
        }
    }
}

/// Column total of a simple list.
///
/// Metric columns sum every value with a numeric reading, so they agree with
/// the per-row totals. Other columns sum when every non-empty value is a
/// number and otherwise count the non-empty values; numeric-looking text
/// (phone numbers, ids) counts rather than sums.
fn list_column_total(field: &str, is_metric: bool, rows: &[FlatInputRow]) -> f64 {
    if is_metric {
        return rows.iter().filter_map(|row| row.get(field).as_number()).sum();
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    let mut all_numeric = true;

    for row in rows {
        let value = row.get(field);
        if value.is_blank() {
            continue;
        }
        count += 1;
        match value {
            FieldValue::Number(n) => sum += n,
            _ => all_numeric = false,
        }
    }

    if all_numeric {
        sum
    } else {
        count as f64
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Assembles with the default normalizer settings.
pub fn assemble_pivot(config: &PivotConfiguration, rows: &[FlatInputRow]) -> PivotResult {
    let normalizer = Normalizer::default();
    PivotAssembler::new(config, &normalizer).assemble(rows)
}

/// Assembles straight from a raw query-service payload.
///
/// Error and malformed payloads yield the empty result; callers that need to
/// report upstream errors check the payload first (see `PivotService`).
pub fn assemble_json(config: &PivotConfiguration, payload: &Value) -> PivotResult {
    match QueryPayload::from_json(payload) {
        QueryPayload::Rows(rows) => assemble_pivot(config, &rows),
        QueryPayload::Error(message) => {
            log_warn!("PIVOT", "error payload passed to assembler: {}", message);
            PivotResult::empty()
        }
        QueryPayload::Malformed(reason) => {
            log_warn!("PIVOT", "malformed payload: {}", reason);
            PivotResult::empty()
        }
    }
}
