//! FILENAME: core/crosstab-engine/src/totals.rs
//! Totals Calculator - row totals, column totals and the grand total.

use crate::aggregate::GroupedRows;

/// Absolute tolerance when comparing totals reached by different summation orders.
pub const RECONCILE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Totals {
    /// Per grouped row, in the grouped order.
    pub row_totals: Vec<f64>,

    /// Per data column, in column order.
    pub column_totals: Vec<(String, f64)>,

    /// Sum of the row totals.
    pub grand_total: f64,
}

impl Totals {
    pub fn column_total(&self, column_key: &str) -> Option<f64> {
        self.column_totals
            .iter()
            .find(|(key, _)| key == column_key)
            .map(|(_, total)| *total)
    }

    /// Sum of all column totals.
    pub fn column_sum(&self) -> f64 {
        self.column_totals.iter().map(|(_, total)| total).sum()
    }

    /// Whether the row-wise and column-wise grand totals agree.
    pub fn reconciles(&self, tolerance: f64) -> bool {
        let row_sum: f64 = self.row_totals.iter().sum();
        (row_sum - self.grand_total).abs() <= tolerance
            && (self.column_sum() - self.grand_total).abs() <= tolerance
    }
}

/// Computes totals over `column_keys` for every grouped row.
pub fn compute_totals<S: AsRef<str>>(grouped: &GroupedRows, column_keys: &[S]) -> Totals {
    let mut column_totals: Vec<(String, f64)> = column_keys
        .iter()
        .map(|key| (key.as_ref().to_string(), 0.0))
        .collect();
    let mut row_totals = Vec::with_capacity(grouped.len());

    for row in grouped {
        let mut row_total = 0.0;
        for (key, column_total) in column_totals.iter_mut() {
            let value = row.value(key);
            row_total += value;
            *column_total += value;
        }
        row_totals.push(row_total);
    }

    let grand_total = row_totals.iter().sum();

    Totals {
        row_totals,
        column_totals,
        grand_total,
    }
}
