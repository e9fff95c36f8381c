//! FILENAME: tests/common/mod.rs
//! Fixtures and assertion helpers for crosstab-engine integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use crosstab_engine::{
    AggregationQueryService, FlatInputRow, PivotCell, PivotError, PivotResult, PivotRow,
    QueryRequest, RECONCILE_TOLERANCE,
};
use serde_json::{json, Value};

// ============================================================================
// FIXTURES
// ============================================================================

/// Lead counts per community/source/stage/quarter, as the grouped query returns them.
pub struct LeadFixture;

impl LeadFixture {
    /// (community, source, stage, year, quarter, id_count, budget_sum)
    pub fn data() -> Vec<(&'static str, &'static str, &'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("Riverside", "web", "new", "2023", "Q3", 4.0, 12000.0),
            ("Riverside", "web", "visited", "2023", "Q4", 2.0, 6500.0),
            ("Riverside", "app", "new", "2024", "Q1", 5.0, 15500.0),
            ("Riverside", "referral", "signed", "2024", "Q1", 1.0, 4200.0),
            ("Lakeview", "web", "new", "2023", "Q3", 3.0, 9000.0),
            ("Lakeview", "app", "visited", "2023", "Q4", 6.0, 21000.0),
            ("Lakeview", "app", "new", "2024", "Q2", 2.0, 7000.0),
            ("Lakeview", "referral", "new", "2024", "Q2", 1.0, 3100.0),
            ("Hillcrest", "web", "signed", "2024", "Q1", 2.0, 8800.0),
            ("Hillcrest", "web", "new", "2024", "Q2", 7.0, 20300.0),
            ("Hillcrest", "app", "visited", "2023", "Q3", 1.0, 2500.0),
            ("Hillcrest", "referral", "signed", "2023", "Q4", 3.0, 11700.0),
        ]
    }

    pub fn rows() -> Vec<FlatInputRow> {
        Self::data()
            .into_iter()
            .map(|(community, source, stage, year, quarter, ids, budget)| {
                FlatInputRow::new()
                    .with("community", community)
                    .with("source", source)
                    .with("stage", stage)
                    .with("year", year)
                    .with("quarter", quarter)
                    .with("id_count", ids)
                    .with("budget_sum", budget)
            })
            .collect()
    }

    /// The rows wrapped in the query service's `{ result, sql }` envelope.
    pub fn payload() -> Value {
        let result: Vec<Value> = Self::data()
            .into_iter()
            .map(|(community, source, stage, year, quarter, ids, budget)| {
                json!({
                    "community": community,
                    "source": source,
                    "stage": stage,
                    "year": year,
                    "quarter": quarter,
                    "id_count": ids,
                    "budget_sum": budget,
                })
            })
            .collect();
        json!({ "result": result, "sql": "select ... group by community, source" })
    }

    pub fn total_ids() -> f64 {
        Self::data().iter().map(|d| d.5).sum()
    }

    pub fn total_budget() -> f64 {
        Self::data().iter().map(|d| d.6).sum()
    }
}

// ============================================================================
// STUB QUERY SERVICE
// ============================================================================

/// Answers every request with a canned payload and records what it was asked.
pub struct StubQueryService {
    payload: Value,
    pub requests: RefCell<Vec<QueryRequest>>,
}

impl StubQueryService {
    pub fn new(payload: Value) -> Self {
        StubQueryService {
            payload,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl AggregationQueryService for StubQueryService {
    fn execute(&self, request: &QueryRequest) -> Result<Value, PivotError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(self.payload.clone())
    }
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Assert that a cell holds an expected number value.
pub fn assert_cell_number(row: &PivotRow, column: &str, expected: f64) {
    match row.get(column) {
        Some(PivotCell::Number(n)) => {
            assert!(
                (n - expected).abs() < 0.001,
                "Cell '{}' expected {} but got {}",
                column, expected, n
            );
        }
        other => panic!("Cell '{}' expected Number({}) but got {:?}", column, expected, other),
    }
}

/// Assert that a cell holds expected text.
pub fn assert_cell_text(row: &PivotRow, column: &str, expected: &str) {
    match row.get(column) {
        Some(PivotCell::Text(s)) => {
            assert_eq!(s, expected, "Cell '{}' expected '{}' but got '{}'", column, expected, s);
        }
        other => panic!("Cell '{}' expected Text('{}') but got {:?}", column, expected, other),
    }
}

/// Assert that a cell is empty.
pub fn assert_cell_empty(row: &PivotRow, column: &str) {
    match row.get(column) {
        Some(PivotCell::Empty) => {}
        other => panic!("Cell '{}' expected empty but got {:?}", column, other),
    }
}

/// Assert that row totals, column totals and the summary agree.
pub fn assert_reconciled(result: &PivotResult) {
    let row_sum: f64 = result.row_totals().iter().sum();
    let data_columns = &result.headers[..result.headers.len().saturating_sub(1)];
    let column_sum: f64 = data_columns
        .iter()
        .filter_map(|header| result.totals.number(header))
        .sum();

    assert!(
        (row_sum - result.summary.total_value).abs() < RECONCILE_TOLERANCE,
        "row totals {} != summary {}",
        row_sum, result.summary.total_value
    );
    assert!(
        (column_sum - result.summary.total_value).abs() < RECONCILE_TOLERANCE,
        "column totals {} != summary {}",
        column_sum, result.summary.total_value
    );
    assert!((result.grand_total() - result.summary.total_value).abs() < RECONCILE_TOLERANCE);
}
