//! FILENAME: tests/test_service.rs
//! Integration tests for running pivots through an injected query client.

mod common;

use common::{assert_cell_number, assert_cell_text, assert_reconciled, LeadFixture, StubQueryService};
use crosstab_engine::{
    AggregationType, FilterCondition, FilterOperator, NormalizerOptions, PivotConfiguration,
    PivotError, PivotService, QueryRequest, SortConfig, SortDirection,
};
use serde_json::{json, Value};

fn create_config() -> PivotConfiguration {
    PivotConfiguration::new("Leads per source")
        .with_row_fields(["community"])
        .with_column_fields(["source"])
        .with_value_field("id", AggregationType::Count)
}

#[test]
fn test_execute_assembles_payload() {
    let service = PivotService::new(StubQueryService::new(LeadFixture::payload()));
    let result = service.execute("leads", &create_config()).unwrap();

    assert_eq!(result.rows.len(), 3);
    assert_cell_text(&result.rows[0], "community", "Riverside");
    assert_cell_number(&result.totals, "Total", LeadFixture::total_ids());
    assert_reconciled(&result);
    assert_eq!(service.client().request_count(), 1);
}

#[test]
fn test_request_carries_configuration() {
    let mut config = create_config()
        .with_value_field("budget", AggregationType::Avg)
        .with_filter(FilterCondition::between(
            "created_at",
            FilterOperator::DateBetween,
            json!("2024-01-01"),
            json!("2024-03-31"),
        ));
    config.sort_by.push(SortConfig {
        field: "community".to_string(),
        direction: SortDirection::Desc,
    });

    let service = PivotService::new(StubQueryService::new(json!({ "result": [] })));
    service.execute("showings", &config).unwrap();

    let requests = service.client().requests.borrow();
    let request = &requests[0];
    assert_eq!(request.data_source, "showings");
    assert_eq!(request.row_fields, vec!["community"]);
    assert_eq!(request.value_fields.len(), 2);
    assert_eq!(request.value_fields[1].aggregation, AggregationType::Avg);

    let wire = serde_json::to_value(request).unwrap();
    assert_eq!(wire["filters"][0]["operator"], json!("date_between"));
    assert_eq!(wire["filters"][0]["value2"], json!("2024-03-31"));
    assert_eq!(wire["sortBy"][0]["direction"], json!("desc"));

    assert_eq!(
        config.filter_summary(),
        vec!["created_at (date range: 01-01 ~ 03-31)".to_string()]
    );
}

#[test]
fn test_upstream_error_is_returned() {
    let service = PivotService::new(StubQueryService::new(json!({
        "error": "function execute_multi_level_pivot_analysis does not exist",
        "sql": null
    })));
    let err = service.execute("leads", &create_config()).unwrap_err();

    assert!(matches!(err, PivotError::Upstream(ref msg) if msg.contains("does not exist")));
    assert!(err.to_string().starts_with("Upstream query failed"));
}

#[test]
fn test_transport_error_is_returned() {
    let client = |_: &QueryRequest| -> Result<Value, PivotError> {
        Err(PivotError::Transport("timed out after 30s".to_string()))
    };
    let err = PivotService::new(client).execute("leads", &create_config()).unwrap_err();
    assert!(err.is_upstream());
}

#[test]
fn test_payload_decode_error_converts() {
    let client = |_: &QueryRequest| -> Result<Value, PivotError> {
        let value: Value = serde_json::from_str("{ not json")?;
        Ok(value)
    };
    let err = PivotService::new(client).execute("leads", &create_config()).unwrap_err();
    assert!(matches!(err, PivotError::Payload(_)));
}

#[test]
fn test_malformed_payload_is_no_data() {
    let service = PivotService::new(StubQueryService::new(json!({ "result": "oops" })));
    let result = service.execute("leads", &create_config()).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.summary.total_value, 0.0);
}

#[test]
fn test_invalid_configuration_never_queries() {
    let service = PivotService::new(StubQueryService::new(LeadFixture::payload()));
    let overlapping = create_config().with_row_fields(["source"]);

    let err = service.execute("leads", &overlapping).unwrap_err();
    assert!(matches!(err, PivotError::InvalidConfiguration(_)));
    assert_eq!(service.client().request_count(), 0);
}

#[test]
fn test_custom_normalizer_options() {
    let payload = json!({ "result": [
        { "visit_day": "2024-05-01T20:00:00Z", "source": "web", "id_count": 1 },
        { "visit_day": "2024-05-01T23:30:00Z", "source": "web", "id_count": 1 }
    ]});
    let options = NormalizerOptions {
        temporal_fields: vec!["visit_day".to_string()],
        utc_offset_seconds: 0,
        mask_sensitive: true,
    };
    let config = PivotConfiguration::new("visits")
        .with_row_fields(["visit_day"])
        .with_column_fields(["source"])
        .with_value_field("id", AggregationType::Count);

    let service = PivotService::with_options(StubQueryService::new(payload), &options);
    let result = service.execute("showings", &config).unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_cell_text(&result.rows[0], "visit_day", "2024-05-01");
    assert_cell_number(&result.rows[0], "web", 2.0);
    assert!(service.normalizer().is_temporal("visit_day"));
    assert!(!service.normalizer().is_temporal("created_at"));
}
