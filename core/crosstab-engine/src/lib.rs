//! FILENAME: core/crosstab-engine/src/lib.rs
//! Crosstab (pivot table) reshaping engine for the lead/sales CRM.
//!
//! Takes the flat, pre-aggregated rows returned by the aggregation query
//! service and reshapes them into a crosstab with composite row keys, a one-
//! or two-level column hierarchy, folded metric cells and totals.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `value`, `normalize`, `key`: Input scalars, display strings, grouping keys
//! - `columns`, `aggregate`, `totals`: The calculation steps (HOW we compute)
//! - `view`: Result object for the renderer (WHAT we display)
//! - `engine`: Shape selection and assembly
//! - `query`, `service`: The query boundary and the injected-client runner
//!
//! The reshaping itself is pure and synchronous; only `service` returns errors.

pub mod logging;
pub mod error;
pub mod definition;
pub mod value;
pub mod mask;
pub mod normalize;
pub mod key;
pub mod columns;
pub mod aggregate;
pub mod totals;
pub mod view;
pub mod engine;
pub mod query;
pub mod service;

pub use definition::*;
pub use error::PivotError;
pub use value::{FieldValue, FlatInputRow};
pub use normalize::{normalize, Normalizer, NormalizerOptions};
pub use key::build_key;
pub use columns::{build_columns, BucketColumn, ColumnGroup, ColumnPlan, ColumnTree};
pub use aggregate::{aggregate, GroupedRow, GroupedRows};
pub use totals::{compute_totals, Totals, RECONCILE_TOLERANCE};
pub use view::*;
pub use engine::{assemble_json, assemble_pivot, PivotAssembler, PivotShape};
pub use query::{AggregationQueryService, MetricRequest, QueryPayload, QueryRequest};
pub use service::PivotService;
