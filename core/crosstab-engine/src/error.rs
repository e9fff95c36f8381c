//! FILENAME: core/crosstab-engine/src/error.rs
//! Errors surfaced by the caller side of the engine (query + validation).
//!
//! The reshaping core itself never fails: malformed or empty query results
//! produce an empty `PivotResult`. These errors only come out of
//! `PivotService` and `PivotConfiguration::validate`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    /// The aggregation query service answered with an `{ error }` payload.
    #[error("Upstream query failed: {0}")]
    Upstream(String),

    /// The client could not reach the query service at all.
    #[error("Query transport error: {0}")]
    Transport(String),

    #[error("Invalid pivot configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Payload decode error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PivotError {
    /// True when the failure originated on the other side of the query boundary.
    pub fn is_upstream(&self) -> bool {
        matches!(self, PivotError::Upstream(_) | PivotError::Transport(_))
    }
}
