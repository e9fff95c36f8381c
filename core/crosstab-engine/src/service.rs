//! FILENAME: core/crosstab-engine/src/service.rs
//! Pivot Service - runs the grouped query through an injected client and
//! assembles the answer.
//!
//! Upstream errors are reported here, before the assembler is involved; the
//! assembler only ever sees rows (or nothing).

use crate::definition::PivotConfiguration;
use crate::engine::PivotAssembler;
use crate::error::PivotError;
use crate::normalize::{Normalizer, NormalizerOptions};
use crate::query::{AggregationQueryService, QueryPayload, QueryRequest};
use crate::view::PivotResult;
use crate::{log_enter, log_error, log_exit, log_warn};

pub struct PivotService<S> {
    client: S,
    normalizer: Normalizer,
}

impl<S: AggregationQueryService> PivotService<S> {
    pub fn new(client: S) -> Self {
        PivotService {
            client,
            normalizer: Normalizer::default(),
        }
    }

    pub fn with_options(client: S, options: &NormalizerOptions) -> Self {
        PivotService {
            client,
            normalizer: Normalizer::new(options),
        }
    }

    pub fn client(&self) -> &S {
        &self.client
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Validates the configuration, queries `data_source` and assembles the result.
    ///
    /// Malformed payloads yield an empty result; `{ error }` payloads and
    /// client failures are returned as errors.
    pub fn execute(
        &self,
        data_source: &str,
        config: &PivotConfiguration,
    ) -> Result<PivotResult, PivotError> {
        log_enter!("QUERY", "execute", "source={} config={}", data_source, config.name);

        config.validate()?;

        let request = QueryRequest::from_configuration(data_source, config);
        let payload = self.client.execute(&request).map_err(|e| {
            log_error!("QUERY", "query failed: {}", e);
            e
        })?;

        let rows = match QueryPayload::from_json(&payload) {
            QueryPayload::Rows(rows) => rows,
            QueryPayload::Error(message) => {
                log_error!("QUERY", "upstream error: {}", message);
                return Err(PivotError::Upstream(message));
            }
            QueryPayload::Malformed(reason) => {
                log_warn!("QUERY", "malformed payload treated as no data: {}", reason);
                Vec::new()
            }
        };

        let result = PivotAssembler::new(config, &self.normalizer).assemble(&rows);

        log_exit!(
            "QUERY",
            "execute",
            "rows={} total={}",
            result.summary.total_rows,
            result.summary.total_value
        );
        Ok(result)
    }
}
