//! FILENAME: core/crosstab-engine/src/normalize.rs
//! Field Value Normalizer - raw scalar to canonical display string.
//!
//! Every dimension value goes through here before it is used as a label or
//! as part of a grouping key, so two rows group together exactly when their
//! displayed values agree. The functions are total: unparsable dates fall
//! back to the raw text instead of failing the pivot.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::log_warn;
use crate::mask::mask_sensitive;
use crate::value::FieldValue;

/// Fields holding timestamps in the CRM schema.
pub const DEFAULT_TEMPORAL_FIELDS: &[&str] = &[
    "created_at",
    "updata_at",
    "moveintime",
    "followup_scheduletime",
    "arrivaltime",
    "showing_moveintime",
    "showing_scheduletime",
    "showing_created_at",
    "showing_updated_at",
    "contractdate",
    "deal_created_at",
    "deal_updated_at",
];

/// Asia/Shanghai, which observes no DST.
pub const REFERENCE_UTC_OFFSET_SECS: i32 = 8 * 3600;

const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Date-times with an explicit offset (`+08`, `+0800`, `+08:00`).
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Date-times without an offset; taken as already in the reference zone.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(Normalizer::default);

// ============================================================================
// OPTIONS
// ============================================================================

/// Serializable normalizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerOptions {
    /// Fields formatted as calendar dates.
    #[serde(default = "default_temporal_fields")]
    pub temporal_fields: Vec<String>,

    /// Offset of the reference timezone, in seconds east of UTC.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_seconds: i32,

    /// Mask phone / WeChat values in labels and list cells.
    #[serde(default = "default_true")]
    pub mask_sensitive: bool,
}

fn default_temporal_fields() -> Vec<String> {
    DEFAULT_TEMPORAL_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_utc_offset() -> i32 {
    REFERENCE_UTC_OFFSET_SECS
}

fn default_true() -> bool {
    true
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        NormalizerOptions {
            temporal_fields: default_temporal_fields(),
            utc_offset_seconds: REFERENCE_UTC_OFFSET_SECS,
            mask_sensitive: true,
        }
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Normalizer {
    temporal_fields: FxHashSet<String>,
    offset: FixedOffset,
    mask_sensitive: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(&NormalizerOptions::default())
    }
}

impl Normalizer {
    pub fn new(options: &NormalizerOptions) -> Self {
        let offset = FixedOffset::east_opt(options.utc_offset_seconds).unwrap_or_else(|| {
            log_warn!(
                "NORM",
                "utc offset {}s out of range, using reference offset",
                options.utc_offset_seconds
            );
            reference_offset()
        });

        Normalizer {
            temporal_fields: options.temporal_fields.iter().cloned().collect(),
            offset,
            mask_sensitive: options.mask_sensitive,
        }
    }

    pub fn is_temporal(&self, field: &str) -> bool {
        self.temporal_fields.contains(field)
    }

    /// Canonical string for a raw value: `""` for null, `YYYY-MM-DD` for
    /// parseable temporal values, the plain string form otherwise.
    pub fn normalize(&self, field: &str, value: &FieldValue) -> String {
        if value.is_null() {
            return String::new();
        }

        if self.is_temporal(field) {
            if let Some(date) = self.temporal_date(value) {
                return date.format(DATE_OUTPUT_FORMAT).to_string();
            }
        }

        plain_string(value)
    }

    /// `normalize` followed by masking: the label as displayed and grouped.
    pub fn display(&self, field: &str, value: &FieldValue) -> String {
        let normalized = self.normalize(field, value);
        self.mask(field, &normalized)
    }

    /// Masks already-rendered text when masking is enabled.
    pub fn mask(&self, field: &str, text: &str) -> String {
        if self.mask_sensitive {
            mask_sensitive(field, text)
        } else {
            text.to_string()
        }
    }

    /// Calendar date of a temporal value in the reference zone.
    fn temporal_date(&self, value: &FieldValue) -> Option<NaiveDate> {
        match value {
            // Epoch milliseconds; 0 is a placeholder, not 1970-01-01.
            FieldValue::Number(n) if n.is_finite() && *n != 0.0 => {
                DateTime::from_timestamp_millis(*n as i64)
                    .map(|utc| utc.with_timezone(&self.offset).date_naive())
            }
            FieldValue::Text(s) => self.parse_text_date(s.trim()),
            _ => None,
        }
    }

    fn parse_text_date(&self, text: &str) -> Option<NaiveDate> {
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&self.offset).date_naive());
        }

        for format in OFFSET_DATETIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, format) {
                return Some(dt.with_timezone(&self.offset).date_naive());
            }
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(dt.date());
            }
        }

        parse_calendar_date(text)
    }
}

fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// String form of a non-temporal value.
fn plain_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Number(n) => format_number(*n),
        FieldValue::Text(s) => s.clone(),
    }
}

/// Integral floats print without a fractional part ("3", not "3.0").
///
/// Magnitudes of 1e21 and above print every digit ("1000000000000000000000")
/// rather than switching to exponent notation ("1e+21"). Dimension values
/// that large do not occur in practice.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Also folds -0 into "0".
        return "0".to_string();
    }
    format!("{}", n)
}

/// Parses a plain calendar date (`YYYY-MM-DD` or `YYYY/MM/DD`).
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Normalizes with the default CRM settings.
pub fn normalize(field: &str, value: &FieldValue) -> String {
    DEFAULT_NORMALIZER.normalize(field, value)
}
