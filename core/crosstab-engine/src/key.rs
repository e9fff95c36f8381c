//! FILENAME: core/crosstab-engine/src/key.rs
//! Composite Key Builder - grouping identities for rows and column buckets.

use smallvec::SmallVec;

use crate::definition::ValueField;
use crate::normalize::Normalizer;
use crate::value::FlatInputRow;

/// Separator between the parts of a row key.
pub const KEY_SEPARATOR: &str = "|";

/// Separator between the levels of a two-level bucket key
/// (and between a bucket and its value-field suffix).
pub const BUCKET_SEPARATOR: &str = "_";

/// Display values of the key fields, in field order.
/// Most configurations group by four or fewer dimensions.
pub type KeyParts = SmallVec<[String; 4]>;

/// Display values of `fields` for one row (normalized and masked).
pub fn key_parts(fields: &[String], row: &FlatInputRow, normalizer: &Normalizer) -> KeyParts {
    fields
        .iter()
        .map(|field| normalizer.display(field, row.get(field)))
        .collect()
}

/// Joins already-normalized parts into a key.
pub fn join_key(parts: &[String]) -> String {
    parts.join(KEY_SEPARATOR)
}

/// Row key: the display values of `fields` joined with `|`.
///
/// Rows with identical displayed values get identical keys. Values that
/// themselves contain `|` can make distinct tuples collide; dimension values
/// in practice do not.
pub fn build_key(fields: &[String], row: &FlatInputRow, normalizer: &Normalizer) -> String {
    join_key(&key_parts(fields, row, normalizer))
}

/// Bucket key of a two-level column: `<level1>_<level2>`.
///
/// Not escaped: `("a_b", "c")` and `("a", "b_c")` share the key `a_b_c`.
pub fn bucket_key(level1: &str, level2: &str) -> String {
    format!("{}{}{}", level1, BUCKET_SEPARATOR, level2)
}

/// Key of a per-value-field sub-column: `<bucket>_<field>_<aggregation>`.
pub fn value_column_key(bucket: &str, value_field: &ValueField) -> String {
    format!("{}{}{}", bucket, BUCKET_SEPARATOR, value_field.metric_key())
}
