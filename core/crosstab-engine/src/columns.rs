//! FILENAME: core/crosstab-engine/src/columns.rs
//! Column Hierarchy Builder - discovers buckets and lays out header rows.
//!
//! Algorithm:
//! 1. Collect the distinct display values of the column field(s) present in
//!    the data (level 2 values are collected per level 1 parent).
//! 2. Sort each level lexically (string comparison on display values).
//! 3. Flatten the tree into an ordered list of bucket columns, each carrying
//!    its header path (one label per header row).
//! 4. Optionally split every bucket into one sub-column per value field.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::{smallvec, SmallVec};

use crate::definition::{ValueField, MAX_COLUMN_LEVELS};
use crate::key::{bucket_key, value_column_key};
use crate::log_debug;
use crate::normalize::Normalizer;
use crate::value::FlatInputRow;
use crate::view::TOTAL_LABEL;

/// Header labels of one data column, outermost level first.
pub type HeaderPath = SmallVec<[String; 3]>;

// ============================================================================
// COLUMN TREE
// ============================================================================

/// A level-1 value with the level-2 values found under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnGroup {
    pub label: String,
    pub children: Vec<String>,
}

/// Distinct column values discovered in the data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ColumnTree {
    /// No column fields: the pivot is a plain listing.
    #[default]
    Empty,
    /// One column field: sorted distinct values.
    Flat(Vec<String>),
    /// Two column fields: sorted level-1 values, each with sorted children.
    Nested(Vec<ColumnGroup>),
}

impl ColumnTree {
    pub fn depth(&self) -> usize {
        match self {
            ColumnTree::Empty => 0,
            ColumnTree::Flat(_) => 1,
            ColumnTree::Nested(_) => 2,
        }
    }

    /// Number of leaf buckets.
    pub fn bucket_count(&self) -> usize {
        match self {
            ColumnTree::Empty => 0,
            ColumnTree::Flat(labels) => labels.len(),
            ColumnTree::Nested(groups) => groups.iter().map(|g| g.children.len()).sum(),
        }
    }
}

// ============================================================================
// COLUMN PLAN
// ============================================================================

/// One data column of the crosstab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketColumn {
    /// Key under which output rows store this column's value.
    pub key: String,

    /// Header label per header row.
    pub path: HeaderPath,

    /// Index into the value fields when values are laid out separately.
    pub value_field: Option<usize>,
}

/// The ordered data columns plus the information needed to place a row in one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnPlan {
    fields: Vec<String>,
    tree: ColumnTree,
    columns: Vec<BucketColumn>,
    separate_values: bool,
}

impl ColumnPlan {
    pub fn tree(&self) -> &ColumnTree {
        &self.tree
    }

    pub fn columns(&self) -> &[BucketColumn] {
        &self.columns
    }

    /// Column fields taking part in the plan (at most two).
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether each bucket was split per value field.
    pub fn separates_values(&self) -> bool {
        self.separate_values
    }

    /// Number of header levels (length of every column's path).
    pub fn depth(&self) -> usize {
        self.columns.first().map(|c| c.path.len()).unwrap_or(0)
    }

    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }

    /// Bucket a row falls into (before any value-field split).
    pub fn bucket_of(&self, row: &FlatInputRow, normalizer: &Normalizer) -> Option<String> {
        match self.tree {
            ColumnTree::Empty => None,
            ColumnTree::Flat(_) => Some(normalizer.display(&self.fields[0], row.get(&self.fields[0]))),
            ColumnTree::Nested(_) => {
                let level1 = normalizer.display(&self.fields[0], row.get(&self.fields[0]));
                let level2 = normalizer.display(&self.fields[1], row.get(&self.fields[1]));
                Some(bucket_key(&level1, &level2))
            }
        }
    }

    /// Splits every bucket into one sub-column per value field.
    ///
    /// Sub-column keys are `<bucket>_<field>_<aggregation>`; each header path
    /// gains a level holding the metric key.
    pub fn with_value_columns(mut self, value_fields: &[ValueField]) -> Self {
        if value_fields.is_empty() || self.separate_values {
            return self;
        }

        let buckets = std::mem::take(&mut self.columns);
        for bucket in buckets {
            for (vf_idx, vf) in value_fields.iter().enumerate() {
                let mut path = bucket.path.clone();
                path.push(vf.metric_key());
                self.columns.push(BucketColumn {
                    key: value_column_key(&bucket.key, vf),
                    path,
                    value_field: Some(vf_idx),
                });
            }
        }
        self.separate_values = true;
        self
    }

    /// Flat header list: row fields, data column keys, then "Total".
    pub fn headers(&self, row_fields: &[String]) -> Vec<String> {
        let mut headers = Vec::with_capacity(row_fields.len() + self.columns.len() + 1);
        headers.extend(row_fields.iter().cloned());
        headers.extend(self.columns.iter().map(|c| c.key.clone()));
        headers.push(TOTAL_LABEL.to_string());
        headers
    }

    /// Physical header rows, or `None` when a single row suffices.
    ///
    /// Row 0 starts with the row-field names and ends with "Total"; deeper
    /// rows use blank placeholders there. An outer label is repeated once per
    /// column beneath it; the renderer merges consecutive repeats.
    pub fn header_rows(&self, row_fields: &[String]) -> Option<Vec<Vec<String>>> {
        let depth = self.depth();
        if depth < 2 {
            return None;
        }

        let rows = (0..depth)
            .map(|level| {
                let mut cells = Vec::with_capacity(row_fields.len() + self.columns.len() + 1);
                if level == 0 {
                    cells.extend(row_fields.iter().cloned());
                } else {
                    cells.extend(row_fields.iter().map(|_| String::new()));
                }
                cells.extend(self.columns.iter().map(|c| c.path[level].clone()));
                cells.push(if level == 0 { TOTAL_LABEL.to_string() } else { String::new() });
                cells
            })
            .collect();

        Some(rows)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the column plan for up to two column fields.
/// Fields beyond the second are ignored.
pub fn build_columns(
    column_fields: &[String],
    rows: &[FlatInputRow],
    normalizer: &Normalizer,
) -> ColumnPlan {
    let fields: Vec<String> = column_fields.iter().take(MAX_COLUMN_LEVELS).cloned().collect();

    let tree = match fields.len() {
        0 => ColumnTree::Empty,
        1 => ColumnTree::Flat(collect_flat(&fields[0], rows, normalizer)),
        _ => ColumnTree::Nested(collect_nested(&fields[0], &fields[1], rows, normalizer)),
    };

    let columns = flatten_tree(&tree);

    log_debug!(
        "COLUMNS",
        "fields={:?} levels={} buckets={}",
        fields,
        tree.depth(),
        columns.len()
    );

    ColumnPlan {
        fields,
        tree,
        columns,
        separate_values: false,
    }
}

fn collect_flat(field: &str, rows: &[FlatInputRow], normalizer: &Normalizer) -> Vec<String> {
    let unique: FxHashSet<String> = rows
        .iter()
        .map(|row| normalizer.display(field, row.get(field)))
        .collect();

    let mut labels: Vec<String> = unique.into_iter().collect();
    labels.sort();
    labels
}

fn collect_nested(
    level1_field: &str,
    level2_field: &str,
    rows: &[FlatInputRow],
    normalizer: &Normalizer,
) -> Vec<ColumnGroup> {
    let mut children_by_parent: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();

    for row in rows {
        let level1 = normalizer.display(level1_field, row.get(level1_field));
        let level2 = normalizer.display(level2_field, row.get(level2_field));
        children_by_parent.entry(level1).or_default().insert(level2);
    }

    let mut groups: Vec<ColumnGroup> = children_by_parent
        .into_iter()
        .map(|(label, children)| {
            let mut children: Vec<String> = children.into_iter().collect();
            children.sort();
            ColumnGroup { label, children }
        })
        .collect();
    groups.sort_by(|a, b| a.label.cmp(&b.label));
    groups
}

fn flatten_tree(tree: &ColumnTree) -> Vec<BucketColumn> {
    match tree {
        ColumnTree::Empty => Vec::new(),
        ColumnTree::Flat(labels) => labels
            .iter()
            .map(|label| BucketColumn {
                key: label.clone(),
                path: smallvec![label.clone()],
                value_field: None,
            })
            .collect(),
        ColumnTree::Nested(groups) => groups
            .iter()
            .flat_map(|group| {
                group.children.iter().map(move |child| BucketColumn {
                    key: bucket_key(&group.label, child),
                    path: smallvec![group.label.clone(), child.clone()],
                    value_field: None,
                })
            })
            .collect(),
    }
}
