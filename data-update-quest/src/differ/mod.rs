//! Schema comparison.
//!
//! This module provides functionality to:
//! - Diff two resolved schema trees without regard to list order
//! - Classify raw differences into field removals, additions, and type changes
//! - Optionally pair removals with additions as renames

mod changes;
mod path;
mod renames;
mod tree;

use serde_json::Value;

use crate::errors::Result;

pub use changes::{Addition, ChangeKind, ChangeSet, Removal, Rename, TypeChange, classify, type_label};
pub use path::{DiffPath, FieldPath, PathSegment};
pub use renames::detect_renames;
pub use tree::{DiffItem, RawDiff, ValueChange, diff_trees, unordered_eq};

/// Diff and classify two resolved schemas in one step.
pub fn compare_schemas(source: &Value, target: &Value) -> Result<ChangeSet> {
    let raw = diff_trees(source, target);
    log::debug!(
        "raw diff: {} removed, {} added, {} changed",
        raw.items_removed.len(),
        raw.items_added.len(),
        raw.values_changed.len()
    );
    classify(&raw, source, target)
}
