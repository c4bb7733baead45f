//! Order-insensitive structural diff of two JSON trees.

use serde_json::Value;

use super::path::DiffPath;

/// A key or list item present on one side only.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffItem {
    pub path: DiffPath,
    pub value: Value,
}

/// A path present on both sides whose value differs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub path: DiffPath,
    pub old_value: Value,
    pub new_value: Value,
}

/// Unclassified differences between two trees, tagged with raw paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDiff {
    /// Present in source, absent in target
    pub items_removed: Vec<DiffItem>,
    /// Present in target, absent in source
    pub items_added: Vec<DiffItem>,
    /// Present in both with a different scalar value or JSON kind
    pub values_changed: Vec<ValueChange>,
}

impl RawDiff {
    pub fn is_empty(&self) -> bool {
        self.items_removed.is_empty() && self.items_added.is_empty() && self.values_changed.is_empty()
    }
}

/// Compare `source` against `target`.
///
/// Lists are compared as multisets at every depth, so reordering `enum` or
/// `required` entries is never reported.
pub fn diff_trees(source: &Value, target: &Value) -> RawDiff {
    let mut diff = RawDiff::default();
    diff_node(&DiffPath::root(), source, target, &mut diff);
    diff
}

fn diff_node(path: &DiffPath, source: &Value, target: &Value, diff: &mut RawDiff) {
    match (source, target) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                match new.get(key) {
                    Some(new_value) => diff_node(&path.key(key), old_value, new_value, diff),
                    None => diff.items_removed.push(DiffItem {
                        path: path.key(key),
                        value: old_value.clone(),
                    }),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    diff.items_added.push(DiffItem {
                        path: path.key(key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => diff_lists(path, old, new, diff),
        _ => {
            if source != target {
                diff.values_changed.push(ValueChange {
                    path: path.clone(),
                    old_value: source.clone(),
                    new_value: target.clone(),
                });
            }
        }
    }
}

fn diff_lists(path: &DiffPath, old: &[Value], new: &[Value], diff: &mut RawDiff) {
    let (unmatched_old, unmatched_new) = unmatched_items(old, new);

    // A single replaced object is most likely the same entry edited in place.
    if let ([old_index], [new_index]) = (unmatched_old.as_slice(), unmatched_new.as_slice())
        && old[*old_index].is_object()
        && new[*new_index].is_object()
    {
        diff_node(&path.index(*old_index), &old[*old_index], &new[*new_index], diff);
        return;
    }

    for index in unmatched_old {
        diff.items_removed.push(DiffItem {
            path: path.index(index),
            value: old[index].clone(),
        });
    }
    for index in unmatched_new {
        diff.items_added.push(DiffItem {
            path: path.index(index),
            value: new[index].clone(),
        });
    }
}

/// Indexes on each side left over after pairing equal items one-to-one.
fn unmatched_items(old: &[Value], new: &[Value]) -> (Vec<usize>, Vec<usize>) {
    let mut taken = vec![false; new.len()];
    let mut unmatched_old = Vec::new();

    for (index, item) in old.iter().enumerate() {
        match (0..new.len()).find(|&candidate| !taken[candidate] && unordered_eq(item, &new[candidate])) {
            Some(candidate) => taken[candidate] = true,
            None => unmatched_old.push(index),
        }
    }

    let unmatched_new = taken
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(index, _)| index)
        .collect();

    (unmatched_old, unmatched_new)
}

/// Deep equality that ignores list order at every level.
pub fn unordered_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| unordered_eq(value, other)))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            let (unmatched, _) = unmatched_items(a, b);
            unmatched.is_empty()
        }
        _ => left == right,
    }
}
