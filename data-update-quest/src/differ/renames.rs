//! Heuristic pairing of removed and added fields into renames.

use serde_json::Value;

use super::changes::{ChangeSet, Rename};
use super::tree::unordered_eq;

/// Pair each removal with the first remaining addition at the same depth that
/// declares the same `type`. Paired entries move into [`ChangeSet::renames`].
///
/// Fields without a declared type are never paired.
pub fn detect_renames(mut changes: ChangeSet, source: &Value, target: &Value) -> ChangeSet {
    let mut removals = Vec::with_capacity(changes.removals.len());

    for removal in std::mem::take(&mut changes.removals) {
        let Some(old_type) = removal.field.declared_type(source) else {
            removals.push(removal);
            continue;
        };

        let candidate = changes.additions.iter().position(|addition| {
            addition.field.depth() == removal.field.depth()
                && addition
                    .field
                    .declared_type(target)
                    .is_some_and(|new_type| unordered_eq(old_type, new_type))
        });

        match candidate {
            Some(index) => {
                let addition = changes.additions.remove(index);
                log::debug!("treating '{}' -> '{}' as a rename", removal.field, addition.field);
                changes.renames.push(Rename {
                    from: removal.field,
                    to: addition.field,
                });
            }
            None => removals.push(removal),
        }
    }

    changes.removals = removals;
    changes
}
