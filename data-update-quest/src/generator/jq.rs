//! `jq` transformation script rendering.

use crate::differ::{ChangeSet, FieldPath};

/// Script emitted when nothing needs to change.
pub const IDENTITY: &str = ".";

/// Render a change set as a single `jq` pipeline.
///
/// Renamed fields are copied first, then removals and renamed-from fields are
/// deleted, then added fields are set to their default (or `null`). Type changes
/// are reported elsewhere and never produce a statement.
pub fn render_script(changes: &ChangeSet) -> String {
    let mut statements = Vec::with_capacity(changes.len());

    for rename in &changes.renames {
        statements.push(format!("{} = {}", jq_path(&rename.to), jq_path(&rename.from)));
    }
    for removal in &changes.removals {
        statements.push(format!("del({})", jq_path(&removal.field)));
    }
    for rename in &changes.renames {
        statements.push(format!("del({})", jq_path(&rename.from)));
    }
    for addition in &changes.additions {
        statements.push(format!("{} = {}", jq_path(&addition.field), addition.value()));
    }

    if statements.is_empty() {
        IDENTITY.to_string()
    } else {
        statements.join(" | ")
    }
}

/// `user.address` becomes `.user.address`; names that are not plain identifiers are quoted.
pub fn jq_path(field: &FieldPath) -> String {
    let mut path = String::new();
    for name in field.names() {
        path.push('.');
        if is_identifier(name) {
            path.push_str(name);
        } else {
            path.push_str(&serde_json::Value::String(name.clone()).to_string());
        }
    }
    if path.is_empty() {
        path.push('.');
    }
    path
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the names `jq` accepts after a bare `.`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
