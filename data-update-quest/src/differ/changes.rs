//! Classification of raw tree diffs into field-level schema changes.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::path::{DiffPath, FieldPath, PathSegment};
use super::tree::{RawDiff, unordered_eq};
use crate::errors::{ClassificationIssue, MigrationError, Result};

static NULL: Value = Value::Null;

/// A field present in the source schema and absent from the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Removal {
    pub field: FieldPath,
}

/// A field present in the target schema and absent from the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Addition {
    pub field: FieldPath,
    /// Declared `default` in the target schema; `None` when the field has none
    pub default: Option<Value>,
}

impl Addition {
    /// Value assigned by the migration: the default, or `null`.
    pub fn value(&self) -> &Value {
        self.default.as_ref().unwrap_or(&NULL)
    }
}

/// A field whose declared `type` differs between source and target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeChange {
    pub field: FieldPath,
    pub old_type: String,
    pub new_type: String,
}

/// A removal/addition pair inferred to be the same field under a new name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rename {
    pub from: FieldPath,
    pub to: FieldPath,
}

/// Kind of a single change, used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    TypeChanged,
    Renamed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "+"),
            ChangeKind::Removed => write!(f, "-"),
            ChangeKind::TypeChanged => write!(f, "~"),
            ChangeKind::Renamed => write!(f, ">"),
        }
    }
}

/// Classified differences between two resolved schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
    pub removals: Vec<Removal>,
    pub additions: Vec<Addition>,
    pub type_changes: Vec<TypeChange>,
    /// Raw entries that could not be mapped to a field and were skipped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ClassificationIssue>,
}

impl ChangeSet {
    /// No field-level change at all (skipped entries are not changes).
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
            && self.removals.is_empty()
            && self.additions.is_empty()
            && self.type_changes.is_empty()
    }

    /// Total number of field-level changes
    pub fn len(&self) -> usize {
        self.renames.len() + self.removals.len() + self.additions.len() + self.type_changes.len()
    }

    /// Flattened `(kind, field, detail)` rows in report order.
    pub fn entries(&self) -> Vec<(ChangeKind, String, String)> {
        let mut rows = Vec::with_capacity(self.len());
        for rename in &self.renames {
            rows.push((ChangeKind::Renamed, rename.from.to_string(), format!("renamed to {}", rename.to)));
        }
        for removal in &self.removals {
            rows.push((ChangeKind::Removed, removal.field.to_string(), "removed".to_string()));
        }
        for addition in &self.additions {
            let detail = match &addition.default {
                Some(default) => format!("default {default}"),
                None => "no default (null)".to_string(),
            };
            rows.push((ChangeKind::Added, addition.field.to_string(), detail));
        }
        for change in &self.type_changes {
            rows.push((
                ChangeKind::TypeChanged,
                change.field.to_string(),
                format!("{} → {}", change.old_type, change.new_type),
            ));
        }
        rows
    }
}

/// Label for the missing side when a field gains or loses its `type` key.
pub const UNTYPED: &str = "(none)";

/// Turn a raw diff into removals, additions, and type changes.
///
/// Fails only when either root schema is not an object. Individual entries that
/// cannot be mapped are logged, recorded in [`ChangeSet::issues`], and skipped.
pub fn classify(raw: &RawDiff, source: &Value, target: &Value) -> Result<ChangeSet> {
    for (side, schema) in [("source", source), ("target", target)] {
        if !schema.is_object() {
            return Err(MigrationError::Classification {
                message: format!("{side} schema is not an object"),
            });
        }
    }

    let mut classifier = Classifier::new(source, target);

    for item in &raw.items_removed {
        match analyze(&item.path) {
            Ok(PathShape::Field(field)) => classifier.push_removal(field, &item.value),
            Ok(PathShape::PropertiesMap(parent)) => classifier.each_property(&item.path, parent, &item.value, Side::Source),
            Ok(PathShape::TypeAttribute(field)) => {
                classifier.push_type_change(field, type_label(&item.value), UNTYPED.to_string())
            }
            Ok(PathShape::TypeMember(field)) => classifier.note_type_member(field),
            Ok(PathShape::Other) => log::debug!("discarding removal at {}", item.path),
            Err(reason) => classifier.skip(&item.path, reason),
        }
    }

    for item in &raw.items_added {
        match analyze(&item.path) {
            Ok(PathShape::Field(field)) => classifier.push_addition(field, &item.value),
            Ok(PathShape::PropertiesMap(parent)) => classifier.each_property(&item.path, parent, &item.value, Side::Target),
            Ok(PathShape::TypeAttribute(field)) => {
                classifier.push_type_change(field, UNTYPED.to_string(), type_label(&item.value))
            }
            Ok(PathShape::TypeMember(field)) => classifier.note_type_member(field),
            Ok(PathShape::Other) => log::debug!("discarding addition at {}", item.path),
            Err(reason) => classifier.skip(&item.path, reason),
        }
    }

    for change in &raw.values_changed {
        match analyze(&change.path) {
            Ok(PathShape::TypeAttribute(field)) => {
                classifier.push_type_change(field, type_label(&change.old_value), type_label(&change.new_value))
            }
            Ok(_) => log::debug!("discarding value change at {}", change.path),
            Err(reason) => classifier.skip(&change.path, reason),
        }
    }

    classifier.resolve_type_members();
    Ok(classifier.changes)
}

/// What a raw path points at, in terms of fields.
#[derive(Debug, PartialEq)]
enum PathShape {
    /// `properties/<a>/properties/<b>`: the field `a.b` itself
    Field(FieldPath),
    /// A field chain ending at a `properties` key: the whole map of children
    PropertiesMap(FieldPath),
    /// A field chain followed by `type`
    TypeAttribute(FieldPath),
    /// A field chain followed by `type/<index>`: a member of a list-valued type
    TypeMember(FieldPath),
    /// Not a field-level change
    Other,
}

fn analyze(path: &DiffPath) -> Result<PathShape, String> {
    let segments = path.segments();
    let mut names: Vec<String> = Vec::new();
    let mut index = 0;

    while index < segments.len() {
        match &segments[index] {
            PathSegment::Key(key) if key == "properties" => match segments.get(index + 1) {
                None => return Ok(PathShape::PropertiesMap(FieldPath::new(names))),
                Some(PathSegment::Key(name)) => {
                    names.push(name.clone());
                    index += 2;
                }
                Some(PathSegment::Index(_)) => return Err("'properties' followed by a list index".to_string()),
            },
            PathSegment::Index(_) if !names.is_empty() => {
                return Err("field definition is a list".to_string());
            }
            _ if names.is_empty() => return Ok(PathShape::Other),
            PathSegment::Key(key) if key == "type" => {
                let field = FieldPath::new(names);
                return Ok(match &segments[index + 1..] {
                    [] => PathShape::TypeAttribute(field),
                    [PathSegment::Index(_)] => PathShape::TypeMember(field),
                    _ => PathShape::Other,
                });
            }
            _ => return Ok(PathShape::Other),
        }
    }

    Ok(PathShape::Field(FieldPath::new(names)))
}

/// Human-readable form of a `type` attribute: `string`, or `string | null` for lists.
pub fn type_label(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(name) => name.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" | "),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Source,
    Target,
}

struct Classifier<'a> {
    source: &'a Value,
    target: &'a Value,
    changes: ChangeSet,
    removed: HashSet<FieldPath>,
    added: HashSet<FieldPath>,
    retyped: HashSet<FieldPath>,
    type_members: Vec<FieldPath>,
}

impl<'a> Classifier<'a> {
    fn new(source: &'a Value, target: &'a Value) -> Self {
        Self {
            source,
            target,
            changes: ChangeSet::default(),
            removed: HashSet::new(),
            added: HashSet::new(),
            retyped: HashSet::new(),
            type_members: Vec::new(),
        }
    }

    /// Record a removal and every nested field under it, parent first.
    fn push_removal(&mut self, field: FieldPath, definition: &Value) {
        if self.removed.insert(field.clone()) {
            self.changes.removals.push(Removal { field: field.clone() });
        }

        if let Some(Value::Object(children)) = definition.get("properties") {
            for (name, child) in children {
                self.push_removal(field.child(name), child);
            }
        }
    }

    /// Record an addition with its target default, then nested fields unless the default covers them.
    fn push_addition(&mut self, field: FieldPath, definition: &Value) {
        let default = field
            .definition(self.target)
            .unwrap_or(definition)
            .get("default")
            .cloned();
        let expand = default.is_none();

        if self.added.insert(field.clone()) {
            self.changes.additions.push(Addition {
                field: field.clone(),
                default,
            });
        }

        if expand && let Some(Value::Object(children)) = definition.get("properties") {
            for (name, child) in children {
                self.push_addition(field.child(name), child);
            }
        }
    }

    fn each_property(&mut self, path: &DiffPath, parent: FieldPath, map: &Value, side: Side) {
        let Value::Object(children) = map else {
            self.skip(path, "'properties' is not an object".to_string());
            return;
        };

        for (name, child) in children {
            match side {
                Side::Source => self.push_removal(parent.child(name), child),
                Side::Target => self.push_addition(parent.child(name), child),
            }
        }
    }

    fn push_type_change(&mut self, field: FieldPath, old_type: String, new_type: String) {
        if self.retyped.insert(field.clone()) {
            self.changes.type_changes.push(TypeChange {
                field,
                old_type,
                new_type,
            });
        }
    }

    fn note_type_member(&mut self, field: FieldPath) {
        if !self.type_members.contains(&field) {
            self.type_members.push(field);
        }
    }

    /// Coalesce list-valued `type` edits into one change per field.
    fn resolve_type_members(&mut self) {
        for field in std::mem::take(&mut self.type_members) {
            match (field.declared_type(self.source), field.declared_type(self.target)) {
                (Some(old), Some(new)) if !unordered_eq(old, new) => {
                    let (old_type, new_type) = (type_label(old), type_label(new));
                    self.push_type_change(field, old_type, new_type);
                }
                (Some(_), Some(_)) => {}
                _ => log::debug!("type of '{field}' not found on both sides"),
            }
        }
    }

    fn skip(&mut self, path: &DiffPath, reason: String) {
        log::warn!("skipping diff entry at {path}: {reason}");
        self.changes
            .issues
            .push(ClassificationIssue::new(path.to_string(), reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::tree::diff_trees;
    use serde_json::json;

    fn classify_schemas(source: &Value, target: &Value) -> ChangeSet {
        classify(&diff_trees(source, target), source, target).unwrap()
    }

    fn fields<'a, I: IntoIterator<Item = &'a FieldPath>>(paths: I) -> Vec<String> {
        paths.into_iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_no_changes() {
        let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let changes = classify_schemas(&schema, &schema);
        assert!(changes.is_empty());
        assert!(changes.issues.is_empty());
    }

    #[test]
    fn test_added_field_with_default() {
        let source = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let target = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "age": {"type": "integer", "default": 0}}
        });

        let changes = classify_schemas(&source, &target);
        assert_eq!(
            changes.additions,
            vec![Addition {
                field: FieldPath::new(["age"]),
                default: Some(json!(0)),
            }]
        );
        assert!(changes.removals.is_empty());
        assert!(changes.type_changes.is_empty());
    }

    #[test]
    fn test_added_field_without_default_is_null() {
        let source = json!({"type": "object", "properties": {}});
        let target = json!({"type": "object", "properties": {"nickname": {"type": "string"}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(changes.additions.len(), 1);
        assert_eq!(changes.additions[0].default, None);
        assert_eq!(changes.additions[0].value(), &Value::Null);
    }

    #[test]
    fn test_explicit_null_default_is_kept() {
        let source = json!({"properties": {}});
        let target = json!({"properties": {"parent": {"type": "string", "default": null}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(changes.additions[0].default, Some(Value::Null));
    }

    #[test]
    fn test_removed_field() {
        let source = json!({"type": "object", "properties": {"id": {"type": "string"}}});
        let target = json!({"type": "object", "properties": {}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(fields(changes.removals.iter().map(|r| &r.field)), vec!["id"]);
        assert!(changes.additions.is_empty());
    }

    #[test]
    fn test_removed_object_expands_to_nested_fields() {
        let source = json!({"properties": {
            "keep": {"type": "string"},
            "size": {"type": "object", "properties": {
                "value": {"type": "number"},
                "unit": {"type": "string"},
                "precision": {"type": "integer"}
            }}
        }});
        let target = json!({"properties": {"keep": {"type": "string"}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(
            fields(changes.removals.iter().map(|r| &r.field)),
            vec!["size", "size.value", "size.unit", "size.precision"]
        );
    }

    #[test]
    fn test_deeply_nested_removal_is_unique() {
        let source = json!({"properties": {
            "a": {"properties": {"b": {"properties": {"c": {"type": "string"}}}}}
        }});
        let target = json!({"properties": {}});

        let changes = classify_schemas(&source, &target);
        let removed = fields(changes.removals.iter().map(|r| &r.field));
        assert_eq!(removed, vec!["a", "a.b", "a.b.c"]);
    }

    #[test]
    fn test_nested_field_added_inside_existing_object() {
        let source = json!({"properties": {"size": {"type": "object", "properties": {"value": {"type": "number"}}}}});
        let target = json!({"properties": {"size": {"type": "object", "properties": {
            "value": {"type": "number"},
            "unit": {"type": "string", "default": "m"}
        }}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(
            changes.additions,
            vec![Addition {
                field: FieldPath::new(["size", "unit"]),
                default: Some(json!("m")),
            }]
        );
    }

    #[test]
    fn test_added_object_expands_with_nested_defaults() {
        let source = json!({"properties": {}});
        let target = json!({"properties": {"size": {"type": "object", "properties": {
            "value": {"type": "number", "default": 1.5},
            "unit": {"type": "string"}
        }}}});

        let changes = classify_schemas(&source, &target);
        let rows: Vec<(String, Option<Value>)> = changes
            .additions
            .iter()
            .map(|a| (a.field.to_string(), a.default.clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("size".to_string(), None),
                ("size.value".to_string(), Some(json!(1.5))),
                ("size.unit".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_added_object_with_default_not_expanded() {
        let source = json!({"properties": {}});
        let target = json!({"properties": {"size": {
            "type": "object",
            "default": {"unit": "m"},
            "properties": {"unit": {"type": "string"}}
        }}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(changes.additions.len(), 1);
        assert_eq!(changes.additions[0].default, Some(json!({"unit": "m"})));
    }

    #[test]
    fn test_whole_properties_map_added() {
        let source = json!({"type": "object"});
        let target = json!({"type": "object", "properties": {"a": {"type": "string"}, "b": {"type": "integer", "default": 3}}});

        let changes = classify_schemas(&source, &target);
        let rows: Vec<String> = changes.additions.iter().map(|a| a.field.to_string()).collect();
        assert_eq!(rows, vec!["a", "b"]);
        assert_eq!(changes.additions[1].default, Some(json!(3)));
    }

    #[test]
    fn test_type_change() {
        let source = json!({"properties": {"age": {"type": "string"}}});
        let target = json!({"properties": {"age": {"type": "integer"}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(
            changes.type_changes,
            vec![TypeChange {
                field: FieldPath::new(["age"]),
                old_type: "string".to_string(),
                new_type: "integer".to_string(),
            }]
        );
        assert!(changes.additions.is_empty());
        assert!(changes.removals.is_empty());
    }

    #[test]
    fn test_type_key_removed_and_added() {
        let source = json!({"properties": {"a": {"type": "string"}, "b": {"format": "date"}}});
        let target = json!({"properties": {"a": {}, "b": {"format": "date", "type": "string"}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(
            changes.type_changes,
            vec![
                TypeChange {
                    field: FieldPath::new(["a"]),
                    old_type: "string".to_string(),
                    new_type: UNTYPED.to_string(),
                },
                TypeChange {
                    field: FieldPath::new(["b"]),
                    old_type: UNTYPED.to_string(),
                    new_type: "string".to_string(),
                },
            ]
        );
        assert!(changes.removals.is_empty());
        assert!(changes.additions.is_empty());
        assert!(changes.issues.is_empty());
    }

    #[test]
    fn test_list_type_members_coalesced() {
        let source = json!({"properties": {"age": {"type": ["string", "null"]}}});
        let target = json!({"properties": {"age": {"type": ["integer", "null"]}}});

        let changes = classify_schemas(&source, &target);
        assert_eq!(changes.type_changes.len(), 1);
        assert_eq!(changes.type_changes[0].old_type, "string | null");
        assert_eq!(changes.type_changes[0].new_type, "integer | null");
    }

    #[test]
    fn test_non_field_changes_discarded() {
        let source = json!({
            "type": "object",
            "required": ["a"],
            "properties": {"a": {"type": "string", "enum": ["x"], "format": "date"}}
        });
        let target = json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {"a": {"type": "string", "enum": ["x", "y"], "maxLength": 3}}
        });

        let changes = classify_schemas(&source, &target);
        assert!(changes.is_empty());
        assert!(changes.issues.is_empty());
    }

    #[test]
    fn test_reordered_required_and_enum_produce_nothing() {
        let source = json!({"required": ["a", "b"], "properties": {"a": {"enum": [1, 2, 3]}, "b": {}}});
        let target = json!({"required": ["b", "a"], "properties": {"b": {}, "a": {"enum": [3, 1, 2]}}});

        let changes = classify_schemas(&source, &target);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_malformed_properties_list_recorded_as_issue() {
        let source = json!({"properties": [{"type": "string"}]});
        let target = json!({"properties": [{"type": "integer"}]});

        let changes = classify_schemas(&source, &target);
        assert!(changes.is_empty());
        assert_eq!(changes.issues.len(), 1);
        assert_eq!(changes.issues[0].path, "root['properties'][0]['type']");
    }

    #[test]
    fn test_non_object_root_is_fatal() {
        let source = json!(["not", "a", "schema"]);
        let target = json!({"properties": {}});

        let err = classify(&diff_trees(&source, &target), &source, &target).unwrap_err();
        assert!(matches!(err, MigrationError::Classification { .. }));
    }

    #[test]
    fn test_entries_rows() {
        let changes = ChangeSet {
            removals: vec![Removal {
                field: FieldPath::new(["id"]),
            }],
            additions: vec![Addition {
                field: FieldPath::new(["age"]),
                default: Some(json!(0)),
            }],
            ..Default::default()
        };

        let rows = changes.entries();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, ChangeKind::Removed);
        assert_eq!(rows[1], (ChangeKind::Added, "age".to_string(), "default 0".to_string()));
    }

    #[test]
    fn test_analyze_shapes() {
        let field = DiffPath::root().key("properties").key("a").key("properties").key("b");
        assert_eq!(analyze(&field), Ok(PathShape::Field(FieldPath::new(["a", "b"]))));

        let map = DiffPath::root().key("properties").key("a").key("properties");
        assert_eq!(analyze(&map), Ok(PathShape::PropertiesMap(FieldPath::new(["a"]))));

        let root_map = DiffPath::root().key("properties");
        assert_eq!(analyze(&root_map), Ok(PathShape::PropertiesMap(FieldPath::new(Vec::<String>::new()))));

        let ty = DiffPath::root().key("properties").key("a").key("type");
        assert_eq!(analyze(&ty), Ok(PathShape::TypeAttribute(FieldPath::new(["a"]))));

        let member = DiffPath::root().key("properties").key("a").key("type").index(0);
        assert_eq!(analyze(&member), Ok(PathShape::TypeMember(FieldPath::new(["a"]))));

        let items = DiffPath::root().key("properties").key("a").key("items").key("properties").key("x");
        assert_eq!(analyze(&items), Ok(PathShape::Other));

        assert_eq!(analyze(&DiffPath::root().key("type")), Ok(PathShape::Other));
        assert_eq!(analyze(&DiffPath::root()), Ok(PathShape::Field(FieldPath::new(Vec::<String>::new()))));
    }
}
