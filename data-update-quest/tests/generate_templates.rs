//! End-to-end template generation from schema documents on disk.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use data_update_quest::{
    MigrationError, SchemaDocument, TemplateGenerator, load_document, save_templates,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn openapi(schemas: serde_json::Value) -> SchemaDocument {
    SchemaDocument::new("inline", json!({"openapi": "3.0.0", "components": {"schemas": schemas}}))
}

fn script_between(source: serde_json::Value, target: serde_json::Value) -> String {
    let source = openapi(json!({"Model": source}));
    let target = openapi(json!({"Model": target}));
    TemplateGenerator::new(&source, "Model", &target, "Model")
        .unwrap()
        .generate(Utc::now())
        .unwrap()
        .script
}

#[test]
fn test_openapi_yaml_with_refs_and_all_of() {
    let generator = TemplateGenerator::from_files(
        &fixture("organization-v1.yaml"),
        "Organization",
        &fixture("organization-v2.yaml"),
        "Organization",
    )
    .unwrap();

    let changes = generator.analyze_changes().unwrap();
    let removed: Vec<String> = changes.removals.iter().map(|r| r.field.to_string()).collect();
    let added: Vec<String> = changes.additions.iter().map(|a| a.field.to_string()).collect();
    assert_eq!(removed, vec!["ownerId"]);
    assert_eq!(added, vec!["tags", "billing", "billing.plan", "billing.seats"]);
    assert_eq!(changes.type_changes.len(), 1);
    assert_eq!(changes.type_changes[0].field.to_string(), "size");
    assert!(changes.issues.is_empty());

    let templates = generator.generate(Utc::now()).unwrap();
    assert_eq!(
        templates.script,
        r#"del(.ownerId) | .tags = [] | .billing = null | .billing.plan = "free" | .billing.seats = null"#
    );
    assert!(templates.readme.contains("- `size`: string → integer"));
    assert!(templates.readme.contains("- `billing.plan` (default: `\"free\"`)"));
}

#[test]
fn test_swagger_json_with_self_reference() {
    let generator = TemplateGenerator::from_files(
        &fixture("dataset-v1.json"),
        "Dataset",
        &fixture("dataset-v2.json"),
        "Dataset",
    )
    .unwrap();

    let changes = generator.analyze_changes().unwrap();
    let removed: Vec<String> = changes.removals.iter().map(|r| r.field.to_string()).collect();
    assert_eq!(
        removed,
        vec![
            "connector",
            "connector.id",
            "connector.name",
            "connector.version",
            "parent.connector",
            "parent.connector.id",
            "parent.connector.name",
            "parent.connector.version",
        ]
    );

    let script = generator.generate(Utc::now()).unwrap().script;
    assert!(script.starts_with("del(.connector) | del(.connector.id)"));
    assert!(script.ends_with(".parent.main = true | .main = true"));
}

#[test]
fn test_same_document_yields_identity() {
    let document = load_document(&fixture("organization-v2.yaml")).unwrap();
    let generator = TemplateGenerator::new(&document, "Organization", &document, "Organization").unwrap();
    let templates = generator.generate(Utc::now()).unwrap();

    assert_eq!(templates.script, ".");
    assert!(templates.readme.contains("No changes detected"));
}

#[test]
fn test_added_field_with_default() {
    let script = script_between(
        json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        json!({"type": "object", "properties": {"name": {"type": "string"}, "age": {"type": "integer", "default": 0}}}),
    );
    assert_eq!(script, ".age = 0");
}

#[test]
fn test_removed_field() {
    let script = script_between(
        json!({"type": "object", "properties": {"id": {"type": "string"}}}),
        json!({"type": "object", "properties": {}}),
    );
    assert_eq!(script, "del(.id)");
}

#[test]
fn test_type_change_only_is_identity() {
    let source = openapi(json!({"Model": {"properties": {"age": {"type": "string"}}}}));
    let target = openapi(json!({"Model": {"properties": {"age": {"type": "integer"}}}}));
    let generator = TemplateGenerator::new(&source, "Model", &target, "Model").unwrap();

    let changes = generator.analyze_changes().unwrap();
    assert_eq!(changes.type_changes.len(), 1);
    assert!(changes.removals.is_empty());
    assert!(changes.additions.is_empty());
    assert_eq!(generator.generate(Utc::now()).unwrap().script, ".");
}

#[test]
fn test_description_changes_ignored() {
    let script = script_between(
        json!({"type": "object", "description": "old", "properties": {"a": {"type": "string", "description": "x"}}}),
        json!({"type": "object", "description": "new", "properties": {"a": {"type": "string", "title": "A"}}}),
    );
    assert_eq!(script, ".");
}

#[test]
fn test_missing_model_reports_document() {
    let err = TemplateGenerator::from_files(
        &fixture("organization-v1.yaml"),
        "Workspace",
        &fixture("organization-v2.yaml"),
        "Workspace",
    )
    .err()
    .unwrap();

    match err {
        MigrationError::ModelNotFound { model, document } => {
            assert_eq!(model, "Workspace");
            assert!(document.ends_with("organization-v1.yaml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_external_reference_unsupported() {
    let source = openapi(json!({"Model": {"properties": {"owner": {"$ref": "common.yaml#/components/schemas/User"}}}}));
    let target = openapi(json!({"Model": {}}));

    let err = TemplateGenerator::new(&source, "Model", &target, "Model").err().unwrap();
    assert!(matches!(err, MigrationError::UnsupportedReferenceFormat { .. }));
}

#[test]
fn test_templates_saved_to_output_dir() {
    let generator = TemplateGenerator::from_files(
        &fixture("organization-v1.yaml"),
        "Organization",
        &fixture("organization-v2.yaml"),
        "Organization",
    )
    .unwrap();
    let generated_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let templates = generator.generate(generated_at).unwrap();

    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("migrations/organization");
    save_templates(&templates, &output_dir).unwrap();

    let script = std::fs::read_to_string(output_dir.join("transform.jq")).unwrap();
    let readme = std::fs::read_to_string(output_dir.join("README.md")).unwrap();
    assert_eq!(script, templates.script);
    assert!(readme.contains("2025-01-02T03:04:05Z"));
    assert!(readme.contains("### Field Removals\n- `ownerId`"));
}
