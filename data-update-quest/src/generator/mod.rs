//! Migration template generator.
//!
//! This module provides functionality to:
//! - Render a change set as a `jq` transformation script
//! - Render a Markdown report of the detected changes
//! - Run the whole extract, diff, classify, render pipeline for two schema documents

mod jq;
mod readme;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::differ::{ChangeSet, compare_schemas, detect_renames};
use crate::errors::Result;
use crate::loader::{load_document, write_artifact};
use crate::schema::{SchemaDocument, extract_schema};

pub use jq::{IDENTITY, jq_path, render_script};
pub use readme::render_readme;

/// File name of the generated script.
pub const SCRIPT_FILE: &str = "transform.jq";
/// File name of the generated report.
pub const README_FILE: &str = "README.md";

/// Which models of which documents are being compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSubject {
    pub source_document: String,
    pub source_model: String,
    pub target_document: String,
    pub target_model: String,
}

/// The two generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTemplates {
    pub script: String,
    pub readme: String,
}

impl MigrationTemplates {
    pub fn render(changes: &ChangeSet, subject: &MigrationSubject, generated_at: DateTime<Utc>) -> Self {
        Self {
            script: render_script(changes),
            readme: render_readme(changes, subject, generated_at),
        }
    }
}

/// Write `transform.jq` and `README.md` under `output_dir`, returning the written paths.
pub fn save_templates(templates: &MigrationTemplates, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let script_path = output_dir.join(SCRIPT_FILE);
    let readme_path = output_dir.join(README_FILE);

    write_artifact(&script_path, &templates.script)?;
    write_artifact(&readme_path, &templates.readme)?;

    log::info!("wrote migration templates to {}", output_dir.display());
    Ok(vec![script_path, readme_path])
}

/// Compares one model across two schema documents.
pub struct TemplateGenerator {
    subject: MigrationSubject,
    source_schema: Value,
    target_schema: Value,
    detect_renames: bool,
}

impl TemplateGenerator {
    /// Extract both models; fails if either is missing or cannot be resolved.
    pub fn new(
        source: &SchemaDocument,
        source_model: &str,
        target: &SchemaDocument,
        target_model: &str,
    ) -> Result<Self> {
        let source_schema = extract_schema(source, source_model)?;
        let target_schema = extract_schema(target, target_model)?;

        Ok(Self {
            subject: MigrationSubject {
                source_document: source.label.clone(),
                source_model: source_model.to_string(),
                target_document: target.label.clone(),
                target_model: target_model.to_string(),
            },
            source_schema,
            target_schema,
            detect_renames: false,
        })
    }

    /// Load both documents from disk, then extract the models.
    pub fn from_files(source_path: &Path, source_model: &str, target_path: &Path, target_model: &str) -> Result<Self> {
        let source = load_document(source_path)?;
        let target = load_document(target_path)?;
        Self::new(&source, source_model, &target, target_model)
    }

    pub fn with_rename_detection(mut self, enabled: bool) -> Self {
        self.detect_renames = enabled;
        self
    }

    pub fn subject(&self) -> &MigrationSubject {
        &self.subject
    }

    pub fn source_schema(&self) -> &Value {
        &self.source_schema
    }

    pub fn target_schema(&self) -> &Value {
        &self.target_schema
    }

    /// Classified changes from source to target.
    pub fn analyze_changes(&self) -> Result<ChangeSet> {
        let changes = compare_schemas(&self.source_schema, &self.target_schema)?;
        if self.detect_renames {
            Ok(detect_renames(changes, &self.source_schema, &self.target_schema))
        } else {
            Ok(changes)
        }
    }

    pub fn generate(&self, generated_at: DateTime<Utc>) -> Result<MigrationTemplates> {
        let changes = self.analyze_changes()?;
        Ok(MigrationTemplates::render(&changes, &self.subject, generated_at))
    }
}
