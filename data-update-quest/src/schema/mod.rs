//! Schema extraction from OpenAPI 3.x and Swagger 2.x documents.
//!
//! This module provides functionality to:
//! - Locate a named model under `components.schemas` or `definitions`
//! - Inline `$ref` pointers and `allOf` compositions recursively
//! - Strip descriptive text so it never shows up as a schema change

mod compose;
mod resolve;

use serde_json::Value;

use crate::errors::{MigrationError, Result};

pub use resolve::{DESCRIPTIVE_KEYS, Resolver};

/// A parsed API-description document together with a label identifying it in errors.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Where the document came from (usually its file path)
    pub label: String,
    /// The whole document
    pub root: Value,
}

impl SchemaDocument {
    pub fn new(label: impl Into<String>, root: Value) -> Self {
        Self {
            label: label.into(),
            root,
        }
    }

    /// Raw (unresolved) schema of a model, preferring `components.schemas` over `definitions`.
    pub fn model(&self, model_name: &str) -> Result<&Value> {
        let modern = self
            .root
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(|schemas| schemas.get(model_name));
        let legacy = self
            .root
            .get("definitions")
            .and_then(|definitions| definitions.get(model_name));

        modern.or(legacy).ok_or_else(|| MigrationError::ModelNotFound {
            model: model_name.to_string(),
            document: self.label.clone(),
        })
    }
}

/// Extract a model's schema with every reference and composition inlined.
pub fn extract_schema(document: &SchemaDocument, model_name: &str) -> Result<Value> {
    let schema = document.model(model_name)?;
    log::debug!("resolving model '{model_name}' from {}", document.label);
    Resolver::new(&document.root).resolve(schema)
}
