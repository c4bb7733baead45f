//! File access for schema documents and generated artifacts.

use std::path::Path;

use serde_json::Value;

use crate::errors::{MigrationError, Result};
use crate::schema::SchemaDocument;

/// Load an API-description document from disk.
///
/// Files ending in `.json` are parsed as JSON; everything else is treated as YAML,
/// which also accepts plain JSON content.
pub fn load_document(path: &Path) -> Result<SchemaDocument> {
    let content = std::fs::read_to_string(path).map_err(|err| MigrationError::io(path, err))?;
    let root = parse_document(path, &content)?;
    log::debug!("loaded schema document {}", path.display());
    Ok(SchemaDocument::new(path.display().to_string(), root))
}

fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content).map_err(|source| MigrationError::JsonParse {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(content).map_err(|source| MigrationError::YamlParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Write an artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| MigrationError::io(parent, err))?;
    }
    std::fs::write(path, content).map_err(|err| MigrationError::io(path, err))
}
