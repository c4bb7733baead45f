//! Moving documents between the store and a directory tree.
//!
//! Layout: `<dir>/<short name>/<document id>.json`, one directory per index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::client::{StoreClient, StoredDocument};
use crate::errors::{MigrationError, Result};

/// Outcome of a dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DumpReport {
    /// Files written per short index name
    pub written: BTreeMap<String, Vec<PathBuf>>,
    /// Store keys whose document had no string `id`
    pub skipped: Vec<String>,
}

impl DumpReport {
    pub fn total_written(&self) -> usize {
        self.written.values().map(Vec::len).sum()
    }
}

/// Outcome of an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadReport {
    /// Keys set per short index name
    pub uploaded: BTreeMap<String, Vec<String>>,
}

impl UploadReport {
    pub fn total_uploaded(&self) -> usize {
        self.uploaded.values().map(Vec::len).sum()
    }
}

/// Write every document of the selected indexes under `dir`.
///
/// With no `names`, every index in the namespace is dumped.
pub async fn dump(client: &mut StoreClient, dir: &Path, names: &[String]) -> Result<DumpReport> {
    let indexes = select_indexes(client, names).await?;
    let mut report = DumpReport::default();

    for (name, index) in indexes {
        let documents = client.search_all(&index).await?;
        let target_dir = dir.join(&name);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|err| MigrationError::io(&target_dir, err))?;

        let written = report.written.entry(name.clone()).or_default();
        for StoredDocument { key, document } in documents {
            let Some(id) = document_id(&document) else {
                log::warn!("skipping {key}: document id is missing or not a plain file name");
                report.skipped.push(key);
                continue;
            };

            let path = target_dir.join(format!("{id}.json"));
            tokio::fs::write(&path, document.to_string())
                .await
                .map_err(|err| MigrationError::io(&path, err))?;
            log::info!("dumped {name:<20} : {id}");
            written.push(path);
        }
    }

    Ok(report)
}

/// Set every `<dir>/<name>/*.json` file as `<index for name>:<file stem>`.
pub async fn upload(client: &mut StoreClient, dir: &Path) -> Result<UploadReport> {
    if !dir.is_dir() {
        return Err(MigrationError::store(format!("{} is not a directory", dir.display())));
    }

    let mut report = UploadReport::default();

    for index_dir in sorted_entries(dir).await? {
        if !index_dir.is_dir() {
            continue;
        }
        let Some(name) = index_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let index = client.naming().index_for(&name);
        let uploaded = report.uploaded.entry(name.clone()).or_default();

        for file in sorted_entries(&index_dir).await? {
            if file.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = tokio::fs::read_to_string(&file)
                .await
                .map_err(|err| MigrationError::io(&file, err))?;
            let document: Value = serde_json::from_str(&content).map_err(|source| MigrationError::JsonParse {
                path: file.clone(),
                source,
            })?;

            let key = format!("{index}:{stem}");
            client.set_document(&key, &document).await?;
            log::info!("uploaded {name:<20} : {stem}");
            uploaded.push(key);
        }
    }

    Ok(report)
}

async fn select_indexes(client: &mut StoreClient, names: &[String]) -> Result<BTreeMap<String, String>> {
    if names.is_empty() {
        return client.list_indexes().await;
    }
    Ok(names
        .iter()
        .map(|name| (name.to_lowercase(), client.naming().index_for(name)))
        .collect())
}

/// The document's string `id` when it can be used as a file name inside the index directory.
fn document_id(document: &Value) -> Option<&str> {
    document
        .get("id")?
        .as_str()
        .filter(|id| !id.is_empty() && *id != "." && *id != "..")
        .filter(|id| !id.contains(['/', '\\', '\0']))
}

async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|err| MigrationError::io(dir, err))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|err| MigrationError::io(dir, err))? {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}
