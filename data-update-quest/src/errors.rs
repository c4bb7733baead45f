use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type returned by the schema migration pipeline and the store client.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The requested model is absent from both `components.schemas` and `definitions`.
    #[error("model '{model}' not found in {document}")]
    ModelNotFound { model: String, document: String },

    /// A `$ref` uses an address scheme other than `#/components/schemas/` or `#/definitions/`.
    #[error("unsupported reference format: {reference}")]
    UnsupportedReferenceFormat { reference: String },

    /// A `$ref` in a supported format points to a schema that does not exist.
    #[error("reference target not found: {reference}")]
    DanglingReference { reference: String },

    /// A root schema could not be classified at all.
    #[error("classification failed: {message}")]
    Classification { message: String },

    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `.json` document could not be parsed.
    #[error("failed to parse JSON in {}: {source}", path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A YAML document could not be parsed.
    #[error("failed to parse YAML in {}: {source}", path.display())]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The store returned something the client could not interpret.
    #[error("{message}")]
    Store { message: Cow<'static, str> },
}

impl MigrationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn store(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// A raw diff entry the classifier could not map to a field and skipped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ClassificationIssue {
    /// Raw path in bracket notation, e.g. `root['properties'][0]`.
    pub path: String,
    pub reason: String,
}

impl ClassificationIssue {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;
