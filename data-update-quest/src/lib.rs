//! data-update-quest core library.
//!
//! Generates `jq` migration scripts from the differences between two versions of
//! an OpenAPI 3.x / Swagger 2.x model, and moves JSON documents in and out of a
//! RediSearch/RedisJSON store.
//!
//! # Example
//! ```ignore
//! use data_update_quest::{TemplateGenerator, save_templates};
//!
//! let generator = TemplateGenerator::from_files(
//!     "api-v1.yaml".as_ref(), "Organization",
//!     "api-v2.yaml".as_ref(), "Organization",
//! )?;
//! let templates = generator.generate(chrono::Utc::now())?;
//! save_templates(&templates, "migration".as_ref())?;
//! ```

pub mod differ;
pub mod errors;
pub mod generator;
pub mod loader;
pub mod schema;
pub mod store;

pub use differ::{Addition, ChangeSet, FieldPath, Removal, Rename, TypeChange, compare_schemas, detect_renames};
pub use errors::{ClassificationIssue, MigrationError, Result};
pub use generator::{MigrationSubject, MigrationTemplates, TemplateGenerator, render_readme, render_script, save_templates};
pub use loader::{load_document, write_artifact};
pub use schema::{SchemaDocument, extract_schema};
pub use store::{IndexNaming, StoreClient};
