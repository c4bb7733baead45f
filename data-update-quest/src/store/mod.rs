//! Redis document store access.
//!
//! This module provides:
//! - `StoreClient` - list search indexes, fetch every document of an index, set documents
//! - `IndexNaming` - short collection names to index names
//! - `dump` / `upload` - copy documents to and from a directory tree

mod client;
mod naming;
mod transfer;

pub use client::{SEARCH_PAGE_SIZE, StoreClient, StoredDocument};
pub use naming::{DEFAULT_INDEX_PREFIX, IndexNaming};
pub use transfer::{DumpReport, UploadReport, dump, upload};
