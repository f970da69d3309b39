//! Job document persistence.
//!
//! Documents are flat JSON objects addressed by collection and id. Updates
//! merge top-level fields and stamp `updated_at`.

pub mod file;
pub mod memory;

use crate::job::{JobDocument, JobRef, UPDATED_AT_FIELD};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("document {0} already exists")]
    AlreadyExists(String),

    #[error("invalid document key '{0}'")]
    InvalidKey(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {job} is not a JSON object: {source}")]
    Corrupt {
        job: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document; `None` when it does not exist.
    async fn get(&self, job: &JobRef) -> Result<Option<JobDocument>, StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Creates a document; fails if one already exists.
    async fn create(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError>;

    fn name(&self) -> &str;
}

pub(crate) fn merge_fields(target: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        target.insert(key, value);
    }
    target.insert(
        UPDATED_AT_FIELD.to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
}

/// Rejects keys that could escape a collection directory.
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if bad {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}
