//! Blob storage for blueprint files: download by path and time-limited URLs.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob '{0}' not found")]
    NotFound(String),

    #[error("invalid blob path '{0}'")]
    InvalidPath(String),

    #[error("I/O error reading blob '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// A URL granting read access to `path` until `ttl` has elapsed.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError>;

    fn name(&self) -> &str;
}

/// Normalises a blob path: strips leading slashes, rejects `..` and empty
/// components.
pub fn normalize_path(path: &str) -> Result<String, BlobError> {
    let trimmed = path.trim().trim_start_matches('/');
    let components: Vec<&str> = trimmed.split('/').collect();
    let invalid = trimmed.is_empty()
        || components
            .iter()
            .any(|c| c.is_empty() || *c == "." || *c == ".." || c.contains('\\'));
    if invalid {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    Ok(components.join("/"))
}

/// Unix timestamp `ttl` from now.
pub(crate) fn expiry_from_now(ttl: Duration) -> u64 {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    now.saturating_add(ttl.as_secs())
}
