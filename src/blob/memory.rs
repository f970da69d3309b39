use super::{expiry_from_now, normalize_path, BlobError, BlobStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-process blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(path.trim_start_matches('/').to_string(), bytes.into());
        Self {
            blobs: RwLock::new(blobs),
        }
    }

    pub async fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) -> Result<(), BlobError> {
        let key = normalize_path(path)?;
        self.blobs.write().await.insert(key, bytes.into());
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let key = normalize_path(path)?;
        self.blobs
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or(BlobError::NotFound(key))
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        let key = normalize_path(path)?;
        if !self.blobs.read().await.contains_key(&key) {
            return Err(BlobError::NotFound(key));
        }
        Ok(format!("memory://{}?expires={}", key, expiry_from_now(ttl)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
