use super::{expiry_from_now, normalize_path, BlobError, BlobStore};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Serves blobs from a local directory. Signed URLs are `file://` URLs with
/// an expiry and a SHA-256 signature over path, expiry and the signing key.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    signing_key: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, signing_key: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            signing_key: signing_key.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf), BlobError> {
        let key = normalize_path(path)?;
        let full = self.root.join(&key);
        Ok((key, full))
    }

    pub fn signature(&self, key: &str, expires: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_key.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Checks a signature produced by [`BlobStore::signed_url`].
    pub fn verify(&self, path: &str, expires: u64, signature: &str) -> bool {
        let Ok(key) = normalize_path(path) else {
            return false;
        };
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        expires >= now && self.signature(&key, expires) == signature
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let (key, full) = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                BlobError::NotFound(key)
            } else {
                BlobError::Io { path: key, source }
            }
        })
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        let (key, full) = self.resolve(path)?;
        let expires = expiry_from_now(ttl);
        Ok(format!(
            "file://{}?expires={}&signature={}",
            full.display(),
            expires,
            self.signature(&key, expires)
        ))
    }

    fn name(&self) -> &str {
        "local"
    }
}
