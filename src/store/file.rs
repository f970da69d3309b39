use super::{check_key, merge_fields, DocumentStore, StoreError};
use crate::job::{JobDocument, JobRef};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// One pretty-printed JSON file per document at `<root>/<collection>/<id>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place. A
/// process-wide lock serialises read-modify-write cycles.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, job: &JobRef) -> Result<PathBuf, StoreError> {
        check_key(&job.collection)?;
        check_key(&job.document_id)?;
        Ok(self
            .root
            .join(&job.collection)
            .join(format!("{}.json", job.document_id)))
    }

    async fn read(&self, job: &JobRef) -> Result<Option<Map<String, Value>>, StoreError> {
        let path = self.document_path(job)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&path)(e)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                job: job.to_string(),
                source,
            })
    }

    async fn write(&self, job: &JobRef, doc: &Map<String, Value>) -> Result<(), StoreError> {
        let path = self.document_path(job)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err(parent))?;
        }
        let body = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Corrupt {
            job: job.to_string(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err(&path))?;
        debug!(path = %path.display(), "Document written");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, job: &JobRef) -> Result<Option<JobDocument>, StoreError> {
        Ok(self.read(job).await?.map(JobDocument::new))
    }

    async fn update(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self
            .read(job)
            .await?
            .ok_or_else(|| StoreError::NotFound(job.to_string()))?;
        merge_fields(&mut doc, fields);
        self.write(job, &doc).await
    }

    async fn create(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        if self.read(job).await?.is_some() {
            return Err(StoreError::AlreadyExists(job.to_string()));
        }
        let mut doc = Map::new();
        merge_fields(&mut doc, fields);
        self.write(job, &doc).await
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let job = JobRef::new("agent_job", "doc-1");

        store
            .create(&job, fields(json!({"currentStep": 1, "input": {"pdfFilePath": "a.pdf"}})))
            .await
            .unwrap();
        store
            .update(&job, fields(json!({"step1_output": {"status": "success"}})))
            .await
            .unwrap();

        let path = dir.path().join("agent_job").join("doc-1.json");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let doc = store.get(&job).await.unwrap().unwrap();
        assert_eq!(doc.current_step_number(), Some(1));
        assert!(doc.get("step1_output").is_some());
        assert!(doc.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn test_missing_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let job = JobRef::new("agent_job", "absent");
        assert!(store.get(&job).await.unwrap().is_none());
        assert!(matches!(
            store.update(&job, Map::new()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let job = JobRef::new("..", "doc");
        assert!(matches!(store.get(&job).await, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("agent_job")).unwrap();
        std::fs::write(dir.path().join("agent_job").join("bad.json"), "[1, 2]").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.get(&JobRef::new("agent_job", "bad")).await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
