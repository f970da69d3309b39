use super::{merge_fields, DocumentStore, StoreError};
use crate::job::{JobDocument, JobRef};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-process store. Can be told to fail upcoming updates.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<JobRef, Map<String, Value>>>,
    failing_updates: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one document.
    pub fn with_document(job: &JobRef, fields: Map<String, Value>) -> Self {
        let mut docs = HashMap::new();
        docs.insert(job.clone(), fields);
        Self {
            docs: RwLock::new(docs),
            ..Self::default()
        }
    }

    /// The next `n` calls to `update` fail with [`StoreError::Unavailable`].
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// Number of successful updates so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self, job: &JobRef) -> Option<Map<String, Value>> {
        self.docs.read().await.get(job).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, job: &JobRef) -> Result<Option<JobDocument>, StoreError> {
        Ok(self.docs.read().await.get(job).cloned().map(JobDocument::new))
    }

    async fn update(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError> {
        let injected = self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }

        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(job)
            .ok_or_else(|| StoreError::NotFound(job.to_string()))?;
        merge_fields(doc, fields);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create(&self, job: &JobRef, fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(job) {
            return Err(StoreError::AlreadyExists(job.to_string()));
        }
        let mut doc = Map::new();
        merge_fields(&mut doc, fields);
        docs.insert(job.clone(), doc);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
