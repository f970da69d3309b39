//! Long-lived dependencies shared by every step executor

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::blob::BlobStore;
use crate::job::{JobDocument, JobRef, StepId};
use crate::llm::{ExchangeLog, LLMClient};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::render::RenderClient;
use crate::store::DocumentStore;

use super::config::PipelineConfig;
use super::error::StepError;

/// Collaborators injected into the executors. Nothing here is global.
pub struct PipelineContext {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub llm_client: Arc<dyn LLMClient>,
    /// Step 4 fails with `NotConfigured` when absent.
    pub render_client: Option<Arc<dyn RenderClient>>,
    pub exchange_log: ExchangeLog,
    pub progress: Arc<dyn ProgressHandler>,
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        llm_client: Arc<dyn LLMClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            llm_client,
            render_client: None,
            exchange_log: ExchangeLog::disabled(),
            progress: Arc::new(NoOpHandler),
            config,
        }
    }

    pub fn with_render_client(mut self, render_client: Arc<dyn RenderClient>) -> Self {
        self.render_client = Some(render_client);
        self
    }

    pub fn with_exchange_log(mut self, exchange_log: ExchangeLog) -> Self {
        self.exchange_log = exchange_log;
        self
    }

    pub fn with_progress_handler(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(&event);
    }

    /// Reads the job document fresh; it is never cached across calls.
    pub async fn load(&self, job: &JobRef) -> Result<JobDocument, StepError> {
        self.store
            .get(job)
            .await
            .map_err(StepError::Store)?
            .ok_or_else(|| StepError::DocumentNotFound(job.to_string()))
    }

    /// Writes one step's work product under its `step{N}_output` key.
    pub async fn persist_output<T: Serialize>(
        &self,
        job: &JobRef,
        step: StepId,
        output: &T,
    ) -> Result<Value, StepError> {
        let key = step
            .output_key()
            .ok_or(StepError::InvalidStep(i64::from(step.number())))?;
        let value = serde_json::to_value(output).map_err(|e| StepError::MalformedOutput {
            key: key.clone(),
            message: e.to_string(),
        })?;

        let mut fields = Map::new();
        fields.insert(key.clone(), value.clone());
        self.persist_fields(job, &key, fields).await?;
        debug!(job = %job, key = %key, "Step output persisted");
        Ok(value)
    }

    pub async fn persist_fields(
        &self,
        job: &JobRef,
        label: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StepError> {
        self.store
            .update(job, fields)
            .await
            .map_err(|source| StepError::Persistence {
                key: label.to_string(),
                source,
            })
    }
}
