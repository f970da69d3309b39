use super::context::PipelineContext;
use super::error::StepError;
use super::result::StepRequest;
use crate::job::{JobRef, StepId};
use async_trait::async_trait;
use serde_json::Value;

/// What a successful executor hands back to the orchestrator.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The output exactly as persisted.
    pub output: Value,
    pub message: String,
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    fn step(&self) -> StepId;

    async fn execute(
        &self,
        ctx: &PipelineContext,
        job: &JobRef,
        request: &StepRequest,
    ) -> Result<StepOutcome, StepError>;
}
