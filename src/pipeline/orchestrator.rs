use super::context::PipelineContext;
use super::error::StepError;
use super::result::{CurrentStepInfo, StepRequest, StepResult};
use super::step_trait::StepExecutor;
use super::steps::{
    AcquisitionStep, DocumentGenerationStep, PartsBreakdownStep, ProductIdentificationStep,
};
use crate::job::{JobRef, StepId, CURRENT_STEP_FIELD};
use crate::progress::ProgressEvent;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs exactly one step per call. Moving on to the next step takes a
/// separate call, made once a human has confirmed the previous result.
pub struct StepOrchestrator {
    ctx: PipelineContext,
}

fn executor_for(step: StepId) -> Option<Box<dyn StepExecutor>> {
    match step {
        StepId::Acquisition => Some(Box::new(AcquisitionStep)),
        StepId::ProductIdentification => Some(Box::new(ProductIdentificationStep)),
        StepId::PartsBreakdown => Some(Box::new(PartsBreakdownStep)),
        StepId::DocumentGeneration => Some(Box::new(DocumentGenerationStep)),
        StepId::Completed => None,
    }
}

impl StepOrchestrator {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Runs step `step_number` for `job`. Errors come back as an error-tagged
    /// result, never as a panic or `Err`.
    pub async fn run_step(&self, job: &JobRef, step_number: i64, request: &StepRequest) -> StepResult {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "run_step",
            run_id = %run_id,
            collection = %job.collection,
            document_id = %job.document_id,
            step = step_number
        );
        self.run_step_inner(job, step_number, request, &run_id)
            .instrument(span)
            .await
    }

    async fn run_step_inner(
        &self,
        job: &JobRef,
        step_number: i64,
        request: &StepRequest,
        run_id: &str,
    ) -> StepResult {
        let reported = u8::try_from(step_number).unwrap_or(0);
        let Some((step, executor)) = StepId::from_number(step_number)
            .and_then(|step| executor_for(step).map(|executor| (step, executor)))
        else {
            let err = StepError::InvalidStep(step_number);
            warn!("{}", err);
            return StepResult::error(reported, run_id, err.kind(), err.to_string());
        };

        let start = Instant::now();
        info!("Running {}", step);
        self.ctx.emit(ProgressEvent::StepStarted {
            step: step.number(),
            label: step.label(),
            job: job.to_string(),
        });

        self.update_pointer(job, step).await;

        match executor.execute(&self.ctx, job, request).await {
            Ok(outcome) => {
                self.ctx.emit(ProgressEvent::StepCompleted {
                    step: step.number(),
                    duration: start.elapsed(),
                });
                let next_step = step
                    .next()
                    .filter(|next| next.is_executable())
                    .map(StepId::number);
                debug!(?next_step, "{} complete", step);
                StepResult::success(step.number(), run_id, outcome.message, outcome.output, next_step)
            }
            Err(err) => {
                warn!(kind = err.kind(), "{} failed: {}", step, err);
                self.ctx.emit(ProgressEvent::StepFailed {
                    step: step.number(),
                    error: err.to_string(),
                });
                StepResult::error(step.number(), run_id, err.kind(), err.to_string())
            }
        }
    }

    /// Marks `step` as in progress before any work starts. A failed write is
    /// only a warning.
    async fn update_pointer(&self, job: &JobRef, step: StepId) {
        let mut fields = Map::new();
        fields.insert(CURRENT_STEP_FIELD.to_string(), Value::from(step.number()));
        let persisted = match self.ctx.store.update(job, fields).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to set {} = {}: {}", CURRENT_STEP_FIELD, step.number(), e);
                false
            }
        };
        self.ctx.emit(ProgressEvent::PointerUpdated {
            step: step.number(),
            persisted,
        });
    }

    pub async fn current_step(&self, job: &JobRef) -> Result<CurrentStepInfo, StepError> {
        let document = self.ctx.load(job).await?;
        Ok(CurrentStepInfo {
            current_step: document.current_step_number(),
            label: document.current_step().map(|s| s.label().to_string()),
            all_process_completed: document.all_process_completed(),
        })
    }

    /// A persisted step output, as stored.
    pub async fn step_output(&self, job: &JobRef, step_number: i64) -> Result<Value, StepError> {
        let step = StepId::from_number(step_number)
            .filter(|s| s.is_executable())
            .ok_or(StepError::InvalidStep(step_number))?;
        let document = self.ctx.load(job).await?;
        document
            .output_value(step)
            .cloned()
            .ok_or_else(|| StepError::MissingPredecessor {
                key: step.output_key().unwrap_or_default(),
                available: document.available_keys(),
            })
    }
}
