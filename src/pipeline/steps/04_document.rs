use crate::job::{JobRef, OutputStamp, Step3Output, Step4Output, StepId, COMPLETED_FIELD, CURRENT_STEP_FIELD};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StepError;
use crate::pipeline::result::StepRequest;
use crate::pipeline::step_trait::{StepExecutor, StepOutcome};
use crate::progress::ProgressEvent;
use crate::render::EstimateRequest;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Sends the estimate to the rendering service and closes the job.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentGenerationStep;

fn organization(document_org: Option<&str>, request: &StepRequest) -> Result<String, StepError> {
    request
        .organization_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(document_org)
        .map(str::to_string)
        .ok_or(StepError::MissingOrganization)
}

#[async_trait]
impl StepExecutor for DocumentGenerationStep {
    fn step(&self) -> StepId {
        StepId::DocumentGeneration
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        job: &JobRef,
        request: &StepRequest,
    ) -> Result<StepOutcome, StepError> {
        let document = ctx.load(job).await?;
        let step3: Step3Output = document.output(StepId::PartsBreakdown)?;
        let organization_id = organization(document.organization_id(), request)?;
        let render = ctx
            .render_client
            .as_ref()
            .ok_or_else(|| StepError::NotConfigured("rendering service".to_string()))?;

        let instructions = request
            .instructions()
            .map(str::to_string)
            .or(step3.user_instructions);
        let estimate = EstimateRequest::new(
            step3.parts_breakdown,
            ctx.config.bucket_name.as_str(),
            &organization_id,
            &job.document_id,
        )
        .with_user_instructions(instructions);
        let api_request_body =
            serde_json::to_value(&estimate).map_err(|e| StepError::MalformedOutput {
                key: "api_request_body".to_string(),
                message: e.to_string(),
            })?;

        ctx.emit(ProgressEvent::RenderDispatched {
            products: estimate.estimate_data.products.len(),
            total_price: estimate.estimate_data.total_price,
        });
        let api_result = render.generate(&estimate).await?;
        info!(
            renderer = render.name(),
            files = api_result.file_urls.len(),
            total_price = estimate.estimate_data.total_price,
            "Estimate documents generated"
        );

        let description = format!(
            "見積書と部品明細書を生成しました（見積総額{}円、ファイル{}件）",
            estimate.estimate_data.total_price,
            api_result.file_urls.len()
        );
        let output = Step4Output {
            api_request_body,
            api_result,
            description: description.clone(),
            pdf_file_is_exported: true,
            stamp: OutputStamp::success(),
        };
        let value = ctx.persist_output(job, self.step(), &output).await?;

        let mut completion = Map::new();
        completion.insert(
            CURRENT_STEP_FIELD.to_string(),
            Value::from(StepId::Completed.number()),
        );
        completion.insert(COMPLETED_FIELD.to_string(), Value::Bool(true));
        if let Err(e) = ctx.persist_fields(job, COMPLETED_FIELD, completion).await {
            warn!(job = %job, "Could not mark job as completed: {}", e);
        }

        Ok(StepOutcome {
            output: value,
            message: description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_organization_wins() {
        let request = StepRequest::new().with_organization("org-req");
        assert_eq!(organization(Some("org-doc"), &request).unwrap(), "org-req");
    }

    #[test]
    fn test_document_organization_used_as_fallback() {
        let request = StepRequest::new().with_organization("  ");
        assert_eq!(organization(Some("org-doc"), &request).unwrap(), "org-doc");
        assert!(matches!(
            organization(None, &StepRequest::new()),
            Err(StepError::MissingOrganization)
        ));
    }
}
