use crate::llm::{ChatMessage, LLMRequest};
use crate::parser::ExtractionMethod;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StepError;
use crate::progress::ProgressEvent;
use std::time::Instant;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are an expert in reading CAD blueprints for store fixtures and \
estimating their manufacturing cost. Answer with a single JSON object and nothing else. \
Write every name and description in Japanese.";

/// Sends one prompt and returns the raw completion text. Decoding is left to
/// the parser, which never fails.
pub async fn query_llm_with_logging(
    ctx: &PipelineContext,
    prompt: String,
    phase: &'static str,
) -> Result<String, StepError> {
    let start = Instant::now();
    ctx.emit(ProgressEvent::LlmRequestStarted { phase });

    let request = LLMRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(prompt.clone()),
    ])
    .with_temperature(ctx.config.temperature)
    .with_max_tokens(ctx.config.max_tokens);

    let response = ctx.llm_client.chat(request).await.map_err(|e| {
        warn!(phase, client = ctx.llm_client.name(), "LLM call failed: {}", e);
        StepError::Llm(e)
    })?;

    let elapsed = start.elapsed();
    ctx.emit(ProgressEvent::LlmResponseReceived {
        phase,
        response_time: elapsed,
    });
    ctx.exchange_log.record(
        phase,
        ctx.llm_client.model_info().as_deref(),
        &prompt,
        &response.content,
        elapsed.as_millis() as u64,
    );
    debug!(phase, chars = response.content.len(), "LLM response received");

    Ok(response.content)
}

pub fn report_fallback(
    ctx: &PipelineContext,
    phase: &'static str,
    method: ExtractionMethod,
    reason: &str,
) {
    ctx.emit(ProgressEvent::FallbackUsed {
        phase,
        method: method.to_string(),
        reason: reason.to_string(),
    });
}

/// Trailing prompt block for optional user instructions.
pub fn instructions_block(instructions: Option<&str>) -> String {
    format!(
        "User instructions (take priority over the rules above): {}",
        instructions.unwrap_or("none")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::llm::{BackendError, MockLLMClient, MockResponse};
    use crate::pipeline::PipelineConfig;
    use crate::store::MemoryDocumentStore;
    use std::sync::Arc;

    fn context(llm: Arc<MockLLMClient>) -> PipelineContext {
        PipelineContext::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryBlobStore::new()),
            llm,
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_returns_raw_text() {
        let llm = Arc::new(MockLLMClient::with_responses([MockResponse::text("not json")]));
        let ctx = context(llm.clone());
        let text = query_llm_with_logging(&ctx, "prompt".to_string(), "product_identification")
            .await
            .unwrap();
        assert_eq!(text, "not json");
        assert_eq!(llm.prompts(), vec!["prompt".to_string()]);
    }

    #[tokio::test]
    async fn test_backend_error_is_step_error() {
        let llm = Arc::new(MockLLMClient::with_responses([MockResponse::error(
            BackendError::TimeoutError { seconds: 300 },
        )]));
        let ctx = context(llm);
        let err = query_llm_with_logging(&ctx, "prompt".to_string(), "parts_breakdown")
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Llm(BackendError::TimeoutError { seconds: 300 })));
    }

    #[test]
    fn test_instructions_block() {
        assert!(instructions_block(None).ends_with("none"));
        assert!(instructions_block(Some("税込")).ends_with("税込"));
    }
}
