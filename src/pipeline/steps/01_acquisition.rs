use crate::analysis::{describe, sniff, AnalysisData};
use crate::job::outputs::{AnalysisJson, PdfDownloadTest};
use crate::job::{JobRef, OutputStamp, Step1Output, StepId, INPUT_FIELD, SIGNED_URL_FIELD};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StepError;
use crate::pipeline::result::StepRequest;
use crate::pipeline::step_trait::{StepExecutor, StepOutcome};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Signs and fetches the blueprint, sniffs it, and describes the analysis.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcquisitionStep;

fn analysis_field() -> String {
    format!("{}.preAnalysisJson", INPUT_FIELD)
}

fn decode_analysis(raw: &Value, available: Vec<String>) -> Result<AnalysisData, StepError> {
    match raw {
        Value::Null => Err(StepError::MissingInput {
            field: analysis_field(),
            available,
        }),
        Value::String(s) if s.trim().is_empty() => Err(StepError::MissingInput {
            field: analysis_field(),
            available,
        }),
        other => AnalysisData::from_value(other).map_err(|e| StepError::MalformedOutput {
            key: analysis_field(),
            message: e.to_string(),
        }),
    }
}

#[async_trait]
impl StepExecutor for AcquisitionStep {
    fn step(&self) -> StepId {
        StepId::Acquisition
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        job: &JobRef,
        _request: &StepRequest,
    ) -> Result<StepOutcome, StepError> {
        let document = ctx.load(job).await?;
        let input = document.input()?;
        let analysis = decode_analysis(&input.pre_analysis_json, document.available_keys())?;
        let path = input.pdf_file_path.as_str();

        let signed_url = ctx.blobs.signed_url(path, ctx.config.signed_url_ttl).await?;
        debug!(path, ttl_secs = ctx.config.signed_url_ttl.as_secs(), "Signed URL issued");

        let bytes = ctx.blobs.download(path).await?;
        let sniffed = sniff(&bytes, path);
        info!(
            path,
            bytes = bytes.len(),
            format = %sniffed.pdf_info.detected_format,
            pages = sniffed.validation.estimated_pages,
            "Blueprint fetched"
        );

        let description = describe(&analysis);
        let output = Step1Output {
            pdf_download_test: PdfDownloadTest {
                pdf_file_path: input.pdf_file_path.clone(),
                pdf_info: sniffed.pdf_info,
                validation_results: sniffed.validation,
                analysis_comment: sniffed.comment,
                keywords_found: sniffed.keywords_found,
            },
            analysis_json: AnalysisJson {
                analysis_data: analysis,
            },
            description: description.description,
            production_info: description.production_info,
            stamp: OutputStamp::success(),
        };

        let key = self.step().output_key().unwrap_or_default();
        let value = serde_json::to_value(&output).map_err(|e| StepError::MalformedOutput {
            key: key.clone(),
            message: e.to_string(),
        })?;
        let mut fields = Map::new();
        fields.insert(key.clone(), value.clone());
        fields.insert(SIGNED_URL_FIELD.to_string(), Value::String(signed_url));
        ctx.persist_fields(job, &key, fields).await?;

        let message = format!(
            "図面ファイルを取得しました（{}、{}MB、推定{}ページ）",
            output.pdf_download_test.pdf_info.detected_format,
            output.pdf_download_test.pdf_info.file_size_mb,
            output.pdf_download_test.validation_results.estimated_pages
        );
        Ok(StepOutcome {
            output: value,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::job::{new_job_fields, JobInput};
    use crate::llm::MockLLMClient;
    use crate::pipeline::PipelineConfig;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    fn pdf_bytes() -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n1 0 obj << /Type /Pages >> endobj\n".to_vec();
        bytes.extend_from_slice(b"2 0 obj << /Type /Page >> endobj\n3 0 obj << /Type /Page >> endobj\n");
        bytes.extend_from_slice("図面 CAD".as_bytes());
        bytes
    }

    async fn run(input: JobInput, blobs: MemoryBlobStore) -> (Result<StepOutcome, StepError>, Arc<MemoryDocumentStore>, JobRef) {
        let job = JobRef::new("agent_job", "doc-1");
        let store = Arc::new(MemoryDocumentStore::with_document(
            &job,
            new_job_fields(&input).unwrap(),
        ));
        let ctx = PipelineContext::new(
            store.clone(),
            Arc::new(blobs),
            Arc::new(MockLLMClient::new()),
            PipelineConfig::default(),
        );
        let result = AcquisitionStep.execute(&ctx, &job, &StepRequest::new()).await;
        (result, store, job)
    }

    #[tokio::test]
    async fn test_acquisition_persists_output_and_url() {
        let input = JobInput::new(
            "blueprints/shelf.pdf",
            json!({"summary": "什器図面", "annotation": "Type C-2 10台", "pages": [{"pageCount": 1, "summary": "正面図"}]}),
        );
        let blobs = MemoryBlobStore::with_blob("blueprints/shelf.pdf", pdf_bytes());
        let (result, store, job) = run(input, blobs).await;

        let outcome = result.unwrap();
        assert_eq!(outcome.output["status"], "success");
        assert_eq!(outcome.output["pdf_download_test"]["validation_results"]["estimated_pages"], 2);
        assert_eq!(outcome.output["pdf_download_test"]["pdf_info"]["is_valid_pdf"], true);
        assert_eq!(outcome.output["production_info"], json!(["Type C-2: 10台"]));

        let doc = store.snapshot(&job).await.unwrap();
        assert!(doc["tmpPdfBlueprintDlUrl"].as_str().unwrap().starts_with("memory://"));
        assert_eq!(doc["step1_output"], outcome.output);
    }

    #[tokio::test]
    async fn test_missing_blob_is_error() {
        let input = JobInput::new("blueprints/missing.pdf", json!({"summary": "x"}));
        let (result, store, job) = run(input, MemoryBlobStore::new()).await;
        assert!(matches!(result, Err(StepError::Blob(_))));
        assert!(store.snapshot(&job).await.unwrap().get("step1_output").is_none());
    }

    #[tokio::test]
    async fn test_missing_analysis_is_missing_input() {
        let input = JobInput::new("blueprints/shelf.pdf", Value::Null);
        let blobs = MemoryBlobStore::with_blob("blueprints/shelf.pdf", pdf_bytes());
        let (result, _, _) = run(input, blobs).await;
        assert!(matches!(result, Err(StepError::MissingInput { ref field, .. }) if field == "input.preAnalysisJson"));
    }

    #[tokio::test]
    async fn test_analysis_json_string_is_decoded() {
        let input = JobInput::new("a.pdf", json!("{\"summary\": \"文字列で渡された解析\"}"));
        let blobs = MemoryBlobStore::with_blob("a.pdf", pdf_bytes());
        let (result, _, _) = run(input, blobs).await;
        let outcome = result.unwrap();
        assert_eq!(
            outcome.output["analysis_json"]["analysis_data"]["summary"],
            "文字列で渡された解析"
        );
    }
}
