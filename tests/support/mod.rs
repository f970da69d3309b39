//! Shared fixtures: an orchestrator over in-memory stores, a scripted LLM and
//! a scripted rendering service.
#![allow(dead_code)]

use blueprint_estimator::blob::MemoryBlobStore;
use blueprint_estimator::job::{new_job_fields, JobInput, JobRef};
use blueprint_estimator::llm::{MockLLMClient, MockResponse};
use blueprint_estimator::pipeline::{
    PipelineConfig, PipelineContext, StepOrchestrator, StepRequest, StepResult,
};
use blueprint_estimator::render::MockRenderClient;
use blueprint_estimator::store::MemoryDocumentStore;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const PDF_PATH: &str = "blueprints/shelf-unit.pdf";
pub const ORGANIZATION: &str = "org-42";

pub fn get_estimator_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("blueprint-estimator")
}

/// A two-page PDF: one `/Pages` tree node and two `/Page` objects.
pub fn pdf_bytes() -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n1 0 obj << /Type /Pages /Count 2 >> endobj\n".to_vec();
    bytes.extend_from_slice(b"2 0 obj << /Type /Page >> endobj\n3 0 obj << /Type /Page >> endobj\n");
    bytes.extend_from_slice("CAD 図面 寸法".as_bytes());
    bytes
}

/// Pre-analysis whose text carries the call-outs `Type C-2 10台`,
/// `Type B-2 4台` and `棚板 8枚`.
pub fn analysis_json() -> Value {
    json!({
        "summary": "店舗用陳列棚の製作図",
        "annotation": "Type C-2 ロータイプ 10台\nType B-2 ハイタイプ 4台\n棚板 合計 8枚",
        "pages": [
            {"pageCount": 1, "summary": "正面図・側面図", "content": "スチールフレームにMDF天板"},
            {"pageCount": 2, "summary": "部品詳細", "content": "棚受けブラケットはステンレス"}
        ]
    })
}

pub fn products_response() -> String {
    "```json\n{\"products\": [{\"name\": \"Type C-2\", \"description\": \"ロータイプ陳列棚\", \"quantity\": 10}]}\n```"
        .to_string()
}

/// One product with a zero-priced frame (corrected to 1500) and screws
/// priced within tolerance (kept at 90).
pub fn parts_response() -> String {
    json!({
        "parts_breakdown": [{
            "product_name": "Type C-2",
            "product_quantity": 10,
            "parts": [
                {
                    "part_name": "フレーム",
                    "part_description": "本体枠",
                    "material": "スチール",
                    "category": "金属部品",
                    "unit_quantity": 2,
                    "total_quantity": 20,
                    "estimated_unit_price": 0,
                    "total_price": 999
                },
                {
                    "part_name": "ネジ",
                    "part_description": "M4",
                    "material": "スチール",
                    "category": "金属部品",
                    "unit_quantity": 8,
                    "total_quantity": 80,
                    "estimated_unit_price": 90,
                    "total_price": 1
                }
            ]
        }]
    })
    .to_string()
}

pub struct Fixture {
    pub job: JobRef,
    pub store: Arc<MemoryDocumentStore>,
    pub llm: Arc<MockLLMClient>,
    pub render: Arc<MockRenderClient>,
    pub orchestrator: StepOrchestrator,
}

impl Fixture {
    /// A fresh job at step 1 with the blueprint in the blob store.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        let job = JobRef::in_default_collection("job-1");
        let input = JobInput::new(PDF_PATH, analysis_json()).with_organization(ORGANIZATION);
        let fields = new_job_fields(&input).unwrap();
        Self::with_fields(job, fields, responses, true)
    }

    pub fn with_fields(
        job: JobRef,
        fields: Map<String, Value>,
        responses: Vec<MockResponse>,
        with_render: bool,
    ) -> Self {
        let store = Arc::new(MemoryDocumentStore::with_document(&job, fields));
        let llm = Arc::new(MockLLMClient::with_responses(responses));
        let render = Arc::new(MockRenderClient::new());

        let mut ctx = PipelineContext::new(
            store.clone(),
            Arc::new(MemoryBlobStore::with_blob(PDF_PATH, pdf_bytes())),
            llm.clone(),
            PipelineConfig::default(),
        );
        if with_render {
            ctx = ctx.with_render_client(render.clone());
        }

        Self {
            job,
            store,
            llm,
            render,
            orchestrator: StepOrchestrator::new(ctx),
        }
    }

    pub async fn run(&self, step: i64) -> StepResult {
        self.orchestrator
            .run_step(&self.job, step, &StepRequest::new())
            .await
    }

    pub async fn run_with(&self, step: i64, request: &StepRequest) -> StepResult {
        self.orchestrator.run_step(&self.job, step, request).await
    }

    pub async fn document(&self) -> Map<String, Value> {
        self.store.snapshot(&self.job).await.unwrap()
    }
}

/// A step output with its write timestamp removed.
pub fn without_timestamp(output: &Value) -> Value {
    let mut output = output.clone();
    if let Some(map) = output.as_object_mut() {
        map.remove("timestamp");
    }
    output
}
