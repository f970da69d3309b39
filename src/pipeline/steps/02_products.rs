use super::llm_helper::{instructions_block, query_llm_with_logging, report_fallback};
use crate::analysis::AnalysisData;
use crate::job::table::products_csv;
use crate::job::{JobRef, OutputStamp, ProductSummary, Step1Output, Step2Output, StepId};
use crate::parser::parse_products;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StepError;
use crate::pipeline::result::StepRequest;
use crate::pipeline::step_trait::{StepExecutor, StepOutcome};
use async_trait::async_trait;
use tracing::info;

const PHASE: &str = "product_identification";

/// Extracts the production list from the step 1 analysis with the LLM.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductIdentificationStep;

fn build_prompt(analysis: &AnalysisData, download_url: Option<&str>, instructions: Option<&str>) -> String {
    format!(
        r#"Extract the list of products to be manufactured from this CAD blueprint analysis.

Analysis:
{}

Blueprint PDF: {}

Respond with JSON:
{{
  "products": [
    {{"name": "product name or type code", "description": "specification and purpose", "cnt": <integer quantity>}}
  ]
}}

Rules:
- Always return at least one product
- Quantities are written with units such as 台, 個, 枚, セット or 式
- "Type B-2 4台、棚板各2枚" means 4 of Type B-2 and 8 shelf boards (棚板)
- Keep type codes exactly as written (e.g. "Type C-2")
- Use 1 when no quantity is stated
- Merge duplicates
{}
"#,
        analysis.combined_text(),
        download_url.unwrap_or("unavailable"),
        instructions_block(instructions)
    )
}

#[async_trait]
impl StepExecutor for ProductIdentificationStep {
    fn step(&self) -> StepId {
        StepId::ProductIdentification
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        job: &JobRef,
        request: &StepRequest,
    ) -> Result<StepOutcome, StepError> {
        let document = ctx.load(job).await?;
        let step1: Step1Output = document.output(StepId::Acquisition)?;
        let analysis = step1.analysis_json.analysis_data;

        let prompt = build_prompt(&analysis, document.signed_url(), request.instructions());
        let response = query_llm_with_logging(ctx, prompt, PHASE).await?;

        let outcome = parse_products(&response, &analysis);
        let (items, method, fallback_reason) = outcome.into_parts();
        if let Some(reason) = &fallback_reason {
            report_fallback(ctx, PHASE, method, reason);
        }

        let summary = ProductSummary::from_items(&items);
        info!(
            products = summary.total_product_types,
            quantity = summary.total_quantity,
            method = %method,
            "Production list extracted"
        );

        let description = format!(
            "製品リストを抽出しました（{}種類、合計{}個、抽出方法: {}）",
            summary.total_product_types, summary.total_quantity, method
        );
        let output = Step2Output {
            formatted_table: products_csv(&items),
            production_list: items,
            description: description.clone(),
            summary,
            extraction_method: method,
            fallback_reason,
            user_instructions: request.instructions().map(str::to_string),
            stamp: OutputStamp::success(),
        };
        let value = ctx.persist_output(job, self.step(), &output).await?;

        Ok(StepOutcome {
            output: value,
            message: description,
        })
    }
}
