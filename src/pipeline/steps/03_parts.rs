use super::llm_helper::{instructions_block, query_llm_with_logging, report_fallback};
use crate::analysis::AnalysisData;
use crate::job::table::parts_markdown;
use crate::job::{
    JobRef, OutputStamp, PartsSummary, ProductionItem, Step1Output, Step2Output, Step3Output, StepId,
};
use crate::parser::{parse_parts, ParseOutcome};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StepError;
use crate::pipeline::result::StepRequest;
use crate::pipeline::step_trait::{StepExecutor, StepOutcome};
use crate::pricing::{correct_breakdown, recompute_totals, CorrectionStats, UnitPriceEstimator};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

const PHASE: &str = "parts_breakdown";

/// Breaks every product into priced parts, then corrects outlying prices.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartsBreakdownStep;

fn build_prompt(
    products: &[ProductionItem],
    analysis: &AnalysisData,
    download_url: Option<&str>,
    instructions: Option<&str>,
) -> String {
    let product_list: Vec<_> = products
        .iter()
        .map(|p| json!({"name": p.name, "description": p.description, "quantity": p.quantity}))
        .collect();

    format!(
        r#"Break each product down into the parts needed to manufacture it and estimate their prices in JPY.

Products:
{}

Analysis:
{}

Blueprint PDF: {}

Respond with JSON:
{{
  "parts_breakdown": [
    {{
      "product_name": "name from the product list",
      "product_quantity": <integer>,
      "parts": [
        {{
          "part_name": "part name",
          "part_description": "details",
          "unit_quantity": <parts per product>,
          "total_quantity": <unit_quantity * product_quantity>,
          "material": "material",
          "category": "金属部品" | "樹脂部品" | "電子部品" | "ガラス・アクリル" | "その他",
          "estimated_unit_price": <integer JPY>,
          "total_price": <integer JPY>
        }}
      ]
    }}
  ]
}}

Rules:
- Cover every product in the list
- Metal parts: frames, posts, brackets, screws, bolts. Resin parts: panels, covers, shelf boards
- Typical unit prices: screws 50-120, brackets 300-1000, frames 800-2500, panels 1200-4500, shelf boards 1500-5500, LEDs 500-2000, glass or acrylic 1500-8000
- Consider sizes and materials readable from the blueprint
{}
"#,
        serde_json::to_string_pretty(&product_list).unwrap_or_else(|_| "[]".to_string()),
        analysis.combined_text(),
        download_url.unwrap_or("unavailable"),
        instructions_block(instructions)
    )
}

#[async_trait]
impl StepExecutor for PartsBreakdownStep {
    fn step(&self) -> StepId {
        StepId::PartsBreakdown
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        job: &JobRef,
        request: &StepRequest,
    ) -> Result<StepOutcome, StepError> {
        let document = ctx.load(job).await?;
        let step2: Step2Output = document.output(StepId::ProductIdentification)?;
        let step1: Step1Output = document.output(StepId::Acquisition)?;
        let analysis = step1.analysis_json.analysis_data;
        let products = step2.production_list;
        let estimator = UnitPriceEstimator::default();

        let prompt = build_prompt(&products, &analysis, document.signed_url(), request.instructions());
        let response = query_llm_with_logging(ctx, prompt, PHASE).await?;

        let outcome = parse_parts(&response, &products, &analysis, &estimator);
        let method = outcome.method();
        let (entries, correction, fallback_reason) = match outcome {
            ParseOutcome::Parsed(mut entries) => {
                let stats = correct_breakdown(&mut entries, &estimator);
                (entries, stats, None)
            }
            ParseOutcome::Fallback {
                items: mut entries,
                fallback,
            } => {
                recompute_totals(&mut entries);
                report_fallback(ctx, PHASE, fallback.method, &fallback.reason);
                (entries, CorrectionStats::default(), Some(fallback.reason))
            }
        };

        let summary = PartsSummary::from_entries(&entries);
        info!(
            products = summary.total_products,
            parts = summary.total_parts_types,
            total_cost = summary.total_estimated_cost,
            corrected = correction.corrected,
            method = %method,
            "Parts breakdown complete"
        );

        let description = format!(
            "部品分解を完了しました（製品{}種類、部品{}種類、推定合計{}円、DB補正{}件）",
            summary.total_products,
            summary.total_parts_types,
            summary.total_estimated_cost,
            correction.corrected
        );
        let output = Step3Output {
            formatted_table: parts_markdown(&entries),
            parts_breakdown: entries,
            description: description.clone(),
            summary,
            correction,
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
