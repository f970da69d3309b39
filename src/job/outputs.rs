//! Work products persisted under `step{N}_output`.

use super::model::{saturating_sum, PartsBreakdownEntry, ProductionItem};
use crate::analysis::{AnalysisData, PdfInfo, ValidationResults};
use crate::parser::ExtractionMethod;
use crate::pricing::CorrectionStats;
use crate::render::RenderResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";

/// Status and write time shared by every step output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStamp {
    pub status: String,
    pub timestamp: String,
}

impl OutputStamp {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDownloadTest {
    pub pdf_file_path: String,
    pub pdf_info: PdfInfo,
    pub validation_results: ValidationResults,
    pub analysis_comment: String,
    pub keywords_found: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJson {
    pub analysis_data: AnalysisData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step1Output {
    pub pdf_download_test: PdfDownloadTest,
    pub analysis_json: AnalysisJson,
    pub description: String,
    pub production_info: Vec<String>,
    #[serde(flatten)]
    pub stamp: OutputStamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub total_product_types: usize,
    pub total_quantity: u64,
}

impl ProductSummary {
    pub fn from_items(items: &[ProductionItem]) -> Self {
        Self {
            total_product_types: items.len(),
            total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step2Output {
    pub production_list: Vec<ProductionItem>,
    pub formatted_table: String,
    pub description: String,
    pub summary: ProductSummary,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
    #[serde(flatten)]
    pub stamp: OutputStamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartsSummary {
    pub total_products: usize,
    pub total_parts_types: usize,
    pub total_parts_quantity: i64,
    pub total_estimated_cost: i64,
}

impl PartsSummary {
    pub fn from_entries(entries: &[PartsBreakdownEntry]) -> Self {
        let parts = || entries.iter().flat_map(|e| e.parts.iter());
        Self {
            total_products: entries.len(),
            total_parts_types: parts().count(),
            total_parts_quantity: saturating_sum(parts().map(|p| p.total_quantity)),
            total_estimated_cost: saturating_sum(
                entries.iter().map(PartsBreakdownEntry::total_cost),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step3Output {
    pub parts_breakdown: Vec<PartsBreakdownEntry>,
    pub formatted_table: String,
    pub description: String,
    pub summary: PartsSummary,
    pub correction: CorrectionStats,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
    #[serde(flatten)]
    pub stamp: OutputStamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step4Output {
    /// The exact body sent to the rendering service.
    pub api_request_body: Value,
    pub api_result: RenderResult,
    pub description: String,
    #[serde(rename = "pdfFileIsExported")]
    pub pdf_file_is_exported: bool,
    #[serde(flatten)]
    pub stamp: OutputStamp,
}
