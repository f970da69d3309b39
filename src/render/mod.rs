//! Dispatch of the final estimate to the document-rendering service.

pub mod http;
pub mod mock;

use crate::job::model::{saturating_sum, PartsBreakdownEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use http::HttpRenderClient;
pub use mock::MockRenderClient;

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("rendering service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("rendering service rejected the request: {message}")]
    Rejected { message: String },

    #[error("rendering service timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("could not reach rendering service: {0}")]
    Network(String),

    #[error("invalid response from rendering service: {0}")]
    InvalidResponse(String),

    #[error("rendering service is not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateProduct {
    #[serde(rename = "productName")]
    pub product_name: String,
    pub quantity: u32,
    /// Unit price: the product's parts cost divided by its quantity, floored.
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateData {
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    pub products: Vec<EstimateProduct>,
}

impl EstimateData {
    pub fn from_breakdown(entries: &[PartsBreakdownEntry]) -> Self {
        let products: Vec<EstimateProduct> = entries
            .iter()
            .map(|entry| {
                let cost = entry.total_cost();
                let price = if entry.product_quantity == 0 {
                    0
                } else {
                    cost.div_euclid(i64::from(entry.product_quantity))
                };
                EstimateProduct {
                    product_name: entry.product_name.clone(),
                    quantity: entry.product_quantity,
                    price,
                }
            })
            .collect();
        // The full parts cost, so floor remainders and zero-quantity
        // products still count.
        let total_price = saturating_sum(entries.iter().map(PartsBreakdownEntry::total_cost));
        Self {
            total_price,
            products,
        }
    }
}

/// Body POSTed to the rendering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    #[serde(rename = "estimateData")]
    pub estimate_data: EstimateData,
    #[serde(rename = "partsBreakdown")]
    pub parts_breakdown: Vec<PartsBreakdownEntry>,
    pub bucket_name: String,
    #[serde(rename = "parentFolderPath")]
    pub parent_folder_path: String,
    #[serde(rename = "userInstructions", default, skip_serializing_if = "Option::is_none")]
    pub user_instructions: Option<String>,
}

impl EstimateRequest {
    pub fn new(
        parts_breakdown: Vec<PartsBreakdownEntry>,
        bucket_name: impl Into<String>,
        organization_id: &str,
        document_id: &str,
    ) -> Self {
        Self {
            estimate_data: EstimateData::from_breakdown(&parts_breakdown),
            parts_breakdown,
            bucket_name: bucket_name.into(),
            parent_folder_path: parent_folder_path(organization_id, document_id),
            user_instructions: None,
        }
    }

    pub fn with_user_instructions(mut self, instructions: Option<String>) -> Self {
        self.user_instructions = instructions.filter(|s| !s.trim().is_empty());
        self
    }
}

pub fn parent_folder_path(organization_id: &str, document_id: &str) -> String {
    format!(
        "organizations/{}/estimate_documents/{}",
        organization_id, document_id
    )
}

/// A successful rendering outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_gcs_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_gcs_path: Option<String>,
    #[serde(default)]
    pub file_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

impl RenderResult {
    /// Interprets a 200 response body. `status: "error"` is a rejection.
    pub fn from_response(body: &Value) -> Result<Self, RenderError> {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        let status = text("status").unwrap_or_else(|| "success".to_string());
        let message = text("message");

        if status == "error" {
            return Err(RenderError::Rejected {
                message: message
                    .or_else(|| text("error_message"))
                    .unwrap_or_else(|| "no message".to_string()),
            });
        }

        let estimate_gcs_path = text("estimate_gcs_path");
        let inner_gcs_path = text("inner_gcs_path");
        let file_urls = ["file_urls", "urls", "files"]
            .iter()
            .find_map(|key| body.get(*key).and_then(string_list))
            .unwrap_or_else(|| {
                estimate_gcs_path
                    .iter()
                    .chain(inner_gcs_path.iter())
                    .cloned()
                    .collect()
            });

        Ok(Self {
            status,
            estimate_gcs_path,
            inner_gcs_path,
            file_urls,
            message,
        })
    }
}

#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn generate(&self, request: &EstimateRequest) -> Result<RenderResult, RenderError>;

    fn name(&self) -> &str;
}
