//! Domain records produced by the product and parts steps

use super::de;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One named, quantified product extracted from the blueprint analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
}

impl ProductionItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            quantity,
        }
    }
}

/// Where a part's unit price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    GeminiEstimated,
    DatabaseCorrected,
    FallbackDefault,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::GeminiEstimated => "gemini_estimated",
            PriceSource::DatabaseCorrected => "database_corrected",
            PriceSource::FallbackDefault => "fallback_default",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced component of a product. Prices are whole JPY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub part_name: String,
    #[serde(default)]
    pub part_description: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub unit_quantity: i64,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub total_quantity: i64,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub estimated_unit_price: i64,
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub total_price: i64,
    pub price_source: PriceSource,
}

impl Part {
    /// Recomputes `total_price` from unit price and quantity.
    pub fn recompute_total(&mut self) {
        self.total_price = self.estimated_unit_price.saturating_mul(self.total_quantity);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartsBreakdownEntry {
    pub product_name: String,
    pub product_quantity: u32,
    pub parts: Vec<Part>,
}

impl PartsBreakdownEntry {
    /// Sum of `total_price` over all parts of this product. Saturates
    /// rather than wrapping on hand-edited or out-of-range documents.
    pub fn total_cost(&self) -> i64 {
        saturating_sum(self.parts.iter().map(|p| p.total_price))
    }
}

pub fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0i64, i64::saturating_add)
}
