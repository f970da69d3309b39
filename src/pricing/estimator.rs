use super::database::{PriceEntry, PricingDatabase, SizeTier};
use serde::Serialize;

const LARGE_KEYWORDS: &[&str] = &["大", "large", "big", "長い", "厚い"];
const SMALL_KEYWORDS: &[&str] = &["小", "small", "mini", "短い", "薄い"];

/// Classifies a size tier from free text. Large keywords win over small ones.
pub fn classify_size(text: &str) -> SizeTier {
    let text = text.to_lowercase();
    if LARGE_KEYWORDS.iter().any(|k| text.contains(k)) {
        SizeTier::Large
    } else if SMALL_KEYWORDS.iter().any(|k| text.contains(k)) {
        SizeTier::Small
    } else {
        SizeTier::Medium
    }
}

/// How a price was resolved, for diagnostics and the `price` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceEstimate {
    pub price: i64,
    pub category: Option<String>,
    pub part_type: Option<String>,
    pub tier: Option<SizeTier>,
}

/// Resolves unit prices from a [`PricingDatabase`]. Pure, no I/O.
#[derive(Debug, Clone, Copy)]
pub struct UnitPriceEstimator<'a> {
    db: &'a PricingDatabase,
}

impl Default for UnitPriceEstimator<'static> {
    fn default() -> Self {
        Self::new(PricingDatabase::standard())
    }
}

impl<'a> UnitPriceEstimator<'a> {
    pub fn new(db: &'a PricingDatabase) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &'a PricingDatabase {
        self.db
    }

    pub fn estimate(&self, part_name: &str, category: &str, material: &str, description: &str) -> i64 {
        self.estimate_traced(part_name, category, material, description)
            .price
    }

    pub fn estimate_traced(
        &self,
        part_name: &str,
        category: &str,
        material: &str,
        description: &str,
    ) -> PriceEstimate {
        let Some(prices) = self.db.category(category) else {
            return PriceEstimate {
                price: self.db.default_price(),
                category: None,
                part_type: None,
                tier: None,
            };
        };

        let Some(part_type) = prices.match_part_type(part_name) else {
            return PriceEstimate {
                price: prices.default_price,
                category: Some(prices.name.to_string()),
                part_type: None,
                tier: None,
            };
        };

        let tier = match part_type.price {
            PriceEntry::Tiered { .. } => {
                Some(classify_size(&format!("{} {} {}", part_name, description, material)))
            }
            PriceEntry::Flat(_) => None,
        };

        PriceEstimate {
            price: part_type.price.price_for(tier.unwrap_or(SizeTier::Medium)),
            category: Some(prices.name.to_string()),
            part_type: Some(part_type.keyword.to_string()),
            tier,
        }
    }
}
