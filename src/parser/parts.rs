use super::extract::decode_layered;
use super::products::{clamp_quantity, clamp_value};
use super::{ExtractionMethod, Fallback, ParseOutcome};
use crate::analysis::{truncate_chars, AnalysisData};
use crate::job::de;
use crate::job::model::{Part, PartsBreakdownEntry, PriceSource, ProductionItem};
use crate::pricing::{UnitPriceEstimator, FALLBACK_CATEGORY};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;

pub const PLACEHOLDER_ENTRY: &str = "部品分解エラー";
pub const PLACEHOLDER_PART: &str = "分解不可部品";
pub const UNKNOWN_MATERIAL: &str = "不明";
const PLACEHOLDER_PRICE: i64 = 500;

const MATERIAL_KEYWORDS: &[&str] = &[
    "スチール",
    "ステンレス",
    "アルミ",
    "木材",
    "MDF",
    "アクリル",
    "ガラス",
    "樹脂",
    "ゴム",
];

#[derive(Debug, Deserialize)]
struct PartsPayload {
    #[serde(default)]
    parts_breakdown: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, deserialize_with = "de::text")]
    product_name: String,
    #[serde(default, deserialize_with = "de::opt_int")]
    product_quantity: Option<i64>,
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    #[serde(default, deserialize_with = "de::text")]
    part_name: String,
    #[serde(default, deserialize_with = "de::text")]
    part_description: String,
    #[serde(default, deserialize_with = "de::text")]
    material: String,
    #[serde(default, deserialize_with = "de::text")]
    category: String,
    #[serde(default, deserialize_with = "de::opt_int")]
    unit_quantity: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    total_quantity: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    estimated_unit_price: Option<i64>,
}

impl RawPart {
    fn into_part(self, product_quantity: u32) -> Option<Part> {
        let part_name = self.part_name.trim().to_string();
        if part_name.is_empty() {
            return None;
        }
        let unit_quantity = clamp_value(self.unit_quantity.unwrap_or(1));
        let total_quantity = clamp_value(
            self.total_quantity
                .unwrap_or_else(|| unit_quantity.saturating_mul(i64::from(product_quantity))),
        );
        let mut part = Part {
            part_name,
            part_description: self.part_description.trim().to_string(),
            material: self.material.trim().to_string(),
            category: self.category.trim().to_string(),
            unit_quantity,
            total_quantity,
            estimated_unit_price: clamp_value(self.estimated_unit_price.unwrap_or(0)),
            total_price: 0,
            price_source: PriceSource::GeminiEstimated,
        };
        part.recompute_total();
        Some(part)
    }
}

impl RawEntry {
    fn into_entry(self, products: &[ProductionItem]) -> Option<PartsBreakdownEntry> {
        let product_name = self.product_name.trim().to_string();
        if product_name.is_empty() {
            return None;
        }
        let product_quantity = match self.product_quantity {
            Some(q) => clamp_quantity(Some(q)),
            None => products
                .iter()
                .find(|p| p.name == product_name)
                .map(|p| p.quantity)
                .unwrap_or(1),
        };
        let parts: Vec<Part> = self
            .parts
            .into_iter()
            .filter_map(|p| p.into_part(product_quantity))
            .collect();
        (!parts.is_empty()).then_some(PartsBreakdownEntry {
            product_name,
            product_quantity,
            parts,
        })
    }
}

/// Parses `{"parts_breakdown": [...]}` from an LLM response. Prices are left
/// as the LLM gave them; correction is the caller's concern.
pub fn parse_parts(
    response: &str,
    products: &[ProductionItem],
    analysis: &AnalysisData,
    estimator: &UnitPriceEstimator<'_>,
) -> ParseOutcome<PartsBreakdownEntry> {
    match decode_layered::<PartsPayload>(response) {
        Ok(payload) => {
            let entries: Vec<PartsBreakdownEntry> = payload
                .parts_breakdown
                .into_iter()
                .filter_map(|e| e.into_entry(products))
                .collect();
            if entries.is_empty() {
                fallback_parts(
                    products,
                    analysis,
                    estimator,
                    "LLM response contained no parts",
                )
            } else {
                ParseOutcome::Parsed(entries)
            }
        }
        Err(e) => fallback_parts(
            products,
            analysis,
            estimator,
            &format!("LLM response is not valid parts JSON: {}", e),
        ),
    }
}

struct PartHit {
    keyword: &'static str,
    category: &'static str,
    material: String,
    line: String,
}

fn material_in(line: &str) -> Option<&'static str> {
    let lower = line.to_lowercase();
    MATERIAL_KEYWORDS
        .iter()
        .find(|m| lower.contains(&m.to_lowercase()))
        .copied()
}

fn scan_part_types(text: &str, estimator: &UnitPriceEstimator<'_>) -> Vec<PartHit> {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    for line in text.lines() {
        let lower = line.to_lowercase();
        for (category, part_type) in estimator.database().part_types() {
            if !lower.contains(&part_type.keyword.to_lowercase()) || !seen.insert(part_type.keyword) {
                continue;
            }
            hits.push(PartHit {
                keyword: part_type.keyword,
                category: category.name,
                material: material_in(line).unwrap_or(UNKNOWN_MATERIAL).to_string(),
                line: line.trim().to_string(),
            });
        }
    }
    hits
}

/// Parts from part-type keywords in the analysis and product list, attached
/// to every product; else the single placeholder entry.
pub fn fallback_parts(
    products: &[ProductionItem],
    analysis: &AnalysisData,
    estimator: &UnitPriceEstimator<'_>,
    reason: &str,
) -> ParseOutcome<PartsBreakdownEntry> {
    let mut text = analysis.combined_text();
    for product in products {
        text.push('\n');
        text.push_str(&product.name);
        text.push('\n');
        text.push_str(&product.description);
    }
    let hits = scan_part_types(&text, estimator);

    if !hits.is_empty() && !products.is_empty() {
        let entries: Vec<PartsBreakdownEntry> = products
            .iter()
            .map(|product| PartsBreakdownEntry {
                product_name: product.name.clone(),
                product_quantity: product.quantity,
                parts: hits
                    .iter()
                    .map(|hit| {
                        let description = truncate_chars(&hit.line, 100);
                        let price =
                            estimator.estimate(hit.keyword, hit.category, &hit.material, &description);
                        let mut part = Part {
                            part_name: hit.keyword.to_string(),
                            part_description: description,
                            material: hit.material.clone(),
                            category: hit.category.to_string(),
                            unit_quantity: 1,
                            total_quantity: i64::from(product.quantity),
                            estimated_unit_price: price,
                            total_price: 0,
                            price_source: PriceSource::FallbackDefault,
                        };
                        part.recompute_total();
                        part
                    })
                    .collect(),
            })
            .collect();
        warn!(
            reason,
            part_types = hits.len(),
            products = products.len(),
            "Parts breakdown recovered from analysis keywords"
        );
        return ParseOutcome::Fallback {
            items: entries,
            fallback: Fallback {
                method: ExtractionMethod::KeywordFallback,
                reason: reason.to_string(),
            },
        };
    }

    warn!(reason, "No part keywords found, using placeholder breakdown");
    ParseOutcome::Fallback {
        items: vec![placeholder_entry(analysis)],
        fallback: Fallback {
            method: ExtractionMethod::Placeholder,
            reason: reason.to_string(),
        },
    }
}

pub fn placeholder_entry(analysis: &AnalysisData) -> PartsBreakdownEntry {
    PartsBreakdownEntry {
        product_name: PLACEHOLDER_ENTRY.to_string(),
        product_quantity: 1,
        parts: vec![Part {
            part_name: PLACEHOLDER_PART.to_string(),
            part_description: analysis.summary_excerpt(100),
            material: UNKNOWN_MATERIAL.to_string(),
            category: FALLBACK_CATEGORY.to_string(),
            unit_quantity: 1,
            total_quantity: 1,
            estimated_unit_price: PLACEHOLDER_PRICE,
            total_price: PLACEHOLDER_PRICE,
            price_source: PriceSource::FallbackDefault,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::products::MAX_LLM_VALUE;
    use yare::parameterized;

    fn products() -> Vec<ProductionItem> {
        vec![
            ProductionItem::new("Type C-2", "ロータイプ", 10),
            ProductionItem::new("Type B-2", "ハイタイプ", 4),
        ]
    }

    #[test]
    fn test_parses_llm_breakdown() {
        let response = r#"```json
{"parts_breakdown": [
  {"product_name": "Type C-2", "product_quantity": 10, "parts": [
    {"part_name": "フレーム", "part_description": "外枠", "material": "スチール",
     "category": "金属部品", "unit_quantity": 4, "total_quantity": 40,
     "estimated_unit_price": "1,500"},
    {"part_name": "ネジ", "unit_quantity": 16, "estimated_unit_price": 80.0}
  ]},
  {"product_name": "Type B-2", "parts": [{"part_name": "棚板", "unit_quantity": 2}]},
  {"product_name": "", "parts": [{"part_name": "x"}]},
  {"product_name": "空", "parts": []}
]}
```"#;
        let estimator = UnitPriceEstimator::default();
        let outcome = parse_parts(response, &products(), &AnalysisData::default(), &estimator);
        assert!(!outcome.is_fallback());
        let entries = outcome.items();
        assert_eq!(entries.len(), 2);

        let frame = &entries[0].parts[0];
        assert_eq!(frame.estimated_unit_price, 1500);
        assert_eq!(frame.total_price, 60000);

        let screw = &entries[0].parts[1];
        assert_eq!(screw.total_quantity, 160);
        assert_eq!(screw.category, "");

        assert_eq!(entries[1].product_quantity, 4);
        assert_eq!(entries[1].parts[0].total_quantity, 8);
        assert_eq!(entries[1].parts[0].estimated_unit_price, 0);
    }

    #[test]
    fn test_llm_values_are_clamped() {
        let response = r#"{"parts_breakdown": [{"product_name": "Type C-2", "parts": [
            {"part_name": "ネジ", "total_quantity": 5000000000000000000, "estimated_unit_price": -80},
            {"part_name": "ボルト", "unit_quantity": 9000000000, "estimated_unit_price": "99999999999999"}
        ]}]}"#;
        let estimator = UnitPriceEstimator::default();
        let outcome = parse_parts(response, &products(), &AnalysisData::default(), &estimator);
        let parts = &outcome.items()[0].parts;

        assert_eq!(parts[0].total_quantity, MAX_LLM_VALUE);
        assert_eq!(parts[0].estimated_unit_price, 0);
        assert_eq!(parts[1].unit_quantity, MAX_LLM_VALUE);
        assert_eq!(parts[1].total_quantity, MAX_LLM_VALUE);
        assert_eq!(parts[1].estimated_unit_price, MAX_LLM_VALUE);
        assert_eq!(parts[1].total_price, MAX_LLM_VALUE * MAX_LLM_VALUE);
    }

    #[test]
    fn test_keyword_fallback_attaches_parts_to_every_product() {
        let analysis = AnalysisData {
            annotation: "スチール製フレーム 溶接仕上げ\n棚板はMDF 化粧板貼り\nLED照明付き".to_string(),
            ..Default::default()
        };
        let estimator = UnitPriceEstimator::default();
        let outcome = parse_parts("not json", &products(), &analysis, &estimator);
        assert_eq!(outcome.method(), ExtractionMethod::KeywordFallback);

        let entries = outcome.items();
        assert_eq!(entries.len(), 2);
        let names: Vec<&str> = entries[0].parts.iter().map(|p| p.part_name.as_str()).collect();
        assert_eq!(names, vec!["フレーム", "棚板", "LED"]);

        let frame = &entries[0].parts[0];
        assert_eq!(frame.material, "スチール");
        assert_eq!(frame.category, "金属部品");
        assert_eq!(frame.estimated_unit_price, 1500);
        assert_eq!(frame.total_quantity, 10);
        assert_eq!(frame.total_price, 15000);
        assert_eq!(frame.price_source, PriceSource::FallbackDefault);

        assert_eq!(entries[0].parts[1].material, "MDF");
        assert_eq!(entries[0].parts[2].material, UNKNOWN_MATERIAL);
        assert_eq!(entries[1].parts[0].total_quantity, 4);
    }

    #[test]
    fn test_placeholder_breakdown() {
        let analysis = AnalysisData {
            summary: "外観スケッチのみ".to_string(),
            ..Default::default()
        };
        let estimator = UnitPriceEstimator::default();
        let outcome = parse_parts("", &products(), &analysis, &estimator);
        assert_eq!(outcome.method(), ExtractionMethod::Placeholder);
        let entry = &outcome.items()[0];
        assert_eq!(entry.product_name, PLACEHOLDER_ENTRY);
        assert_eq!(entry.parts[0].part_name, PLACEHOLDER_PART);
        assert_eq!(entry.parts[0].part_description, "外観スケッチのみ");
        assert_eq!(entry.parts[0].total_price, 500);
    }

    #[parameterized(
        empty = { "" },
        malformed = { "{\"parts_breakdown\": [{" },
        empty_list = { "{\"parts_breakdown\": []}" },
        nameless = { "{\"parts_breakdown\": [{\"parts\": [{\"part_name\": \"ネジ\"}]}]}" },
        prose = { "部品の分解はできませんでした" },
    )]
    fn test_never_empty(response: &str) {
        let estimator = UnitPriceEstimator::default();
        let outcome = parse_parts(response, &[], &AnalysisData::default(), &estimator);
        assert!(!outcome.items().is_empty());
        assert!(outcome.items().iter().all(|e| !e.parts.is_empty()));
    }
}
