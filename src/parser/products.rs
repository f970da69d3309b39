use super::extract::decode_layered;
use super::markers::quantity_callouts;
use super::{ExtractionMethod, Fallback, ParseOutcome};
use crate::analysis::AnalysisData;
use crate::job::de;
use crate::job::model::ProductionItem;
use serde::Deserialize;
use tracing::warn;

pub const PLACEHOLDER_PRODUCT: &str = "CAD図面記載製品";

#[derive(Debug, Deserialize)]
struct ProductPayload {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default, deserialize_with = "de::text")]
    name: String,
    #[serde(default, deserialize_with = "de::text")]
    description: String,
    #[serde(default, deserialize_with = "de::opt_int")]
    cnt: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    quantity: Option<i64>,
}

/// Upper bound for any quantity or unit price taken from an LLM response.
/// A bounded price times a bounded quantity always fits in `i64`.
pub const MAX_LLM_VALUE: i64 = 1_000_000_000;

/// Clamps a decoded value into `0..=MAX_LLM_VALUE`.
pub(crate) fn clamp_value(n: i64) -> i64 {
    n.clamp(0, MAX_LLM_VALUE)
}

/// Clamps a decoded quantity into `0..=MAX_LLM_VALUE`; absent means one.
pub(crate) fn clamp_quantity(raw: Option<i64>) -> u32 {
    match raw {
        None => 1,
        Some(n) => u32::try_from(clamp_value(n)).unwrap_or(0),
    }
}

impl RawProduct {
    fn into_item(self) -> Option<ProductionItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let quantity = clamp_quantity(self.cnt.or(self.quantity));
        Some(ProductionItem::new(name, self.description.trim(), quantity))
    }
}

/// Parses `{"products": [...]}` from an LLM response.
pub fn parse_products(response: &str, analysis: &AnalysisData) -> ParseOutcome<ProductionItem> {
    match decode_layered::<ProductPayload>(response) {
        Ok(payload) => {
            let items: Vec<ProductionItem> = payload
                .products
                .into_iter()
                .filter_map(RawProduct::into_item)
                .collect();
            if items.is_empty() {
                fallback_products(analysis, "LLM response contained no named products")
            } else {
                ParseOutcome::Parsed(items)
            }
        }
        Err(e) => fallback_products(analysis, &format!("LLM response is not valid product JSON: {}", e)),
    }
}

/// Products from quantity call-outs in the analysis, else the placeholder.
pub fn fallback_products(analysis: &AnalysisData, reason: &str) -> ParseOutcome<ProductionItem> {
    let items: Vec<ProductionItem> = quantity_callouts(&analysis.combined_text())
        .into_iter()
        .map(|c| ProductionItem::new(c.name, c.clause, c.quantity))
        .collect();

    if !items.is_empty() {
        warn!(reason, count = items.len(), "Product list recovered from analysis markers");
        return ParseOutcome::Fallback {
            items,
            fallback: Fallback {
                method: ExtractionMethod::KeywordFallback,
                reason: reason.to_string(),
            },
        };
    }

    warn!(reason, "No product markers found, using placeholder product");
    ParseOutcome::Fallback {
        items: vec![placeholder_product(analysis)],
        fallback: Fallback {
            method: ExtractionMethod::Placeholder,
            reason: reason.to_string(),
        },
    }
}

pub fn placeholder_product(analysis: &AnalysisData) -> ProductionItem {
    ProductionItem::new(
        PLACEHOLDER_PRODUCT,
        format!(
            "図面解析により特定された製品。概要: {}",
            analysis.summary_excerpt(100)
        ),
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn analysis(annotation: &str) -> AnalysisData {
        AnalysisData {
            summary: "店舗什器一式".to_string(),
            annotation: annotation.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parses_fenced_products() {
        let response = r#"製品一覧です。
```json
{"products": [
  {"name": "Type C-2", "description": "ロータイプ", "cnt": 10},
  {"name": "Type B-2", "description": "ハイタイプ", "quantity": "4"},
  {"name": "", "cnt": 3},
  {"name": "棚板", "cnt": -2},
  {"name": "POP"}
]}
```"#;
        let outcome = parse_products(response, &analysis(""));
        assert!(!outcome.is_fallback());
        let quantities: Vec<(&str, u32)> = outcome
            .items()
            .iter()
            .map(|i| (i.name.as_str(), i.quantity))
            .collect();
        assert_eq!(
            quantities,
            vec![("Type C-2", 10), ("Type B-2", 4), ("棚板", 0), ("POP", 1)]
        );
    }

    #[test]
    fn test_marker_fallback_scenario() {
        let text = "Type C-2 ロータイプ 10台\nType B-2 ハイタイプ 4台\n棚板 合計 8枚";
        let outcome = parse_products("I cannot read this drawing.", &analysis(text));
        assert_eq!(outcome.method(), ExtractionMethod::KeywordFallback);
        let quantities: Vec<u32> = outcome.items().iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![10, 4, 8]);
    }

    #[test]
    fn test_empty_list_triggers_fallback() {
        let outcome = parse_products(r#"{"products": []}"#, &analysis("Type A-1 2台"));
        assert_eq!(outcome.method(), ExtractionMethod::KeywordFallback);
        assert_eq!(outcome.items()[0].name, "Type A-1");
    }

    #[test]
    fn test_placeholder_when_no_markers() {
        let outcome = parse_products("", &analysis("寸法は別紙参照"));
        assert_eq!(outcome.method(), ExtractionMethod::Placeholder);
        let item = &outcome.items()[0];
        assert_eq!(item.name, PLACEHOLDER_PRODUCT);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.description, "図面解析により特定された製品。概要: 店舗什器一式");
    }

    #[parameterized(
        empty = { "" },
        malformed = { "{\"products\": [" },
        wrong_shape = { "{\"products\": 12}" },
        prose = { "申し訳ありませんが、図面を判読できません。" },
        null_payload = { "null" },
    )]
    fn test_never_empty(response: &str) {
        assert!(!parse_products(response, &AnalysisData::default()).items().is_empty());
    }
}
