//! Turns free-form LLM responses into product lists and parts breakdowns.
//!
//! Parsing never fails: when the response cannot be decoded, or decodes to
//! nothing usable, the analysis text is scanned for markers instead, and
//! when that finds nothing a single placeholder item is produced.

pub mod extract;
pub mod markers;
pub mod parts;
pub mod products;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use extract::{decode_layered, extract_json_block};
pub use markers::{quantity_callouts, QuantityCallout};
pub use parts::parse_parts;
pub use products::parse_products;

/// How a list was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Llm,
    KeywordFallback,
    Placeholder,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionMethod::Llm => "llm",
            ExtractionMethod::KeywordFallback => "keyword_fallback",
            ExtractionMethod::Placeholder => "placeholder",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub method: ExtractionMethod,
    pub reason: String,
}

/// Result of parsing one LLM response. Both variants hold at least one item.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(Vec<T>),
    Fallback { items: Vec<T>, fallback: Fallback },
}

impl<T> ParseOutcome<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ParseOutcome::Parsed(items) => items,
            ParseOutcome::Fallback { items, .. } => items,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParseOutcome::Fallback { .. })
    }

    pub fn method(&self) -> ExtractionMethod {
        match self {
            ParseOutcome::Parsed(_) => ExtractionMethod::Llm,
            ParseOutcome::Fallback { fallback, .. } => fallback.method,
        }
    }

    /// Items, method and fallback reason.
    pub fn into_parts(self) -> (Vec<T>, ExtractionMethod, Option<String>) {
        match self {
            ParseOutcome::Parsed(items) => (items, ExtractionMethod::Llm, None),
            ParseOutcome::Fallback { items, fallback } => {
                (items, fallback.method, Some(fallback.reason))
            }
        }
    }
}
