//! Blueprint analysis data and the deterministic work done on it:
//! content sniffing of the downloaded file and the plain-language description.

pub mod description;
pub mod sniff;

use crate::job::de;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use description::{describe, AnalysisDescription};
pub use sniff::{sniff, DetectedFormat, FileSniff, PdfInfo, ValidationResults};

/// Pre-computed analysis of a blueprint, supplied with the job input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    #[serde(default, deserialize_with = "de::text")]
    pub summary: String,
    #[serde(default, deserialize_with = "de::text")]
    pub annotation: String,
    #[serde(default)]
    pub pages: Vec<PageAnalysis>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    #[serde(
        rename = "pageCount",
        default,
        deserialize_with = "de::opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_count: Option<i64>,
    #[serde(default, deserialize_with = "de::text")]
    pub summary: String,
    #[serde(default, deserialize_with = "de::text")]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisData {
    /// Decodes analysis data from an object, or from a string holding JSON.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::String(raw) => serde_json::from_str(raw),
            other => Self::deserialize(other),
        }
    }

    /// All analysis text as labelled sections, in document order.
    pub fn combined_text(&self) -> String {
        let mut sections = Vec::new();
        if !self.summary.trim().is_empty() {
            sections.push(format!("【プロジェクト概要】\n{}", self.summary));
        }
        if !self.annotation.trim().is_empty() {
            sections.push(format!("【製作仕様・注釈】\n{}", self.annotation));
        }
        for (i, page) in self.pages.iter().enumerate() {
            let n = i + 1;
            if !page.summary.trim().is_empty() {
                sections.push(format!("【ページ{} 概要】\n{}", n, page.summary));
            }
            if !page.content.trim().is_empty() {
                sections.push(format!("【ページ{} 詳細内容】\n{}", n, page.content));
            }
        }
        sections.join("\n\n")
    }

    /// First `max_chars` characters of the summary.
    pub fn summary_excerpt(&self, max_chars: usize) -> String {
        truncate_chars(&self.summary, max_chars)
    }
}

/// Truncates on character boundaries, never splitting a multi-byte char.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
