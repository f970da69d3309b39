//! Deterministic, LLM-free description of the pre-computed analysis.

use super::AnalysisData;
use crate::parser::markers::quantity_callouts;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisDescription {
    pub description: String,
    /// Quantity call-outs such as `Type C-2: 10台`.
    pub production_info: Vec<String>,
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}

pub fn describe(data: &AnalysisData) -> AnalysisDescription {
    let production_info: Vec<String> = quantity_callouts(&data.combined_text())
        .iter()
        .map(|c| c.label())
        .collect();

    let mut out = String::new();
    out.push_str("【プロジェクト概要】\n");
    out.push_str(or_placeholder(&data.summary, "概要情報なし"));
    out.push_str("\n\n【製作仕様・注釈】\n");
    out.push_str(or_placeholder(&data.annotation, "注釈情報なし"));
    out.push_str(&format!("\n\n【図面構成】\n総ページ数: {}ページ", data.pages.len()));
    for page in &data.pages {
        let number = page
            .page_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "不明".to_string());
        out.push_str(&format!(
            "\n- ページ{}: {}",
            number,
            or_placeholder(&page.summary, "内容不明")
        ));
    }
    if !production_info.is_empty() {
        out.push_str("\n\n【製作数量】");
        for info in &production_info {
            out.push_str("\n- ");
            out.push_str(info);
        }
    }

    AnalysisDescription {
        description: out,
        production_info,
    }
}
