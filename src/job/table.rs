//! Human-readable tables stored alongside the structured outputs.

use super::model::{PartsBreakdownEntry, ProductionItem};

pub const PRODUCTS_CSV_HEADER: &str = "製品名,説明,数量";

const PARTS_COLUMNS: [&str; 9] = [
    "製品名",
    "部品名",
    "部品説明",
    "単位使用数",
    "総使用数",
    "単価(円)",
    "合計金額(円)",
    "材質",
    "カテゴリ",
];

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn md_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

pub fn products_csv(items: &[ProductionItem]) -> String {
    let mut lines = vec![PRODUCTS_CSV_HEADER.to_string()];
    lines.extend(items.iter().map(|item| {
        format!(
            "{},{},{}",
            csv_field(&item.name),
            csv_field(&item.description),
            item.quantity
        )
    }));
    lines.join("\n")
}

pub fn parts_markdown(entries: &[PartsBreakdownEntry]) -> String {
    let mut lines = vec![
        format!("| {} |", PARTS_COLUMNS.join(" | ")),
        format!("|{}", "---|".repeat(PARTS_COLUMNS.len())),
    ];
    for entry in entries {
        for part in &entry.parts {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                md_cell(&entry.product_name),
                md_cell(&part.part_name),
                md_cell(&part.part_description),
                part.unit_quantity,
                part.total_quantity,
                part.estimated_unit_price,
                part.total_price,
                md_cell(&part.material),
                md_cell(&part.category),
            ));
        }
    }
    lines.join("\n")
}
