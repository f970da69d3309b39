//! Quantity call-outs recognised in free-form analysis text.
//!
//! A line is split into clauses at every marker (type code, shelf board,
//! display stand, fixture); each clause is searched for its own quantity.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;

/// A named quantity found in the analysis text, e.g. `Type C-2: 10台`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityCallout {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    /// The clause the quantity was read from, trimmed.
    pub clause: String,
}

impl QuantityCallout {
    pub fn label(&self) -> String {
        format!("{}: {}{}", self.name, self.quantity, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    TypeCode,
    ShelfBoard,
    Display,
    Fixture,
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)type[ \t]*([a-z0-9]+(?:-[a-z0-9]+)*)|棚板|ディスプレイ[\p{Katakana}ー]*|什器")
            .expect("valid regex")
    })
}

fn count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*(台|個|セット|式)").expect("valid regex"))
}

fn sheet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(各\s*)?(\d+)\s*枚").expect("valid regex"))
}

/// Full-width digits are common in Japanese drawings.
fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn parse_u32(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn classify(marker: &str) -> MarkerKind {
    if marker == "棚板" {
        MarkerKind::ShelfBoard
    } else if marker.starts_with("ディスプレイ") {
        MarkerKind::Display
    } else if marker == "什器" {
        MarkerKind::Fixture
    } else {
        MarkerKind::TypeCode
    }
}

fn count_in(clause: &str) -> Option<(u32, String)> {
    let caps = count_re().captures(clause)?;
    Some((parse_u32(&caps, 1)?, caps[2].to_string()))
}

/// Returns the shelf-board count of a clause; an explicit total wins over `各N枚`.
fn sheets_in(clause: &str, per_unit_multiplier: Option<u32>) -> Option<u32> {
    let mut per_unit = None;
    for caps in sheet_re().captures_iter(clause) {
        let n = parse_u32(&caps, 2)?;
        if caps.get(1).is_none() {
            return Some(n);
        }
        per_unit.get_or_insert(n);
    }
    per_unit.map(|n| n.saturating_mul(per_unit_multiplier.unwrap_or(1)))
}

/// Scans `text` for quantity call-outs, in document order, deduplicated by name.
pub fn quantity_callouts(text: &str) -> Vec<QuantityCallout> {
    let text = normalize_digits(text);
    let mut found: Vec<QuantityCallout> = Vec::new();
    let mut fixtures: Vec<QuantityCallout> = Vec::new();
    let mut last_type_quantity: Option<u32> = None;

    for line in text.lines() {
        let markers: Vec<_> = marker_re().captures_iter(line).collect();
        for (i, caps) in markers.iter().enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(line.len());
            let clause = &line[whole.end()..end];
            let clause_text = line[whole.start()..end].trim().to_string();

            match classify(whole.as_str()) {
                MarkerKind::TypeCode => {
                    let Some(code) = caps.get(1) else { continue };
                    if let Some((quantity, unit)) = count_in(clause) {
                        last_type_quantity = Some(quantity);
                        found.push(QuantityCallout {
                            name: format!("Type {}", code.as_str().to_uppercase()),
                            quantity,
                            unit,
                            clause: clause_text,
                        });
                    }
                }
                MarkerKind::ShelfBoard => {
                    if let Some(quantity) = sheets_in(clause, last_type_quantity) {
                        found.push(QuantityCallout {
                            name: "棚板".to_string(),
                            quantity,
                            unit: "枚".to_string(),
                            clause: clause_text,
                        });
                    }
                }
                MarkerKind::Display => {
                    let (quantity, unit) = count_in(clause).unwrap_or((1, "台".to_string()));
                    found.push(QuantityCallout {
                        name: whole.as_str().to_string(),
                        quantity,
                        unit,
                        clause: clause_text,
                    });
                }
                MarkerKind::Fixture => {
                    if let Some((quantity, unit)) = count_in(clause) {
                        fixtures.push(QuantityCallout {
                            name: "什器".to_string(),
                            quantity,
                            unit,
                            clause: clause_text,
                        });
                    }
                }
            }
        }
    }

    if found.is_empty() {
        found = fixtures;
    }

    let mut seen = HashSet::new();
    found.retain(|c| seen.insert(c.name.clone()));
    found
}
