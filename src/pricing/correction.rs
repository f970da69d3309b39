//! Clamps LLM unit prices that stray too far from the price table.

use super::database::FALLBACK_CATEGORY;
use super::estimator::UnitPriceEstimator;
use crate::job::model::{Part, PartsBreakdownEntry, PriceSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// True when the LLM price `llm_price` must be replaced by `db_price`:
/// it is zero, or it differs from `db_price` by more than half of `db_price`.
pub fn needs_correction(llm_price: i64, db_price: i64) -> bool {
    if llm_price == 0 {
        return true;
    }
    let diff = (i128::from(llm_price) - i128::from(db_price)).abs();
    diff * 2 > i128::from(db_price)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionStats {
    pub corrected: usize,
    pub kept: usize,
}

/// Corrects one LLM-emitted part in place and returns the resulting source.
pub fn correct_part(part: &mut Part, estimator: &UnitPriceEstimator<'_>) -> PriceSource {
    if part.category.trim().is_empty() {
        part.category = FALLBACK_CATEGORY.to_string();
    }

    let db_price = estimator.estimate(
        &part.part_name,
        &part.category,
        &part.material,
        &part.part_description,
    );

    if needs_correction(part.estimated_unit_price, db_price) {
        debug!(
            part = %part.part_name,
            llm_price = part.estimated_unit_price,
            db_price,
            "Unit price corrected from database"
        );
        part.estimated_unit_price = db_price;
        part.price_source = PriceSource::DatabaseCorrected;
    } else {
        part.price_source = PriceSource::GeminiEstimated;
    }

    part.recompute_total();
    part.price_source
}

/// Applies [`correct_part`] to every part of every entry.
pub fn correct_breakdown(
    entries: &mut [PartsBreakdownEntry],
    estimator: &UnitPriceEstimator<'_>,
) -> CorrectionStats {
    let mut stats = CorrectionStats::default();
    for part in entries.iter_mut().flat_map(|e| e.parts.iter_mut()) {
        match correct_part(part, estimator) {
            PriceSource::DatabaseCorrected => stats.corrected += 1,
            _ => stats.kept += 1,
        }
    }
    stats
}

/// Recomputes totals without touching prices or their source.
pub fn recompute_totals(entries: &mut [PartsBreakdownEntry]) {
    for part in entries.iter_mut().flat_map(|e| e.parts.iter_mut()) {
        part.recompute_total();
    }
}
