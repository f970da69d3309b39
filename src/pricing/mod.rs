//! Unit pricing: the static price table, the estimator over it, and the
//! correction applied to LLM-suggested prices.

pub mod correction;
pub mod database;
pub mod estimator;

pub use correction::{correct_breakdown, correct_part, needs_correction, recompute_totals, CorrectionStats};
pub use database::{
    CategoryPrices, PartType, PriceEntry, PricingDatabase, SizeTier, FALLBACK_CATEGORY,
    GLOBAL_DEFAULT_PRICE,
};
pub use estimator::{classify_size, PriceEstimate, UnitPriceEstimator};
