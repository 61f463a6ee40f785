//! Cost domain - token pricing and running totals.

pub mod pricing;
pub mod totals;

pub use pricing::ModelPricing;
pub use totals::CostTotals;
