//! Running cost totals

use crate::task::TokenUsage;
use serde::{Deserialize, Serialize};

/// Accumulated usage across every invocation of a session.
///
/// Monotonically increasing; only discarded together with the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    /// Number of invocation attempts recorded, including failed ones
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl CostTotals {
    pub fn record(&mut self, usage: &TokenUsage, cost_usd: f64) {
        self.calls += 1;
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
        self.total_tokens += usage.total();
        self.total_cost_usd += cost_usd.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut totals = CostTotals::default();
        totals.record(&TokenUsage::new(100, 50), 0.25);
        totals.record(&TokenUsage::default(), 0.0);

        assert_eq!(totals.calls, 2);
        assert_eq!(totals.input_tokens, 100);
        assert_eq!(totals.output_tokens, 50);
        assert_eq!(totals.total_tokens, 150);
        assert!((totals.total_cost_usd - 0.25).abs() < 1e-12);
    }
}
