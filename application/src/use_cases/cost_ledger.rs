//! Cost ledger
//!
//! Accumulates token usage and dollar cost across all calls of a session.
//! Concurrent tasks record into the same ledger; the totals sit behind a
//! mutex that is only held for the increment itself.

use council_domain::{CostTotals, ModelPricing, TokenUsage};
use std::sync::Mutex;

/// Running usage totals for one session
#[derive(Debug)]
pub struct CostLedger {
    pricing: ModelPricing,
    totals: Mutex<CostTotals>,
}

impl CostLedger {
    pub fn new(pricing: ModelPricing) -> Self {
        Self::with_totals(pricing, CostTotals::default())
    }

    /// Resume a ledger from persisted totals
    pub fn with_totals(pricing: ModelPricing, totals: CostTotals) -> Self {
        Self {
            pricing,
            totals: Mutex::new(totals),
        }
    }

    pub fn pricing(&self) -> ModelPricing {
        self.pricing
    }

    /// Record one call and return its cost in USD
    pub fn record(&self, usage: &TokenUsage) -> f64 {
        let cost = self.pricing.cost(usage);
        self.totals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(usage, cost);
        cost
    }

    /// Open an entry for one attempt.
    ///
    /// The entry records exactly once: with the reported usage when settled,
    /// or with zero usage when dropped unsettled (timeout, cancellation).
    pub fn begin(&self) -> LedgerEntry<'_> {
        LedgerEntry {
            ledger: self,
            settled: false,
        }
    }

    pub fn snapshot(&self) -> CostTotals {
        *self.totals.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reset(&self) {
        *self.totals.lock().unwrap_or_else(|e| e.into_inner()) = CostTotals::default();
    }
}

/// One pending ledger record, see [`CostLedger::begin`]
#[must_use = "an entry records zero usage when dropped unsettled"]
pub struct LedgerEntry<'a> {
    ledger: &'a CostLedger,
    settled: bool,
}

impl LedgerEntry<'_> {
    /// Record the attempt with its usage and return the cost
    pub fn settle(mut self, usage: &TokenUsage) -> f64 {
        self.settled = true;
        self.ledger.record(usage)
    }
}

impl Drop for LedgerEntry<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.ledger.record(&TokenUsage::default());
        }
    }
}
