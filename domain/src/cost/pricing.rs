//! Per-model token pricing

use crate::task::TokenUsage;
use serde::{Deserialize, Serialize};

/// Price in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

// Ordered so that more specific names match before their prefixes
const PRICE_TABLE: &[(&str, f64, f64)] = &[
    ("gpt-5.1", 1.25, 10.00),
    ("gpt-5-mini", 0.25, 2.00),
    ("gpt-5-nano", 0.05, 0.40),
    ("gpt-5-pro", 15.00, 120.00),
    ("gpt-5", 1.25, 10.00),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1-nano", 0.10, 0.40),
    ("gpt-4.1", 2.00, 8.00),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4-turbo", 10.00, 30.00),
    ("gpt-4", 30.00, 60.00),
    ("gpt-3.5-turbo", 0.50, 1.50),
];

impl ModelPricing {
    pub const DEFAULT: ModelPricing = ModelPricing {
        input_per_million: 2.50,
        output_per_million: 10.00,
    };

    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Look up pricing for a model name.
    ///
    /// Exact match first, then the first table entry contained in the name,
    /// then [`ModelPricing::DEFAULT`].
    pub fn for_model(model: &str) -> Self {
        let model = model.trim().to_lowercase();
        PRICE_TABLE
            .iter()
            .find(|(name, _, _)| *name == model)
            .or_else(|| PRICE_TABLE.iter().find(|(name, _, _)| model.contains(name)))
            .map(|&(_, input, output)| Self::new(input, output))
            .unwrap_or(Self::DEFAULT)
    }

    /// Cost in USD of one invocation
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (usage.output_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self::DEFAULT
    }
}
