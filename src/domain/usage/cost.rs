//! Token and cost estimation
//!
//! Tokens are estimated from character counts (four characters per token,
//! rounded up) and priced with the model's per-million-token rates.

use serde::{Deserialize, Serialize};

use crate::domain::model::{micros_to_usd, Model};

/// Characters counted as one token by the estimation heuristic
pub const CHARS_PER_TOKEN: usize = 4;

const TOKENS_PER_MILLION: i128 = 1_000_000;

/// Estimate the number of tokens in a piece of text
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Price `tokens` at `price_per_million_micros`, rounding half up to the micro-dollar
pub fn calculate_cost_micros(tokens: u32, price_per_million_micros: i64) -> i64 {
    let numerator = tokens as i128 * price_per_million_micros as i128;
    let rounded = (numerator + TOKENS_PER_MILLION / 2).div_euclid(TOKENS_PER_MILLION);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Cost breakdown of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub input_cost_micros: i64,
    pub output_cost_micros: i64,
    pub total_cost_micros: i64,
}

impl CostEstimate {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn total_cost_usd(&self) -> f64 {
        micros_to_usd(self.total_cost_micros)
    }
}

/// Price a request against a catalog model
pub fn estimate_request_cost(model: &Model, input_tokens: u32, output_tokens: u32) -> CostEstimate {
    let input_cost_micros =
        calculate_cost_micros(input_tokens, model.input_price_per_million_micros());
    let output_cost_micros =
        calculate_cost_micros(output_tokens, model.output_price_per_million_micros());

    CostEstimate {
        input_tokens,
        output_tokens,
        input_cost_micros,
        output_cost_micros,
        total_cost_micros: input_cost_micros + output_cost_micros,
    }
}
