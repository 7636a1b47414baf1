//! Usage domain - cost estimation, usage records and aggregates

mod cost;
mod query;
mod record;

pub use cost::{
    calculate_cost_micros, estimate_request_cost, estimate_tokens, CostEstimate, CHARS_PER_TOKEN,
};
pub use query::{UsageQuery, DEFAULT_USAGE_LIMIT, MAX_USAGE_LIMIT};
pub use record::{
    usage_by_day, usage_by_model, DailyUsage, ModelUsage, UsageAggregate, UsageRecord,
    UsageRecordId, UsageSummary,
};
