//! Exchange rate DTOs

use chrono::{DateTime, Utc};
use core_kernel::{Currency, ExchangeRateId};
use domain_billing::{RateOverview, RateQuote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of history entries returned when the query does not say
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordRateRequest {
    #[validate(length(equal = 3, message = "currency codes have three letters"))]
    pub from: String,
    #[validate(length(equal = 3, message = "currency codes have three letters"))]
    pub to: String,
    /// Units of `to` that one unit of `from` buys
    pub rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub from: String,
    pub to: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

#[derive(Debug, Serialize)]
pub struct RateQuoteResponse {
    pub id: Option<ExchangeRateId>,
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub captured_at: DateTime<Utc>,
}

impl From<RateQuote> for RateQuoteResponse {
    fn from(quote: RateQuote) -> Self {
        Self {
            id: quote.id,
            from: quote.rate.from(),
            to: quote.rate.to(),
            rate: quote.rate.rate(),
            captured_at: quote.captured_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateOverviewResponse {
    pub from: Currency,
    pub to: Currency,
    /// Rate a new bill would use, `null` when it would fall back to 1
    pub current: Option<Decimal>,
    pub history: Vec<RateQuoteResponse>,
}

impl From<RateOverview> for RateOverviewResponse {
    fn from(overview: RateOverview) -> Self {
        Self {
            from: overview.from,
            to: overview.to,
            current: overview.current,
            history: overview.history.into_iter().map(RateQuoteResponse::from).collect(),
        }
    }
}
