//! Exchange rates
//!
//! The billing core never fetches rates itself. It asks a [`RateLookup`]
//! port, which storage or a static table implements. Rates captured by an
//! operator are written through the [`RateStore`] port, and every later
//! lookup answers with the most recently captured rate for the pair.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use core_kernel::{Currency, DomainPort, ExchangeRate, ExchangeRateId, HealthCheckable, PortError};

/// Port for resolving conversion rates
#[async_trait]
pub trait RateLookup: DomainPort {
    /// Returns how many units of `to` one unit of `from` buys
    ///
    /// `Ok(None)` means no rate is known for the pair. Implementations must
    /// return `Some(1)` when `from == to`.
    async fn rate(&self, from: Currency, to: Currency) -> Result<Option<Decimal>, PortError>;
}

/// A captured exchange rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    /// Identity, `None` until stored
    pub id: Option<ExchangeRateId>,
    pub rate: ExchangeRate,
    pub captured_at: DateTime<Utc>,
}

impl RateQuote {
    /// A quote captured now
    pub fn new(rate: ExchangeRate) -> Self {
        Self {
            id: None,
            rate,
            captured_at: Utc::now(),
        }
    }
}

/// Port for recording captured rates
///
/// Lookups through [`RateLookup`] must answer with the latest recorded rate
/// for a pair, and with the inverse of the latest opposite-direction rate
/// when the pair itself was never recorded.
#[async_trait]
pub trait RateStore: RateLookup + HealthCheckable {
    /// Stores a quote and writes the generated identity back onto it
    async fn record_rate(&self, quote: &mut RateQuote) -> Result<(), PortError>;

    /// Recorded quotes for a pair, newest first, at most `limit` of them
    async fn rate_history(
        &self,
        from: Currency,
        to: Currency,
        limit: u32,
    ) -> Result<Vec<RateQuote>, PortError>;
}

/// A fixed in-memory rate table
///
/// Pairs that are only stored in the opposite direction are answered with
/// the inverse rate.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    rates: HashMap<(Currency, Currency), ExchangeRate>,
}

impl StaticRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate, replacing any previous rate for the same pair
    pub fn with_rate(mut self, rate: ExchangeRate) -> Self {
        self.insert(rate);
        self
    }

    pub fn insert(&mut self, rate: ExchangeRate) {
        self.rates.insert((rate.from(), rate.to()), rate);
    }

    /// Looks a pair up without going through the async port
    pub fn get(&self, from: Currency, to: Currency) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        if let Some(rate) = self.rates.get(&(from, to)) {
            return Some(rate.rate());
        }
        self.rates.get(&(to, from)).and_then(usable_inverse)
    }
}

/// The inverse of a recorded rate, unless it rounds away to nothing
pub fn usable_inverse(rate: &ExchangeRate) -> Option<Decimal> {
    let inverse = rate.inverse().rate();
    ExchangeRate::check(inverse).ok().map(|_| inverse)
}

impl DomainPort for StaticRateTable {}

#[async_trait]
impl RateLookup for StaticRateTable {
    async fn rate(&self, from: Currency, to: Currency) -> Result<Option<Decimal>, PortError> {
        Ok(self.get(from, to))
    }
}

/// Looks a rate up, substituting 1 when no usable rate can be found
///
/// A failed, empty or invalid lookup is logged at `warn` and never fails
/// the caller.
pub async fn rate_or_fallback(lookup: &dyn RateLookup, from: Currency, to: Currency) -> Decimal {
    if from == to {
        return Decimal::ONE;
    }

    match lookup.rate(from, to).await {
        Ok(Some(rate)) => match ExchangeRate::new(from, to, rate) {
            Ok(valid) => valid.rate(),
            Err(e) => {
                warn!(%from, %to, %rate, error = %e, "Ignoring unusable exchange rate, using 1.0");
                Decimal::ONE
            }
        },
        Ok(None) => {
            warn!(%from, %to, "No exchange rate available, using 1.0");
            Decimal::ONE
        }
        Err(e) => {
            warn!(%from, %to, error = %e, "Exchange rate lookup failed, using 1.0");
            Decimal::ONE
        }
    }
}
