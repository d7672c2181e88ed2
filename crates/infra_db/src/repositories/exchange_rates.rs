//! Exchange rate repository implementation
//!
//! Stores captured conversion rates and answers rate lookups with the most
//! recently captured rate for a pair. The repository implements the
//! `RateStore` port directly since rates need no domain translation beyond
//! revalidating what was read back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use core_kernel::{
    Currency, DomainPort, ExchangeRate, ExchangeRateId, HealthCheckResult, HealthCheckable,
    PortError,
};
use domain_billing::{usable_inverse, RateLookup, RateQuote, RateStore};

use crate::adapters::{check_pool, db_to_port_error, stored_currency};
use crate::error::DatabaseError;

const ADAPTER_ID: &str = "postgres-exchange-rates";

/// Repository for captured exchange rates
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    pool: PgPool,
}

impl ExchangeRateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a rate captured now
    #[instrument(skip(self, rate), fields(rate = %rate))]
    pub async fn store(&self, rate: &ExchangeRate) -> Result<ExchangeRateRow, DatabaseError> {
        let row = sqlx::query_as::<_, ExchangeRateRow>(
            r#"
            INSERT INTO exchange_rates (currency_from, currency_to, rate, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, currency_from, currency_to, rate, created_at
            "#,
        )
        .bind(rate.from().code())
        .bind(rate.to().code())
        .bind(rate.rate())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// The most recently captured rate for a pair
    pub async fn latest(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<Option<ExchangeRateRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ExchangeRateRow>(
            r#"
            SELECT id, currency_from, currency_to, rate, created_at
            FROM exchange_rates
            WHERE currency_from = $1 AND currency_to = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(from.code())
        .bind(to.code())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Captured rates for a pair, newest first
    pub async fn history(
        &self,
        from: Currency,
        to: Currency,
        limit: i64,
    ) -> Result<Vec<ExchangeRateRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ExchangeRateRow>(
            r#"
            SELECT id, currency_from, currency_to, rate, created_at
            FROM exchange_rates
            WHERE currency_from = $1 AND currency_to = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(from.code())
        .bind(to.code())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

impl DomainPort for ExchangeRateRepository {}

#[async_trait]
impl HealthCheckable for ExchangeRateRepository {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, ADAPTER_ID).await
    }
}

#[async_trait]
impl RateLookup for ExchangeRateRepository {
    /// Latest rate for the pair, else the inverse of the latest opposite rate
    async fn rate(&self, from: Currency, to: Currency) -> Result<Option<Decimal>, PortError> {
        if from == to {
            return Ok(Some(Decimal::ONE));
        }
        if let Some(row) = self.latest(from, to).await.map_err(db_to_port_error)? {
            return Ok(Some(row.into_rate()?.rate()));
        }

        let rate = match self.latest(to, from).await.map_err(db_to_port_error)? {
            Some(row) => usable_inverse(&row.into_rate()?),
            None => None,
        };
        debug!(%from, %to, ?rate, "Resolved stored exchange rate via inverse");
        Ok(rate)
    }
}

#[async_trait]
impl RateStore for ExchangeRateRepository {
    async fn record_rate(&self, quote: &mut RateQuote) -> Result<(), PortError> {
        let row = self.store(&quote.rate).await.map_err(db_to_port_error)?;
        quote.id = Some(ExchangeRateId::new(row.id));
        quote.captured_at = row.created_at;
        Ok(())
    }

    async fn rate_history(
        &self,
        from: Currency,
        to: Currency,
        limit: u32,
    ) -> Result<Vec<RateQuote>, PortError> {
        self.history(from, to, i64::from(limit))
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(ExchangeRateRow::into_quote)
            .collect()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExchangeRateRow {
    pub id: i64,
    pub currency_from: String,
    pub currency_to: String,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRateRow {
    /// Revalidates a stored row as a domain rate
    fn into_rate(self) -> Result<ExchangeRate, PortError> {
        let from = stored_currency(&self.currency_from)?;
        let to = stored_currency(&self.currency_to)?;
        ExchangeRate::new(from, to, self.rate)
            .map_err(|e| PortError::internal(format!("stored rate {} is invalid: {}", self.id, e)))
    }

    fn into_quote(self) -> Result<RateQuote, PortError> {
        let id = ExchangeRateId::new(self.id);
        let captured_at = self.created_at;
        Ok(RateQuote {
            id: Some(id),
            rate: self.into_rate()?,
            captured_at,
        })
    }
}
