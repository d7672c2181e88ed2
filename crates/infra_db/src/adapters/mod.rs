//! Domain Adapters
//!
//! This module provides adapter implementations for the billing domain ports,
//! connecting them to the PostgreSQL repositories.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements a port trait from `domain_billing`
//! - Translates between domain models and database row types
//! - Translates `DatabaseError` into `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillAdapter;
//! use domain_billing::BillStore;
//!
//! let adapter = PostgresBillAdapter::new(pool, registry);
//! let bill = adapter.get_bill(bill_id).await?;
//! ```

pub mod bills;
pub mod directory;

pub use bills::PostgresBillAdapter;
pub use directory::PostgresDirectoryAdapter;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, Currency, HealthCheckResult, PortError};

use crate::error::DatabaseError;

/// Converts a database error to a port error
///
/// - `NotFound` -> `PortError::NotFound`
/// - duplicate and foreign-key violations -> `PortError::Conflict`
/// - check violations -> `PortError::Validation`
/// - connection failures -> `PortError::Connection`
/// - pool exhaustion -> `PortError::ServiceUnavailable`
/// - everything else -> `PortError::Internal`
pub(crate) fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::NotFound { entity, id } => PortError::NotFound {
            entity_type: entity,
            id,
        },
        DatabaseError::DuplicateEntry(msg) | DatabaseError::ForeignKeyViolation(msg) => {
            PortError::conflict(msg)
        }
        DatabaseError::ConstraintViolation(msg) => PortError::validation(msg),
        DatabaseError::ConnectionFailed(_) => PortError::Connection {
            message: e.to_string(),
            source: Some(Box::new(e)),
        },
        DatabaseError::PoolExhausted => PortError::unavailable("postgres connection pool"),
        _ => PortError::Internal {
            message: e.to_string(),
            source: Some(Box::new(e)),
        },
    }
}

/// Parses a currency code read back from storage
pub(crate) fn stored_currency(code: &str) -> Result<Currency, PortError> {
    code.parse()
        .map_err(|e| PortError::internal(format!("stored currency is invalid: {}", e)))
}

/// Runs `SELECT 1` against the pool and reports the outcome
pub(crate) async fn check_pool(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_translation() {
        assert!(db_to_port_error(DatabaseError::not_found("Bill", 3)).is_not_found());
        assert!(db_to_port_error(DatabaseError::ForeignKeyViolation("fk".into())).is_conflict());
        assert!(db_to_port_error(DatabaseError::PoolExhausted).is_transient());
        assert!(matches!(
            db_to_port_error(DatabaseError::ConstraintViolation("check".into())),
            PortError::Validation { .. }
        ));
        assert!(matches!(
            db_to_port_error(DatabaseError::QueryFailed("syntax".into())),
            PortError::Internal { .. }
        ));
    }

    #[test]
    fn test_stored_currency() {
        assert_eq!(stored_currency("USD").unwrap(), Currency::USD);
        assert!(stored_currency("???").is_err());
    }
}
