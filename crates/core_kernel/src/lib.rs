//! Core Kernel - Foundational types for the billing system
//!
//! This crate provides the building blocks shared by every other crate:
//! - The currency registry and its configurable base currency
//! - Money and exchange-rate types with precise decimal arithmetic
//! - Surrogate identifiers for persisted entities
//! - Port error and health-check types used at adapter boundaries

pub mod currency;
pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use currency::{Currency, CurrencyRegistry};
pub use money::{Money, ExchangeRate, MoneyError, AMOUNT_SCALE, RATE_SCALE, MAX_AMOUNT, MAX_RATE};
pub use identifiers::{
    BillId, AssignmentId, CatalogItemId, IssuerId, ReceiverId, ExchangeRateId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
