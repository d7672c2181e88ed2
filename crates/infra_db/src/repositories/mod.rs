//! Repository implementations for billing entities
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! row structs; the adapters turn rows into domain types.
//!
//! # Architecture
//!
//! Each repository follows these principles:
//! - Runtime-checked queries with `FromRow` row types
//! - One transaction for multi-row writes
//! - `Option` for missing rows on reads, `NotFound` for missing rows on writes

pub mod bills;
pub mod catalog;
pub mod parties;
pub mod exchange_rates;

pub use bills::BillRepository;
pub use catalog::CatalogRepository;
pub use parties::{PartyRepository, PartyTable};
pub use exchange_rates::ExchangeRateRepository;
