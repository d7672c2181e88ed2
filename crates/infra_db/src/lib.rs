//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL storage for bills, their line-item
//! assignments, the issuer/receiver address book, the item catalog and stored
//! exchange rates, using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! work in terms of row types; adapters implement the billing domain ports on
//! top of them and translate rows into domain types.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/bills")).await?;
//! run_migrations(&pool).await?;
//! let bills = PostgresBillAdapter::new(pool, CurrencyRegistry::default());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::{BillRepository, CatalogRepository, PartyRepository, PartyTable, ExchangeRateRepository};
pub use adapters::{PostgresBillAdapter, PostgresDirectoryAdapter};
