//! Billing Domain - Multi-Currency Bills
//!
//! This crate implements the bill aggregation and currency-normalization
//! engine. A bill is issued by an issuer to a receiver and is composed of
//! line-item assignments, each of which may be priced in its own currency.
//!
//! # Normalization Rules
//!
//! - Every line item carries an original amount (`quantity * unit_price`, in
//!   its own currency) and a base amount (converted into the base currency).
//! - Items in the base currency always convert at exactly 1.
//! - A bill takes the single currency shared by all of its items, or the base
//!   currency when its items are mixed or it has none.
//! - Derived amounts and totals are recomputed by explicit calls, never as a
//!   side effect of mutating a field.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{Bill, LineItemAssignment};
//!
//! let registry = CurrencyRegistry::default();
//! let mut bill = Bill::new(due_date, issuer_id, receiver_id, &registry);
//! bill.add_item(LineItemAssignment::new(item_id, 2, dec!(100), "USD", dec!(0.85), &registry)?)?;
//! bill.recompute_totals()?;
//! assert_eq!(bill.base_total().amount(), dec!(170));
//! ```

pub mod assignment;
pub mod bill;
pub mod catalog;
pub mod party;
pub mod line_items;
pub mod rates;
pub mod ports;
pub mod services;
pub mod error;

pub use assignment::{LineItemAssignment, AssignmentRecord, MAX_QUANTITY};
pub use bill::{Bill, BillRecord, PaidState};
pub use catalog::CatalogItem;
pub use party::{Address, Party, Issuer, Receiver};
pub use line_items::{
    RawLineItems, LineItemDraft, RowError, MalformedRowPolicy, ParsedLineItems,
    parse_line_items,
};
pub use rates::{RateLookup, RateStore, RateQuote, StaticRateTable, rate_or_fallback, usable_inverse};
pub use ports::{BillStore, DirectoryStore};
pub use services::{BillingService, ExchangeRateService, NewBillRequest, CreatedBill, RateOverview};
pub use error::BillingError;
