//! Pre-built Test Fixtures
//!
//! Ready-to-use, predictable test data for common billing entities.

use chrono::NaiveDate;
use core_kernel::{CatalogItemId, Currency, CurrencyRegistry, IssuerId, Money, ReceiverId};
use domain_billing::{Address, CatalogItem, DirectoryStore, Issuer, Party, Receiver};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    /// A JPY amount (zero decimal places)
    pub fn jpy_10000() -> Money {
        Money::new(dec!(10000), Currency::JPY)
    }
}

/// Standard due date (Mar 31, 2025)
pub fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date")
}

/// A fixed Dutch business address
pub fn address() -> Address {
    Address {
        street: "Herengracht 100".to_string(),
        city: "Amsterdam".to_string(),
        state: "NH".to_string(),
        zip_code: "1015 BS".to_string(),
        country: "NL".to_string(),
    }
}

pub fn issuer() -> Issuer {
    Party::new("Acme Consulting B.V.", "NL001234567B01", address()).expect("valid issuer")
}

pub fn receiver() -> Receiver {
    Party::new("Globex Corporation", "US98-7654321", Address::default()).expect("valid receiver")
}

/// An unsaved catalog item priced in the given currency
pub fn catalog_item(name: &str, price: Decimal, currency: Currency) -> CatalogItem {
    CatalogItem::new(name, price, currency.code(), &CurrencyRegistry::default())
        .expect("valid catalog item")
}

/// Identities of the rows created by [`seed_directory`]
#[derive(Debug, Clone)]
pub struct SeededDirectory {
    pub issuer_id: IssuerId,
    pub receiver_id: ReceiverId,
    /// A EUR item, a USD item and a GBP item, in that order
    pub item_ids: Vec<CatalogItemId>,
}

/// Stores one issuer, one receiver and three catalog items
///
/// # Panics
///
/// Panics if the store rejects any of the rows
pub async fn seed_directory(store: &dyn DirectoryStore) -> SeededDirectory {
    let mut issuer = issuer();
    store.create_issuer(&mut issuer).await.expect("issuer stored");

    let mut receiver = receiver();
    store.create_receiver(&mut receiver).await.expect("receiver stored");

    let mut item_ids = Vec::new();
    for (name, price, currency) in [
        ("Consulting hour", dec!(95.00), Currency::EUR),
        ("Cloud hosting", dec!(49.99), Currency::USD),
        ("Support plan", dec!(120.00), Currency::GBP),
    ] {
        let mut item = catalog_item(name, price, currency);
        store.create_item(&mut item).await.expect("item stored");
        item_ids.push(item.id.expect("item id assigned"));
    }

    SeededDirectory {
        issuer_id: issuer.id.expect("issuer id assigned"),
        receiver_id: receiver.id.expect("receiver id assigned"),
        item_ids,
    }
}
