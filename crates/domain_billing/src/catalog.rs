//! Catalog items
//!
//! A catalog item is a reusable, priced product or service that line-item
//! assignments reference. Its price is only a default: each assignment keeps
//! the price and currency it was billed at.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CatalogItemId, CurrencyRegistry, Money};

use crate::error::BillingError;

/// A reusable priced item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Identity, `None` until stored
    pub id: Option<CatalogItemId>,
    /// Display name
    pub name: String,
    /// Default price and its currency
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Creates a new catalog item
    ///
    /// The currency is normalized through the registry, so an empty or
    /// unsupported code prices the item in the base currency.
    ///
    /// # Errors
    ///
    /// - `BillingError::Validation` for a blank name or a negative price
    /// - `BillingError::Money` for a price with more than four decimal places
    ///   or outside the storable range
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        currency: &str,
        registry: &CurrencyRegistry,
    ) -> Result<Self, BillingError> {
        let name = name.into();
        validate_item(&name, price)?;

        let now = Utc::now();
        Ok(Self {
            id: None,
            name: name.trim().to_string(),
            price: Money::try_new(price, registry.normalize(currency))?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces name and default price
    ///
    /// # Errors
    ///
    /// Same rules as [`CatalogItem::new`]
    pub fn update(
        &mut self,
        name: impl Into<String>,
        price: Decimal,
        currency: &str,
        registry: &CurrencyRegistry,
    ) -> Result<(), BillingError> {
        let name = name.into();
        validate_item(&name, price)?;

        let price = Money::try_new(price, registry.normalize(currency))?;
        self.name = name.trim().to_string();
        self.price = price;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_item(name: &str, price: Decimal) -> Result<(), BillingError> {
    if name.trim().is_empty() {
        return Err(BillingError::validation("item name must not be empty"));
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err(BillingError::validation(format!(
            "item price must not be negative, got {}",
            price
        )));
    }
    Ok(())
}
