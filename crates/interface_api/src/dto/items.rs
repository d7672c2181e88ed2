//! Catalog item DTOs

use chrono::{DateTime, Utc};
use core_kernel::{CatalogItemId, Currency};
use domain_billing::CatalogItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub price: Decimal,
    /// Empty or unsupported codes price the item in the base currency
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Option<CatalogItemId>,
    pub name: String,
    pub price: Decimal,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CatalogItem> for ItemResponse {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price.amount(),
            currency: item.price.currency(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
