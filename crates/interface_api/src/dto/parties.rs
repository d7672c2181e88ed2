//! Issuer and receiver DTOs

use chrono::{DateTime, Utc};
use domain_billing::{Address, Party};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PartyRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub vat_number: String,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Serialize)]
pub struct PartyResponse<Id> {
    pub id: Option<Id>,
    pub name: String,
    pub vat_number: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<Id> From<Party<Id>> for PartyResponse<Id> {
    fn from(party: Party<Id>) -> Self {
        Self {
            id: party.id,
            name: party.name,
            vat_number: party.vat_number,
            address: party.address,
            created_at: party.created_at,
            updated_at: party.updated_at,
        }
    }
}
