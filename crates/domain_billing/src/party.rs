//! Issuers and receivers
//!
//! Both sides of a bill are plain address-book entries with the same shape.
//! They are stored in separate tables, so the identity type keeps them apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{IssuerId, ReceiverId};

use crate::error::BillingError;

/// Postal address; every line may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// A business entity that issues or receives bills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party<Id> {
    /// Identity, `None` until stored
    pub id: Option<Id>,
    /// Legal or trading name
    pub name: String,
    /// VAT or tax registration number
    pub vat_number: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The party a bill is issued by
pub type Issuer = Party<IssuerId>;

/// The party a bill is issued to
pub type Receiver = Party<ReceiverId>;

impl<Id> Party<Id> {
    /// Creates a new, unsaved party
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Validation` if the name is blank
    pub fn new(
        name: impl Into<String>,
        vat_number: impl Into<String>,
        address: Address,
    ) -> Result<Self, BillingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BillingError::validation("party name must not be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: None,
            name: name.trim().to_string(),
            vat_number: vat_number.into().trim().to_string(),
            address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields
    pub fn update(
        &mut self,
        name: impl Into<String>,
        vat_number: impl Into<String>,
        address: Address,
    ) -> Result<(), BillingError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BillingError::validation("party name must not be empty"));
        }

        self.name = name.trim().to_string();
        self.vat_number = vat_number.into().trim().to_string();
        self.address = address;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            street: "Keizersgracht 1".to_string(),
            city: "Amsterdam".to_string(),
            state: "NH".to_string(),
            zip_code: "1015 CJ".to_string(),
            country: "NL".to_string(),
        }
    }

    #[test]
    fn test_new_issuer() {
        let issuer = Issuer::new(" Acme B.V. ", "NL123456789B01", address()).unwrap();
        assert_eq!(issuer.name, "Acme B.V.");
        assert!(issuer.id.is_none());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Receiver::new("", "", Address::default()).is_err());
    }

    #[test]
    fn test_update_keeps_identity() {
        let mut receiver = Receiver::new("Globex", "", Address::default()).unwrap();
        receiver.id = Some(ReceiverId::new(7));

        receiver.update("Globex Corp", "GB999", address()).unwrap();
        assert_eq!(receiver.id, Some(ReceiverId::new(7)));
        assert_eq!(receiver.address.city, "Amsterdam");
    }
}
