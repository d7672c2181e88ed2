//! Billing domain errors

use thiserror::Error;

use core_kernel::{BillId, Currency, MoneyError, PortError};

use crate::line_items::RowError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Input failed validation as a whole
    #[error("Validation error: {0}")]
    Validation(String),

    /// One or more submitted line-item rows could not be parsed
    #[error("{} line item row(s) rejected", .0.len())]
    InvalidLineItems(Vec<RowError>),

    /// Bill not found
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// A line item was normalized against a different base currency than its bill
    #[error("Base currency mismatch: bill normalizes into {bill}, line item into {item}")]
    BaseCurrencyMismatch {
        bill: Currency,
        item: Currency,
    },

    /// Money arithmetic or rate error
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Storage or rate-lookup adapter failure
    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Returns true if the error means the requested bill does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            BillingError::BillNotFound(_) => true,
            BillingError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
