//! Kernel errors
//!
//! Money arithmetic reports [`MoneyError`](crate::money::MoneyError)
//! directly; `CoreError` covers assembling kernel values from configuration.

use thiserror::Error;

use crate::money::MoneyError;

/// Errors raised while building kernel values from configuration
#[derive(Debug, Error)]
pub enum CoreError {
    /// The configured base currency is not a supported currency
    #[error("invalid base currency {code:?}: {source}")]
    InvalidBaseCurrency {
        code: String,
        #[source]
        source: MoneyError,
    },
}
