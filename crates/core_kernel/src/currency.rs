//! Currency registry
//!
//! The set of currencies a bill or line item may be denominated in is fixed.
//! One of them is the base currency that every cross-currency amount is
//! normalized into. The base is carried by [`CurrencyRegistry`] and passed to
//! whatever needs it, so alternate bases can be exercised without globals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::MoneyError;

/// Supported ISO 4217 currency codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    EUR,
    USD,
    CAD,
    GBP,
    AUD,
    JPY,
    CHF,
    CNY,
    NZD,
    MXN,
}

impl Currency {
    /// Every supported currency, base currency first
    pub const ALL: [Currency; 10] = [
        Currency::EUR,
        Currency::USD,
        Currency::CAD,
        Currency::GBP,
        Currency::AUD,
        Currency::JPY,
        Currency::CHF,
        Currency::CNY,
        Currency::NZD,
        Currency::MXN,
    ];

    /// Returns the number of decimal places used when displaying amounts
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::CAD => "C$",
            Currency::GBP => "£",
            Currency::AUD => "A$",
            Currency::JPY => "¥",
            Currency::CHF => "CHF",
            Currency::CNY => "CN¥",
            Currency::NZD => "NZ$",
            Currency::MXN => "MX$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::CNY => "CNY",
            Currency::NZD => "NZD",
            Currency::MXN => "MXN",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    /// Parses a currency code, ignoring surrounding whitespace and case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| MoneyError::UnsupportedCurrency(s.to_string()))
    }
}

/// The supported currency set together with the configured base currency
///
/// Every constructor that accepts a currency from untrusted input routes it
/// through [`CurrencyRegistry::normalize`].
///
/// # Example
///
/// ```rust
/// use core_kernel::{Currency, CurrencyRegistry};
///
/// let registry = CurrencyRegistry::default();
/// assert_eq!(registry.normalize("usd"), Currency::USD);
/// assert_eq!(registry.normalize("XYZ"), Currency::EUR);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRegistry {
    default: Currency,
}

impl CurrencyRegistry {
    /// Creates a registry normalizing into the given base currency
    pub const fn new(default: Currency) -> Self {
        Self { default }
    }

    /// Creates a registry from a configured base currency code
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidBaseCurrency` if the code is not supported
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        code.parse::<Currency>()
            .map(Self::new)
            .map_err(|source| CoreError::InvalidBaseCurrency {
                code: code.to_string(),
                source,
            })
    }

    /// Returns the fixed set of supported currencies
    pub fn supported(&self) -> BTreeSet<Currency> {
        Currency::ALL.into_iter().collect()
    }

    /// Checks whether a raw code names a supported currency
    pub fn is_supported(&self, code: &str) -> bool {
        code.parse::<Currency>().is_ok()
    }

    /// Returns the base currency used as the normalization target
    pub fn default_currency(&self) -> Currency {
        self.default
    }

    /// Checks whether a currency is the base currency
    pub fn is_default(&self, currency: Currency) -> bool {
        currency == self.default
    }

    /// Returns the parsed currency if supported and non-empty, else the base currency
    pub fn normalize(&self, code: &str) -> Currency {
        code.parse().unwrap_or(self.default)
    }

    /// Same as [`normalize`](Self::normalize) for an optional code
    pub fn normalize_opt(&self, code: Option<&str>) -> Currency {
        code.map_or(self.default, |c| self.normalize(c))
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::new(Currency::EUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(" Gbp ".parse::<Currency>().unwrap(), Currency::GBP);
    }

    #[test]
    fn test_parse_rejects_unknown_code() {
        let err = "INR".parse::<Currency>().unwrap_err();
        assert_eq!(err, MoneyError::UnsupportedCurrency("INR".to_string()));
    }

    #[test]
    fn test_normalize_falls_back_to_default() {
        let registry = CurrencyRegistry::default();
        assert_eq!(registry.normalize(""), Currency::EUR);
        assert_eq!(registry.normalize("   "), Currency::EUR);
        assert_eq!(registry.normalize("BTC"), Currency::EUR);
        assert_eq!(registry.normalize("CAD"), Currency::CAD);
        assert_eq!(registry.normalize_opt(None), Currency::EUR);
    }

    #[test]
    fn test_alternate_base_currency() {
        let registry = CurrencyRegistry::new(Currency::USD);
        assert_eq!(registry.normalize("nope"), Currency::USD);
        assert!(registry.is_default(Currency::USD));
        assert!(!registry.is_default(Currency::EUR));
    }

    #[test]
    fn test_from_code_rejects_unsupported_base() {
        assert!(CurrencyRegistry::from_code("GBP").is_ok());
        assert!(matches!(
            CurrencyRegistry::from_code("ZZZ"),
            Err(CoreError::InvalidBaseCurrency { .. })
        ));
    }
}
