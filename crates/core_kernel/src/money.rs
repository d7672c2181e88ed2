//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//! Every arithmetic operation is checked: mixing currencies, leaving the
//! storable range, or overflowing the decimal representation is an error,
//! never a panic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::currency::Currency;

/// Internal precision for stored amounts and converted values
pub const AMOUNT_SCALE: u32 = 4;

/// Precision of exchange rates
pub const RATE_SCALE: u32 = 8;

/// Exclusive upper bound on the magnitude of any amount (15 integer digits)
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Exclusive upper bound on an exchange rate (12 integer digits)
pub const MAX_RATE: Decimal = dec!(1000000000000);

/// Errors that can occur during money operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

/// A monetary amount with associated currency
///
/// Amounts are held with 4 decimal places internally so that converted
/// values keep sub-cent precision until they are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value, rounding to the internal scale
    ///
    /// Use this for values that are already known to be in range, such as
    /// amounts read back from storage. Input that has to be kept exactly goes
    /// through [`Money::try_new`].
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(AMOUNT_SCALE),
            currency,
        }
    }

    /// Creates a Money value that must be representable without rounding
    ///
    /// # Errors
    ///
    /// `MoneyError::InvalidAmount` if `amount` has more than [`AMOUNT_SCALE`]
    /// decimal places or its magnitude is not below [`MAX_AMOUNT`]
    pub fn try_new(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > AMOUNT_SCALE {
            return Err(MoneyError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                amount, AMOUNT_SCALE
            )));
        }
        Self::bounded(amount, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Checked addition
    ///
    /// # Errors
    ///
    /// `CurrencyMismatch` for different currencies, `InvalidAmount` if the
    /// sum leaves the storable range
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        let sum = self.amount.checked_add(other.amount).ok_or_else(|| {
            MoneyError::InvalidAmount(format!("{} + {} overflows", self.amount, other.amount))
        })?;
        Self::bounded(sum, self.currency)
    }

    /// Checked multiplication by a scalar, e.g. a quantity
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if the product leaves the storable range
    pub fn checked_mul(&self, factor: Decimal) -> Result<Money, MoneyError> {
        let product = self.amount.checked_mul(factor).ok_or_else(|| {
            MoneyError::InvalidAmount(format!("{} * {} overflows", self.amount, factor))
        })?;
        Self::bounded(product, self.currency)
    }

    fn bounded(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let money = Self::new(amount, currency);
        if money.amount.abs() >= MAX_AMOUNT {
            return Err(MoneyError::InvalidAmount(format!(
                "{} {} is out of range",
                money.amount, currency
            )));
        }
        Ok(money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

/// A conversion rate from one currency into another
///
/// `rate` is the number of units of `to` that one unit of `from` buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    from: Currency,
    to: Currency,
    rate: Decimal,
}

impl ExchangeRate {
    /// Creates a rate
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidRate` if the rate fails [`ExchangeRate::check`],
    /// or if `from == to` and the rate is not exactly one
    pub fn new(from: Currency, to: Currency, rate: Decimal) -> Result<Self, MoneyError> {
        Self::check(rate)?;
        if from == to && rate != Decimal::ONE {
            return Err(MoneyError::InvalidRate(format!(
                "identity rate for {} must be 1, got {}",
                from, rate
            )));
        }
        Ok(Self { from, to, rate })
    }

    /// Checks a bare rate value: strictly positive, below [`MAX_RATE`] and
    /// with at most [`RATE_SCALE`] decimal places
    pub fn check(rate: Decimal) -> Result<(), MoneyError> {
        if rate <= Decimal::ZERO {
            return Err(MoneyError::InvalidRate(format!("must be positive, got {}", rate)));
        }
        if rate >= MAX_RATE {
            return Err(MoneyError::InvalidRate(format!("{} is out of range", rate)));
        }
        if rate.normalize().scale() > RATE_SCALE {
            return Err(MoneyError::InvalidRate(format!(
                "{} has more than {} decimal places",
                rate, RATE_SCALE
            )));
        }
        Ok(())
    }

    /// The identity conversion for a currency
    pub fn identity(currency: Currency) -> Self {
        Self {
            from: currency,
            to: currency,
            rate: Decimal::ONE,
        }
    }

    pub fn from(&self) -> Currency {
        self.from
    }

    pub fn to(&self) -> Currency {
        self.to
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    /// Returns the reverse conversion, rounded to [`RATE_SCALE`]
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            rate: (Decimal::ONE / self.rate).round_dp(RATE_SCALE),
        }
    }

    /// Converts a money amount denominated in `from` into `to`
    ///
    /// # Errors
    ///
    /// `CurrencyMismatch` if `money` is not in `from`, `InvalidAmount` if the
    /// converted amount leaves the storable range
    pub fn apply(&self, money: &Money) -> Result<Money, MoneyError> {
        if money.currency() != self.from {
            return Err(MoneyError::CurrencyMismatch(
                money.currency().to_string(),
                self.from.to_string(),
            ));
        }
        money
            .checked_mul(self.rate)
            .map(|converted| Money::new(converted.amount(), self.to))
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 {} = {} {}", self.from, self.rate, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_money_creation_rounds_to_scale() {
        let m = Money::new(dec!(100.123456), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_try_new_keeps_exact_values_only() {
        assert_eq!(
            Money::try_new(dec!(0.1234), Currency::USD).unwrap().amount(),
            dec!(0.1234)
        );
        // Trailing zeros beyond the scale are not extra precision
        assert!(Money::try_new(dec!(1.500000), Currency::USD).is_ok());
        assert!(matches!(
            Money::try_new(dec!(0.123456), Currency::USD),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(Money::try_new(MAX_AMOUNT, Currency::EUR).is_err());
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = Decimal::from_str("79228162514264337593543950335").unwrap();
        let m = Money::new(huge, Currency::EUR);

        assert!(matches!(m.checked_mul(dec!(2)), Err(MoneyError::InvalidAmount(_))));
        assert!(matches!(m.checked_add(&m), Err(MoneyError::InvalidAmount(_))));
    }

    #[test]
    fn test_range_is_checked_after_arithmetic() {
        let price = Money::try_new(dec!(999999999999.9999), Currency::EUR).unwrap();
        assert!(price.checked_mul(dec!(1001)).is_err());
        assert!(price.checked_mul(dec!(1000)).is_ok());
    }

    #[test]
    fn test_rate_application() {
        let rate = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap();
        let amount = Money::new(dec!(200.00), Currency::USD);

        let converted = rate.apply(&amount).unwrap();
        assert_eq!(converted.amount(), dec!(170.00));
        assert_eq!(converted.currency(), Currency::EUR);
    }

    #[test]
    fn test_rate_rejects_wrong_source_currency() {
        let rate = ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0.85)).unwrap();
        let amount = Money::new(dec!(10), Currency::GBP);
        assert!(rate.apply(&amount).is_err());
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(ExchangeRate::new(Currency::USD, Currency::EUR, dec!(0)).is_err());
        assert!(ExchangeRate::new(Currency::USD, Currency::EUR, dec!(-1.2)).is_err());
        assert!(ExchangeRate::new(Currency::EUR, Currency::EUR, dec!(1.1)).is_err());
    }

    #[test]
    fn test_rate_precision_and_range() {
        assert!(ExchangeRate::check(dec!(0.12345678)).is_ok());
        assert!(ExchangeRate::check(dec!(0.123456789)).is_err());
        assert!(ExchangeRate::check(MAX_RATE).is_err());
    }

    #[test]
    fn test_display_uses_currency_precision() {
        assert_eq!(Money::new(dec!(42.5), Currency::EUR).to_string(), "€ 42.50");
        assert_eq!(Money::new(dec!(1500), Currency::JPY).to_string(), "¥ 1500");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_addition_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::new(Decimal::new(a, 2), Currency::USD);
            let mb = Money::new(Decimal::new(b, 2), Currency::USD);
            let mc = Money::new(Decimal::new(c, 2), Currency::USD);

            let left = ma.checked_add(&mb).unwrap().checked_add(&mc).unwrap();
            let right = ma.checked_add(&mb.checked_add(&mc).unwrap()).unwrap();
            prop_assert_eq!(left, right);
        }

        #[test]
        fn identity_rate_preserves_amount(minor in 0i64..1_000_000_000i64) {
            let money = Money::new(Decimal::new(minor, 2), Currency::CHF);
            let converted = ExchangeRate::identity(Currency::CHF).apply(&money).unwrap();
            prop_assert_eq!(converted, money);
        }

        #[test]
        fn checked_mul_never_panics(mantissa in any::<i64>(), scale in 0u32..=4, factor in any::<u32>()) {
            let money = Money::new(Decimal::new(mantissa, scale), Currency::USD);
            let _ = money.checked_mul(Decimal::from(factor));
        }
    }
}
