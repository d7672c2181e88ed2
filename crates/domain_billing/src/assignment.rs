//! Line-item assignments
//!
//! An assignment binds a catalog item to a bill and captures the quantity,
//! price, currency and exchange rate at billing time. Two amounts are derived
//! from those inputs:
//!
//! - the original amount, `quantity * unit_price` in the assignment currency
//! - the base amount, the original amount converted into the base currency
//!
//! Both are only ever recomputed together, by [`LineItemAssignment::recompute_amounts`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::{
    AssignmentId, BillId, CatalogItemId, Currency, CurrencyRegistry, ExchangeRate, Money,
};

use crate::catalog::CatalogItem;
use crate::error::BillingError;

/// A catalog item placed on a bill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemAssignment {
    /// Identity, `None` until stored
    pub id: Option<AssignmentId>,
    /// Owning bill, set when the bill is stored
    pub bill_id: Option<BillId>,
    /// Referenced catalog item
    pub item_id: CatalogItemId,
    /// The referenced item, present on reads
    pub item: Option<CatalogItem>,
    pub quantity: u32,
    /// Price per unit in `currency`
    pub unit_price: Decimal,
    pub currency: Currency,
    /// Units of base currency bought by one unit of `currency`
    pub exchange_rate: Decimal,
    original_amount: Money,
    base_amount: Money,
    base_currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored assignment row, as read back from storage
#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub id: AssignmentId,
    pub bill_id: BillId,
    pub item_id: CatalogItemId,
    pub item: Option<CatalogItem>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub currency: Currency,
    pub exchange_rate: Decimal,
    pub original_amount: Decimal,
    pub base_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Largest quantity a line item may carry; quantities are stored as 32-bit signed integers
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

impl LineItemAssignment {
    /// Creates an assignment and computes its amounts
    ///
    /// The currency is normalized through the registry; an empty or
    /// unsupported code bills in the base currency. When the resulting
    /// currency is the base currency the exchange rate is forced to 1,
    /// whatever was passed in.
    ///
    /// # Errors
    ///
    /// See [`LineItemAssignment::recompute_amounts`]
    pub fn new(
        item_id: CatalogItemId,
        quantity: u32,
        unit_price: Decimal,
        currency: &str,
        exchange_rate: Decimal,
        registry: &CurrencyRegistry,
    ) -> Result<Self, BillingError> {
        let currency = registry.normalize(currency);
        let base_currency = registry.default_currency();

        let now = Utc::now();
        let mut assignment = Self {
            id: None,
            bill_id: None,
            item_id,
            item: None,
            quantity,
            unit_price,
            currency,
            exchange_rate,
            original_amount: Money::zero(currency),
            base_amount: Money::zero(base_currency),
            base_currency,
            created_at: now,
            updated_at: now,
        };
        assignment.recompute_amounts()?;
        Ok(assignment)
    }

    /// Recomputes the original and base amounts from the current inputs
    ///
    /// Also re-applies the identity rate if the currency is the base currency.
    /// On error the previous amounts are kept.
    ///
    /// # Errors
    ///
    /// - `BillingError::Validation` if the unit price is negative or the
    ///   quantity exceeds [`MAX_QUANTITY`]
    /// - `BillingError::Money` if the unit price is not exactly representable,
    ///   a foreign-currency rate is invalid, or an amount leaves the storable range
    pub fn recompute_amounts(&mut self) -> Result<(), BillingError> {
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(BillingError::validation(format!(
                "unit price must not be negative, got {}",
                self.unit_price
            )));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(BillingError::validation(format!(
                "quantity must not exceed {}, got {}",
                MAX_QUANTITY, self.quantity
            )));
        }

        let rate = if self.currency == self.base_currency {
            self.exchange_rate = Decimal::ONE;
            ExchangeRate::identity(self.base_currency)
        } else {
            ExchangeRate::new(self.currency, self.base_currency, self.exchange_rate)?
        };

        let original = Money::try_new(self.unit_price, self.currency)?
            .checked_mul(Decimal::from(self.quantity))?;
        let base = rate.apply(&original)?;

        self.original_amount = original;
        self.base_amount = base;
        Ok(())
    }

    /// `quantity * unit_price` in the assignment currency
    pub fn original_amount(&self) -> Money {
        self.original_amount
    }

    /// The original amount converted into the base currency
    pub fn base_amount(&self) -> Money {
        self.base_amount
    }

    /// The currency base amounts are denominated in
    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    /// Returns true if the assignment is billed in the base currency
    pub fn is_base_currency(&self) -> bool {
        self.currency == self.base_currency
    }

    /// Rebuilds an assignment from a stored row
    ///
    /// Stored derived amounts are taken as-is.
    pub fn restore(record: AssignmentRecord, base_currency: Currency) -> Self {
        Self {
            id: Some(record.id),
            bill_id: Some(record.bill_id),
            item_id: record.item_id,
            item: record.item,
            quantity: record.quantity,
            unit_price: record.unit_price,
            currency: record.currency,
            exchange_rate: record.exchange_rate,
            original_amount: Money::new(record.original_amount, record.currency),
            base_amount: Money::new(record.base_amount, base_currency),
            base_currency,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::MoneyError;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn registry() -> CurrencyRegistry {
        CurrencyRegistry::default()
    }

    #[test]
    fn test_foreign_currency_amounts() {
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            2,
            dec!(100),
            "USD",
            dec!(0.85),
            &registry(),
        )
        .unwrap();

        assert_eq!(a.original_amount(), Money::new(dec!(200), Currency::USD));
        assert_eq!(a.base_amount(), Money::new(dec!(170), Currency::EUR));
        assert!(!a.is_base_currency());
    }

    #[test]
    fn test_base_currency_forces_identity_rate() {
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            5,
            dec!(10),
            "EUR",
            dec!(1.3),
            &registry(),
        )
        .unwrap();

        assert_eq!(a.exchange_rate, Decimal::ONE);
        assert_eq!(a.original_amount().amount(), dec!(50));
        assert_eq!(a.base_amount().amount(), dec!(50));
    }

    #[test]
    fn test_unsupported_currency_falls_back_to_base() {
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(9.99),
            "XYZ",
            dec!(0),
            &registry(),
        )
        .unwrap();

        assert_eq!(a.currency, Currency::EUR);
        assert_eq!(a.exchange_rate, Decimal::ONE);
    }

    #[test]
    fn test_zero_quantity() {
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            0,
            dec!(100),
            "USD",
            dec!(0.85),
            &registry(),
        )
        .unwrap();

        assert!(a.original_amount().is_zero());
        assert!(a.base_amount().is_zero());
    }

    #[test]
    fn test_invalid_inputs() {
        let negative_price = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(-1),
            "USD",
            dec!(0.85),
            &registry(),
        );
        assert!(matches!(negative_price, Err(BillingError::Validation(_))));

        let zero_rate = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(1),
            "USD",
            dec!(0),
            &registry(),
        );
        assert!(matches!(zero_rate, Err(BillingError::Money(MoneyError::InvalidRate(_)))));
    }

    #[test]
    fn test_setters_do_not_recompute() {
        let mut a = LineItemAssignment::new(
            CatalogItemId::new(1),
            2,
            dec!(25.50),
            "USD",
            dec!(0.85),
            &registry(),
        )
        .unwrap();
        assert_eq!(a.base_amount().amount(), dec!(43.35));

        a.quantity = 4;
        assert_eq!(a.original_amount().amount(), dec!(51));

        a.recompute_amounts().unwrap();
        assert_eq!(a.original_amount().amount(), dec!(102));
        assert_eq!(a.base_amount().amount(), dec!(86.70));
    }

    #[test]
    fn test_switching_to_base_currency_resets_rate() {
        let mut a = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(10),
            "GBP",
            dec!(1.17),
            &registry(),
        )
        .unwrap();

        a.currency = Currency::EUR;
        a.recompute_amounts().unwrap();
        assert_eq!(a.exchange_rate, Decimal::ONE);
        assert_eq!(a.base_amount().amount(), dec!(10));
    }

    #[test]
    fn test_configured_base_currency() {
        let usd_base = CurrencyRegistry::new(Currency::USD);
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(10),
            "",
            dec!(0.5),
            &usd_base,
        )
        .unwrap();

        assert_eq!(a.currency, Currency::USD);
        assert_eq!(a.base_amount(), Money::new(dec!(10), Currency::USD));
    }

    #[test]
    fn test_original_amount_is_exact_product() {
        let a = LineItemAssignment::new(
            CatalogItemId::new(1),
            2,
            dec!(0.1234),
            "USD",
            dec!(0.85),
            &registry(),
        )
        .unwrap();

        assert_eq!(a.original_amount().amount(), dec!(0.2468));
        assert_eq!(a.original_amount().amount(), a.unit_price * Decimal::from(a.quantity));
    }

    #[test]
    fn test_over_precise_price_is_rejected() {
        let result = LineItemAssignment::new(
            CatalogItemId::new(1),
            2,
            dec!(0.123456),
            "USD",
            dec!(0.85),
            &registry(),
        );
        assert!(matches!(result, Err(BillingError::Money(MoneyError::InvalidAmount(_)))));
    }

    #[test]
    fn test_over_precise_rate_is_rejected() {
        let result = LineItemAssignment::new(
            CatalogItemId::new(1),
            1,
            dec!(10),
            "USD",
            dec!(0.850000001),
            &registry(),
        );
        assert!(matches!(result, Err(BillingError::Money(MoneyError::InvalidRate(_)))));
    }

    #[test]
    fn test_overflowing_amount_is_an_error() {
        let huge = Decimal::from_str("79228162514264337593543950335").unwrap();
        let result = LineItemAssignment::new(CatalogItemId::new(1), 2, huge, "EUR", dec!(1), &registry());
        assert!(matches!(result, Err(BillingError::Money(MoneyError::InvalidAmount(_)))));

        let in_range = dec!(999999999999.9999);
        let result = LineItemAssignment::new(
            CatalogItemId::new(1),
            MAX_QUANTITY,
            in_range,
            "USD",
            dec!(0.85),
            &registry(),
        );
        assert!(matches!(result, Err(BillingError::Money(MoneyError::InvalidAmount(_)))));
    }

    #[test]
    fn test_failed_recompute_keeps_previous_amounts() {
        let mut a = LineItemAssignment::new(
            CatalogItemId::new(1),
            2,
            dec!(100),
            "USD",
            dec!(0.85),
            &registry(),
        )
        .unwrap();

        a.unit_price = dec!(1.00001);
        assert!(a.recompute_amounts().is_err());
        assert_eq!(a.original_amount().amount(), dec!(200));
        assert_eq!(a.base_amount().amount(), dec!(170));
    }

    #[test]
    fn test_quantity_above_storage_limit_is_rejected() {
        let result = LineItemAssignment::new(
            CatalogItemId::new(1),
            MAX_QUANTITY + 1,
            dec!(0),
            "EUR",
            dec!(1),
            &registry(),
        );
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }
}
