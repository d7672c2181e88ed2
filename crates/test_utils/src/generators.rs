//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data. Prices and
//! rates deliberately include values that the billing core must reject:
//! more decimal places than can be stored, and magnitudes beyond the
//! storable range. [`is_storable_price`] and [`is_storable_rate`] tell the
//! two apart.

use core_kernel::{Currency, Money, MAX_AMOUNT, MAX_RATE};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating supported Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    proptest::sample::select(Currency::ALL.to_vec())
}

/// Strategy for non-negative unit prices with 0 to 6 decimal places
///
/// Mostly everyday prices, with a share of magnitudes up to about 9.2e18.
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        4 => (0i64..1_000_000_000i64, 0u32..=6u32).prop_map(|(m, dp)| Decimal::new(m, dp)),
        1 => (0i64..i64::MAX, 0u32..=6u32).prop_map(|(m, dp)| Decimal::new(m, dp)),
    ]
}

/// Strategy for strictly positive exchange rates with 0 to 10 decimal places
pub fn rate_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        4 => (1i64..100_000_000i64, 6u32..=10u32).prop_map(|(n, dp)| Decimal::new(n, dp)),
        1 => (1i64..i64::MAX, 0u32..=10u32).prop_map(|(n, dp)| Decimal::new(n, dp)),
    ]
}

/// Strategy for line-item quantities, occasionally above what storage accepts
pub fn quantity_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        9 => 0u32..1000u32,
        1 => any::<u32>(),
    ]
}

/// Strategy for Money values with 4-decimal amounts
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (-1_000_000_000i64..1_000_000_000i64, currency_strategy())
        .prop_map(|(minor, currency)| Money::new(Decimal::new(minor, 4), currency))
}

/// True if a price fits NUMERIC(19,4) without rounding
pub fn is_storable_price(price: Decimal) -> bool {
    !price.is_sign_negative() && price.normalize().scale() <= 4 && price < MAX_AMOUNT
}

/// True if a rate is positive and fits NUMERIC(20,8) without rounding
pub fn is_storable_rate(rate: Decimal) -> bool {
    rate > Decimal::ZERO && rate.normalize().scale() <= 8 && rate < MAX_RATE
}

/// Inputs for one line-item assignment
#[derive(Debug, Clone)]
pub struct AssignmentInput {
    pub quantity: u32,
    pub unit_price: Decimal,
    pub currency: Currency,
    pub exchange_rate: Decimal,
}

/// Strategy for line-item inputs in any supported currency, valid or not
pub fn assignment_input_strategy() -> impl Strategy<Value = AssignmentInput> {
    (quantity_strategy(), price_strategy(), currency_strategy(), rate_strategy()).prop_map(
        |(quantity, unit_price, currency, exchange_rate)| AssignmentInput {
            quantity,
            unit_price,
            currency,
            exchange_rate,
        },
    )
}
