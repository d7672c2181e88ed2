//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use std::collections::BTreeSet;

use core_kernel::{Currency, Money};
use domain_billing::Bill;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a bill's derived fields agree with its assignments
///
/// # Panics
///
/// Panics with the first inconsistency found
pub fn assert_bill_consistent(bill: &Bill) {
    let base = bill.base_currency();

    for (index, item) in bill.items().iter().enumerate() {
        let original = Money::new(item.unit_price * Decimal::from(item.quantity), item.currency);
        assert_eq!(item.original_amount(), original, "line {} original amount", index);

        if item.currency == base {
            assert_eq!(item.exchange_rate, Decimal::ONE, "line {} base-currency rate", index);
            assert_eq!(item.base_amount().amount(), original.amount(), "line {} base amount", index);
        } else {
            let expected = Money::new(original.amount() * item.exchange_rate, base);
            assert_eq!(item.base_amount(), expected, "line {} base amount", index);
        }
    }

    let currencies: BTreeSet<Currency> = bill.items().iter().map(|i| i.currency).collect();
    let expected_currency = if currencies.len() == 1 {
        currencies.into_iter().next().unwrap_or(base)
    } else {
        base
    };
    assert_eq!(bill.currency(), expected_currency, "bill currency");

    let base_sum: Decimal = bill.items().iter().map(|i| i.base_amount().amount()).sum();
    assert_eq!(bill.base_total(), Money::new(base_sum, base), "base total");

    let original_sum: Decimal = bill
        .items()
        .iter()
        .map(|i| {
            if i.currency == bill.currency() {
                i.original_amount().amount()
            } else {
                i.base_amount().amount()
            }
        })
        .sum();
    assert_eq!(
        bill.original_total(),
        Money::new(original_sum, bill.currency()),
        "original total"
    );
}

/// Asserts that a bill read back from storage matches the one written
///
/// Timestamps and joined display fields are not compared.
pub fn assert_same_bill(actual: &Bill, expected: &Bill) {
    assert_eq!(actual.id, expected.id, "bill id");
    assert_eq!(actual.due_date, expected.due_date, "due date");
    assert_eq!(actual.issuer_id, expected.issuer_id, "issuer");
    assert_eq!(actual.receiver_id, expected.receiver_id, "receiver");
    assert_eq!(actual.paid(), expected.paid(), "paid flag");
    assert_eq!(actual.currency(), expected.currency(), "currency");
    assert_eq!(actual.original_total(), expected.original_total(), "original total");
    assert_eq!(actual.base_total(), expected.base_total(), "base total");
    assert_eq!(actual.items().len(), expected.items().len(), "line count");

    for (index, (a, e)) in actual.items().iter().zip(expected.items()).enumerate() {
        assert_eq!(a.item_id, e.item_id, "line {} item", index);
        assert_eq!(a.quantity, e.quantity, "line {} quantity", index);
        assert_eq!(a.unit_price, e.unit_price, "line {} unit price", index);
        assert_eq!(a.currency, e.currency, "line {} currency", index);
        assert_eq!(a.exchange_rate, e.exchange_rate, "line {} rate", index);
        assert_eq!(a.original_amount(), e.original_amount(), "line {} original amount", index);
        assert_eq!(a.base_amount(), e.base_amount(), "line {} base amount", index);
    }
}
