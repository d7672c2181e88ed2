//! Bill aggregate
//!
//! A bill collects line-item assignments and derives its currency and totals
//! from them:
//!
//! - `currency` is the one currency shared by every assignment, or the base
//!   currency if assignments are mixed or there are none
//! - `base_total` is the sum of every assignment's base amount
//! - `original_total` is denominated in the bill currency: assignments in that
//!   currency contribute their original amount, all others their base amount
//!
//! Since a mixed bill always resolves to the base currency, `original_total`
//! never adds amounts of different currencies together.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, Currency, CurrencyRegistry, IssuerId, Money, ReceiverId};

use crate::assignment::{AssignmentRecord, LineItemAssignment};
use crate::error::BillingError;

/// Whether a bill has been settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidState {
    Unpaid,
    Paid,
}

/// A bill from an issuer to a receiver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    /// Identity, `None` until stored
    pub id: Option<BillId>,
    pub due_date: NaiveDate,
    pub issuer_id: IssuerId,
    pub receiver_id: ReceiverId,
    /// Issuer display name, present on reads
    pub issuer_name: Option<String>,
    /// Receiver display name, present on reads
    pub receiver_name: Option<String>,
    paid: bool,
    currency: Currency,
    original_total: Money,
    base_total: Money,
    base_currency: Currency,
    items: Vec<LineItemAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored bill row with its assignment rows, as read back from storage
#[derive(Debug, Clone)]
pub struct BillRecord {
    pub id: BillId,
    pub due_date: NaiveDate,
    pub issuer_id: IssuerId,
    pub receiver_id: ReceiverId,
    pub issuer_name: Option<String>,
    pub receiver_name: Option<String>,
    pub paid: bool,
    pub currency: Currency,
    pub original_total: Decimal,
    pub base_total: Decimal,
    pub items: Vec<AssignmentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Creates an empty, unpaid bill normalizing into the registry's base currency
    pub fn new(
        due_date: NaiveDate,
        issuer_id: IssuerId,
        receiver_id: ReceiverId,
        registry: &CurrencyRegistry,
    ) -> Self {
        Self::with_base_currency(due_date, issuer_id, receiver_id, registry.default_currency())
    }

    /// Creates an empty, unpaid bill normalizing into the given base currency
    pub fn with_base_currency(
        due_date: NaiveDate,
        issuer_id: IssuerId,
        receiver_id: ReceiverId,
        base_currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            due_date,
            issuer_id,
            receiver_id,
            issuer_name: None,
            receiver_name: None,
            paid: false,
            currency: base_currency,
            original_total: Money::zero(base_currency),
            base_total: Money::zero(base_currency),
            base_currency,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends an assignment without recomputing totals
    ///
    /// # Errors
    ///
    /// Returns `BillingError::BaseCurrencyMismatch` if the assignment was
    /// normalized against a different base currency than the bill
    pub fn add_item(&mut self, item: LineItemAssignment) -> Result<(), BillingError> {
        if item.base_currency() != self.base_currency {
            return Err(BillingError::BaseCurrencyMismatch {
                bill: self.base_currency,
                item: item.base_currency(),
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes the assignment at `index`, without recomputing totals
    pub fn remove_item(&mut self, index: usize) -> Option<LineItemAssignment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Assignments in display order
    pub fn items(&self) -> &[LineItemAssignment] {
        &self.items
    }

    /// Mutable access to the assignments
    ///
    /// Changes to an assignment's inputs take effect once
    /// [`LineItemAssignment::recompute_amounts`] and
    /// [`Bill::recompute_totals`] are called.
    pub fn items_mut(&mut self) -> &mut [LineItemAssignment] {
        &mut self.items
    }

    /// Returns the currency the bill resolves to from its current assignments
    pub fn resolve_currency(&self) -> Currency {
        let distinct: BTreeSet<Currency> = self.items.iter().map(|i| i.currency).collect();
        let mut iter = distinct.into_iter();
        match (iter.next(), iter.next()) {
            (Some(only), None) => only,
            _ => self.base_currency,
        }
    }

    /// Resolves the bill currency, then recomputes both totals
    ///
    /// Nothing changes when an error is returned.
    ///
    /// # Errors
    ///
    /// `BillingError::Money` if a total leaves the storable range
    pub fn recompute_totals(&mut self) -> Result<(), BillingError> {
        let currency = self.resolve_currency();

        let mut base = Money::zero(self.base_currency);
        let mut original = Money::zero(currency);
        for item in &self.items {
            base = base.checked_add(&item.base_amount())?;
            // Only reached for mixed bills, which resolve to the base currency
            let contribution = if item.currency == currency {
                item.original_amount()
            } else {
                item.base_amount()
            };
            original = original.checked_add(&contribution)?;
        }

        self.currency = currency;
        self.base_total = base;
        self.original_total = original;
        Ok(())
    }

    /// Flips the paid flag
    pub fn toggle_paid(&mut self) {
        self.paid = !self.paid;
        self.updated_at = Utc::now();
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    pub fn paid_state(&self) -> PaidState {
        if self.paid {
            PaidState::Paid
        } else {
            PaidState::Unpaid
        }
    }

    /// Moves the due date
    pub fn set_due_date(&mut self, due_date: NaiveDate) {
        self.due_date = due_date;
        self.updated_at = Utc::now();
    }

    /// Returns true if the bill is unpaid and `today` is past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.paid && today > self.due_date
    }

    /// The resolved bill currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Total in the bill currency
    pub fn original_total(&self) -> Money {
        self.original_total
    }

    /// Total in the base currency
    pub fn base_total(&self) -> Money {
        self.base_total
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    /// Rebuilds a bill from stored rows
    ///
    /// Stored currency and totals are taken as-is; assignments keep the
    /// order of `record.items`.
    pub fn restore(record: BillRecord, base_currency: Currency) -> Self {
        Self {
            id: Some(record.id),
            due_date: record.due_date,
            issuer_id: record.issuer_id,
            receiver_id: record.receiver_id,
            issuer_name: record.issuer_name,
            receiver_name: record.receiver_name,
            paid: record.paid,
            currency: record.currency,
            original_total: Money::new(record.original_total, record.currency),
            base_total: Money::new(record.base_total, base_currency),
            base_currency,
            items: record
                .items
                .into_iter()
                .map(|r| LineItemAssignment::restore(r, base_currency))
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CatalogItemId, MoneyError};
    use rust_decimal_macros::dec;

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    fn bill() -> Bill {
        Bill::new(due(), IssuerId::new(1), ReceiverId::new(2), &CurrencyRegistry::default())
    }

    fn line(quantity: u32, price: Decimal, currency: &str, rate: Decimal) -> LineItemAssignment {
        LineItemAssignment::new(
            CatalogItemId::new(1),
            quantity,
            price,
            currency,
            rate,
            &CurrencyRegistry::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_bill_defaults() {
        let b = bill();
        assert!(b.items().is_empty());
        assert!(!b.paid());
        assert_eq!(b.paid_state(), PaidState::Unpaid);
        assert_eq!(b.currency(), Currency::EUR);
        assert!(b.base_total().is_zero());
        assert!(b.original_total().is_zero());
    }

    #[test]
    fn test_add_item_does_not_recompute() {
        let mut b = bill();
        b.add_item(line(1, dec!(10), "EUR", dec!(1))).unwrap();
        assert!(b.base_total().is_zero());

        b.recompute_totals().unwrap();
        assert_eq!(b.base_total().amount(), dec!(10));
    }

    #[test]
    fn test_homogeneous_foreign_bill() {
        let mut b = bill();
        b.add_item(line(2, dec!(100), "USD", dec!(0.85))).unwrap();
        b.recompute_totals().unwrap();

        assert_eq!(b.currency(), Currency::USD);
        assert_eq!(b.original_total(), Money::new(dec!(200), Currency::USD));
        assert_eq!(b.base_total(), Money::new(dec!(170), Currency::EUR));
    }

    #[test]
    fn test_mixed_bill_uses_base_currency() {
        let mut b = bill();
        b.add_item(line(2, dec!(100), "EUR", dec!(1))).unwrap();
        b.add_item(line(1, dec!(50), "USD", dec!(0.85))).unwrap();
        b.recompute_totals().unwrap();

        assert_eq!(b.currency(), Currency::EUR);
        assert_eq!(b.base_total().amount(), dec!(242.50));
        assert_eq!(b.original_total().amount(), dec!(242.50));
    }

    #[test]
    fn test_removing_items_reresolves_currency() {
        let mut b = bill();
        b.add_item(line(1, dec!(10), "GBP", dec!(1.17))).unwrap();
        b.add_item(line(1, dec!(10), "USD", dec!(0.85))).unwrap();
        b.recompute_totals().unwrap();
        assert_eq!(b.currency(), Currency::EUR);

        assert!(b.remove_item(1).is_some());
        assert!(b.remove_item(5).is_none());
        b.recompute_totals().unwrap();
        assert_eq!(b.currency(), Currency::GBP);
        assert_eq!(b.original_total().amount(), dec!(10));
        assert_eq!(b.base_total().amount(), dec!(11.70));
    }

    #[test]
    fn test_base_currency_mismatch_rejected() {
        let mut b = Bill::with_base_currency(due(), IssuerId::new(1), ReceiverId::new(2), Currency::USD);
        let result = b.add_item(line(1, dec!(10), "EUR", dec!(1)));
        assert!(matches!(result, Err(BillingError::BaseCurrencyMismatch { .. })));
        assert!(b.items().is_empty());
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let mut b = bill();
        b.toggle_paid();
        assert_eq!(b.paid_state(), PaidState::Paid);
        b.toggle_paid();
        assert!(!b.paid());
    }

    #[test]
    fn test_overdue() {
        let mut b = bill();
        let after = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert!(!b.is_overdue(due()));
        assert!(b.is_overdue(after));

        b.toggle_paid();
        assert!(!b.is_overdue(after));
    }

    #[test]
    fn test_new_follows_registry_base_currency() {
        let b = Bill::new(due(), IssuerId::new(1), ReceiverId::new(2), &CurrencyRegistry::new(Currency::GBP));
        assert_eq!(b.base_currency(), Currency::GBP);
        assert_eq!(b.currency(), Currency::GBP);
    }

    #[test]
    fn test_total_overflow_is_an_error_and_keeps_totals() {
        let mut b = bill();
        b.add_item(line(1, dec!(10), "EUR", dec!(1))).unwrap();
        b.recompute_totals().unwrap();

        let big = line(900, dec!(999999999999.9999), "EUR", dec!(1));
        b.add_item(big.clone()).unwrap();
        b.add_item(big).unwrap();

        let result = b.recompute_totals();
        assert!(matches!(result, Err(BillingError::Money(MoneyError::InvalidAmount(_)))));
        assert_eq!(b.base_total().amount(), dec!(10));
    }
}
