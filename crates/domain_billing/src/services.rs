//! Billing domain services
//!
//! [`BillingService`] orchestrates bill creation and the bill lifecycle on
//! top of the storage and rate-lookup ports. [`ExchangeRateService`] records
//! the rates those lookups answer with.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use core_kernel::{
    AssignmentId, BillId, Currency, CurrencyRegistry, ExchangeRate, IssuerId, ReceiverId,
};

use crate::assignment::LineItemAssignment;
use crate::bill::Bill;
use crate::error::BillingError;
use crate::line_items::{parse_line_items, MalformedRowPolicy, RawLineItems, RowError};
use crate::ports::BillStore;
use crate::rates::{rate_or_fallback, RateLookup, RateQuote, RateStore};

/// Input for creating a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBillRequest {
    pub due_date: NaiveDate,
    pub issuer_id: IssuerId,
    pub receiver_id: ReceiverId,
    #[serde(default)]
    pub line_items: RawLineItems,
}

/// A stored bill together with the rows that were dropped on the way
#[derive(Debug, Clone)]
pub struct CreatedBill {
    pub bill: Bill,
    /// Rows skipped under [`MalformedRowPolicy::Skip`]
    pub skipped_rows: Vec<RowError>,
}

/// Service for creating bills and managing their lifecycle
pub struct BillingService {
    bills: Arc<dyn BillStore>,
    rates: Arc<dyn RateLookup>,
    registry: CurrencyRegistry,
    row_policy: MalformedRowPolicy,
}

impl BillingService {
    /// Creates a service with the default EUR registry and the `Reject` row policy
    pub fn new(bills: Arc<dyn BillStore>, rates: Arc<dyn RateLookup>) -> Self {
        Self {
            bills,
            rates,
            registry: CurrencyRegistry::default(),
            row_policy: MalformedRowPolicy::default(),
        }
    }

    pub fn with_registry(mut self, registry: CurrencyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_row_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    pub fn row_policy(&self) -> MalformedRowPolicy {
        self.row_policy
    }

    /// The underlying bill store, for health checks
    pub fn store(&self) -> &Arc<dyn BillStore> {
        &self.bills
    }

    /// Creates and stores a bill from raw line-item rows
    ///
    /// This method:
    /// 1. Parses the rows under the configured row policy
    /// 2. Looks up missing rates for foreign-currency rows, falling back to 1
    /// 3. Builds the assignments and computes the bill totals
    /// 4. Stores the bill and its assignments atomically
    ///
    /// # Errors
    ///
    /// - `BillingError::Validation` / `InvalidLineItems` for bad input
    /// - `BillingError::Money` if a line amount or total leaves the storable range
    /// - `BillingError::Port` if storage fails, e.g. `Conflict` for an unknown
    ///   issuer, receiver or item
    #[instrument(skip(self, request), fields(issuer_id = %request.issuer_id, receiver_id = %request.receiver_id, rows = request.line_items.len()))]
    pub async fn create_bill(&self, request: NewBillRequest) -> Result<CreatedBill, BillingError> {
        let parsed = parse_line_items(&request.line_items, &self.registry, self.row_policy)?;
        let base = self.registry.default_currency();

        let mut bill = Bill::new(
            request.due_date,
            request.issuer_id,
            request.receiver_id,
            &self.registry,
        );

        for draft in parsed.drafts {
            let rate = match draft.exchange_rate {
                Some(rate) => rate,
                None if self.registry.is_default(draft.currency) => Decimal::ONE,
                None => rate_or_fallback(self.rates.as_ref(), draft.currency, base).await,
            };
            debug!(row = draft.row, currency = %draft.currency, %rate, "Building line item");

            let assignment = LineItemAssignment::new(
                draft.item_id,
                draft.quantity,
                draft.unit_price,
                draft.currency.code(),
                rate,
                &self.registry,
            )?;
            bill.add_item(assignment)?;
        }

        bill.recompute_totals()?;
        self.bills.create_bill(&mut bill).await?;

        info!(
            bill_id = ?bill.id,
            currency = %bill.currency(),
            base_total = %bill.base_total().amount(),
            items = bill.items().len(),
            "Bill created"
        );

        Ok(CreatedBill {
            bill,
            skipped_rows: parsed.skipped,
        })
    }

    /// Loads a bill, or `None` if it does not exist
    pub async fn get_bill(&self, id: BillId) -> Result<Option<Bill>, BillingError> {
        Ok(self.bills.get_bill(id).await?)
    }

    /// Loads a bill that must exist
    pub async fn require_bill(&self, id: BillId) -> Result<Bill, BillingError> {
        self.get_bill(id)
            .await?
            .ok_or(BillingError::BillNotFound(id))
    }

    /// Loads every bill, newest first
    pub async fn list_bills(&self) -> Result<Vec<Bill>, BillingError> {
        Ok(self.bills.list_bills().await?)
    }

    /// Flips a bill's paid flag and stores it
    #[instrument(skip(self))]
    pub async fn toggle_paid(&self, id: BillId) -> Result<Bill, BillingError> {
        let mut bill = self.require_bill(id).await?;
        bill.toggle_paid();
        self.update(&bill).await?;

        info!(bill_id = %id, paid = bill.paid(), "Bill paid state toggled");
        Ok(bill)
    }

    /// Moves a bill's due date
    #[instrument(skip(self))]
    pub async fn reschedule(&self, id: BillId, due_date: NaiveDate) -> Result<Bill, BillingError> {
        let mut bill = self.require_bill(id).await?;
        bill.set_due_date(due_date);
        self.update(&bill).await?;
        Ok(bill)
    }

    /// Removes one line item and stores the recomputed totals
    ///
    /// The assignment delete and the bill rewrite are stored as one unit.
    #[instrument(skip(self))]
    pub async fn remove_line_item(
        &self,
        id: BillId,
        assignment_id: AssignmentId,
    ) -> Result<Bill, BillingError> {
        let mut bill = self.require_bill(id).await?;
        let index = bill
            .items()
            .iter()
            .position(|i| i.id == Some(assignment_id))
            .ok_or_else(|| {
                BillingError::validation(format!("{} is not a line item of {}", assignment_id, id))
            })?;

        bill.remove_item(index);
        bill.recompute_totals()?;
        self.bills.remove_assignment(&bill, assignment_id).await?;

        info!(bill_id = %id, %assignment_id, currency = %bill.currency(), "Line item removed");
        Ok(bill)
    }

    /// Deletes a bill: its assignments first, then the bill row
    #[instrument(skip(self))]
    pub async fn delete_bill(&self, id: BillId) -> Result<(), BillingError> {
        let removed = self.bills.delete_assignments_by_bill(id).await?;
        self.bills.delete_bill(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::BillNotFound(id)
            } else {
                BillingError::Port(e)
            }
        })?;

        info!(bill_id = %id, assignments = removed, "Bill deleted");
        Ok(())
    }

    async fn update(&self, bill: &Bill) -> Result<(), BillingError> {
        self.bills.update_bill(bill).await.map_err(|e| match bill.id {
            Some(id) if e.is_not_found() => BillingError::BillNotFound(id),
            _ => BillingError::Port(e),
        })
    }
}

/// Upper bound on the number of history entries a single overview returns
pub const MAX_RATE_HISTORY: u32 = 100;

/// The rate a pair currently resolves to, with its recorded history
#[derive(Debug, Clone, Serialize)]
pub struct RateOverview {
    pub from: Currency,
    pub to: Currency,
    /// What bill creation would use for the pair, `None` if nothing is known
    pub current: Option<Decimal>,
    /// Recorded quotes for the pair, newest first
    pub history: Vec<RateQuote>,
}

/// Service for recording exchange rates and inspecting what lookups resolve to
pub struct ExchangeRateService {
    rates: Arc<dyn RateStore>,
}

impl ExchangeRateService {
    pub fn new(rates: Arc<dyn RateStore>) -> Self {
        Self { rates }
    }

    /// The underlying rate store, for health checks
    pub fn store(&self) -> &Arc<dyn RateStore> {
        &self.rates
    }

    /// Records a rate captured now
    ///
    /// # Errors
    ///
    /// - `BillingError::Money` for an unsupported currency code or an invalid rate
    /// - `BillingError::Validation` if both currencies are the same
    #[instrument(skip(self))]
    pub async fn record_rate(
        &self,
        from: &str,
        to: &str,
        rate: Decimal,
    ) -> Result<RateQuote, BillingError> {
        let from: Currency = from.parse()?;
        let to: Currency = to.parse()?;
        if from == to {
            return Err(BillingError::validation(format!(
                "a rate needs two different currencies, got {} twice",
                from
            )));
        }

        let mut quote = RateQuote::new(ExchangeRate::new(from, to, rate)?);
        self.rates.record_rate(&mut quote).await?;

        info!(rate_id = ?quote.id, %from, %to, %rate, "Exchange rate recorded");
        Ok(quote)
    }

    /// Resolves a pair and lists its recorded history
    ///
    /// `limit` is capped at [`MAX_RATE_HISTORY`].
    pub async fn overview(
        &self,
        from: &str,
        to: &str,
        limit: u32,
    ) -> Result<RateOverview, BillingError> {
        let from: Currency = from.parse()?;
        let to: Currency = to.parse()?;

        let current = self.rates.rate(from, to).await?;
        let history = self
            .rates
            .rate_history(from, to, limit.min(MAX_RATE_HISTORY))
            .await?;
        debug!(%from, %to, ?current, entries = history.len(), "Rate overview");

        Ok(RateOverview {
            from,
            to,
            current,
            history,
        })
    }
}
