//! In-Memory Storage Adapters
//!
//! [`InMemoryBillingStore`] implements `BillStore`, `DirectoryStore` and
//! `RateStore` on shared in-process state. It enforces the same referential rules as the
//! PostgreSQL schema, so service and HTTP tests see the same conflicts:
//!
//! - bills must reference an existing issuer and receiver
//! - assignments must reference an existing catalog item
//! - a bill cannot be deleted while assignments reference it
//! - issuers, receivers and items cannot be deleted while referenced
//!
//! `create_bill` validates every reference before writing anything, so a
//! failed create leaves no partial state. [`InMemoryBillingStore::set_unavailable`]
//! makes every write fail, for exercising error paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::{
    AssignmentId, BillId, CatalogItemId, Currency, CurrencyRegistry, DomainPort, ExchangeRate,
    ExchangeRateId, HealthCheckResult, HealthCheckable, IssuerId, PortError, ReceiverId,
};
use domain_billing::{
    usable_inverse, AssignmentRecord, Bill, BillRecord, BillStore, CatalogItem, DirectoryStore,
    Issuer, LineItemAssignment, RateLookup, RateQuote, RateStore, Receiver,
};

const ADAPTER_ID: &str = "in-memory-billing-store";

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    issuers: BTreeMap<i64, Issuer>,
    receivers: BTreeMap<i64, Receiver>,
    items: BTreeMap<i64, CatalogItem>,
    bills: BTreeMap<i64, Bill>,
    assignments: BTreeMap<i64, LineItemAssignment>,
    rates: Vec<RateQuote>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_parties(&self, bill: &Bill) -> Result<(), PortError> {
        if !self.issuers.contains_key(&bill.issuer_id.get()) {
            return Err(PortError::conflict(format!("unknown issuer {}", bill.issuer_id)));
        }
        if !self.receivers.contains_key(&bill.receiver_id.get()) {
            return Err(PortError::conflict(format!("unknown receiver {}", bill.receiver_id)));
        }
        Ok(())
    }

    /// Overwrites a stored bill row, keeping its creation time
    fn rewrite_bill(&mut self, id: BillId, bill: &Bill) -> Result<(), PortError> {
        let stored = self
            .bills
            .get_mut(&id.get())
            .ok_or_else(|| PortError::not_found("Bill", id))?;

        let created_at = stored.created_at;
        *stored = bill.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(())
    }

    fn latest_rate(&self, from: Currency, to: Currency) -> Option<&ExchangeRate> {
        self.rates
            .iter()
            .filter(|q| q.rate.from() == from && q.rate.to() == to)
            .max_by_key(|q| (q.captured_at, q.id))
            .map(|q| &q.rate)
    }

    fn hydrate(&self, id: i64, registry: &CurrencyRegistry) -> Option<Bill> {
        let stored = self.bills.get(&id)?;
        let bill_id = BillId::new(id);

        let items = self
            .assignments
            .iter()
            .filter(|(_, a)| a.bill_id == Some(bill_id))
            .map(|(assignment_id, a)| AssignmentRecord {
                id: AssignmentId::new(*assignment_id),
                bill_id,
                item_id: a.item_id,
                item: self.items.get(&a.item_id.get()).cloned(),
                quantity: a.quantity,
                unit_price: a.unit_price,
                currency: a.currency,
                exchange_rate: a.exchange_rate,
                original_amount: a.original_amount().amount(),
                base_amount: a.base_amount().amount(),
                created_at: a.created_at,
                updated_at: a.updated_at,
            })
            .collect();

        let record = BillRecord {
            id: bill_id,
            due_date: stored.due_date,
            issuer_id: stored.issuer_id,
            receiver_id: stored.receiver_id,
            issuer_name: self.issuers.get(&stored.issuer_id.get()).map(|p| p.name.clone()),
            receiver_name: self.receivers.get(&stored.receiver_id.get()).map(|p| p.name.clone()),
            paid: stored.paid(),
            currency: stored.currency(),
            original_total: stored.original_total().amount(),
            base_total: stored.base_total().amount(),
            items,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        };

        Some(Bill::restore(record, registry.default_currency()))
    }
}

/// In-memory implementation of the billing storage ports
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    state: Mutex<State>,
    registry: CurrencyRegistry,
    unavailable: AtomicBool,
}

impl InMemoryBillingStore {
    /// Creates an empty store reading base amounts in the registry's base currency
    pub fn new(registry: CurrencyRegistry) -> Self {
        Self {
            state: Mutex::new(State::default()),
            registry,
            unavailable: AtomicBool::new(false),
        }
    }

    /// While set, every write fails with `PortError::ServiceUnavailable`
    /// and leaves the state untouched. Reads keep working.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored assignments across all bills
    pub fn assignment_count(&self) -> usize {
        self.lock().assignments.len()
    }

    /// Number of stored bills
    pub fn bill_count(&self) -> usize {
        self.lock().bills.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test panicked mid-write
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_for_write(&self) -> Result<MutexGuard<'_, State>, PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::unavailable(ADAPTER_ID));
        }
        Ok(self.lock())
    }
}

impl DomainPort for InMemoryBillingStore {}

#[async_trait]
impl HealthCheckable for InMemoryBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy(ADAPTER_ID)
    }
}

#[async_trait]
impl BillStore for InMemoryBillingStore {
    async fn create_bill(&self, bill: &mut Bill) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;

        state.check_parties(bill)?;
        if let Some(missing) = bill
            .items()
            .iter()
            .find(|a| !state.items.contains_key(&a.item_id.get()))
        {
            return Err(PortError::conflict(format!("unknown item {}", missing.item_id)));
        }

        let bill_id = BillId::new(state.next_id());
        bill.id = Some(bill_id);
        for item in bill.items_mut() {
            let id = state.next_id();
            item.id = Some(AssignmentId::new(id));
            item.bill_id = Some(bill_id);
            state.assignments.insert(id, item.clone());
        }
        state.bills.insert(bill_id.get(), bill.clone());
        Ok(())
    }

    async fn get_bill(&self, id: BillId) -> Result<Option<Bill>, PortError> {
        Ok(self.lock().hydrate(id.get(), &self.registry))
    }

    async fn list_bills(&self) -> Result<Vec<Bill>, PortError> {
        let state = self.lock();
        let mut bills: Vec<Bill> = state
            .bills
            .keys()
            .filter_map(|id| state.hydrate(*id, &self.registry))
            .collect();
        bills.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bills)
    }

    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError> {
        let id = bill
            .id
            .ok_or_else(|| PortError::validation_field("bill has not been stored", "id"))?;

        let mut state = self.lock_for_write()?;
        state.check_parties(bill)?;
        state.rewrite_bill(id, bill)
    }

    async fn delete_bill(&self, id: BillId) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        if !state.bills.contains_key(&id.get()) {
            return Err(PortError::not_found("Bill", id));
        }
        if state.assignments.values().any(|a| a.bill_id == Some(id)) {
            return Err(PortError::conflict(format!("{} still has line items", id)));
        }
        state.bills.remove(&id.get());
        Ok(())
    }

    async fn delete_assignments_by_bill(&self, id: BillId) -> Result<u64, PortError> {
        let mut state = self.lock_for_write()?;
        let before = state.assignments.len();
        state.assignments.retain(|_, a| a.bill_id != Some(id));
        Ok((before - state.assignments.len()) as u64)
    }

    async fn remove_assignment(
        &self,
        bill: &Bill,
        assignment_id: AssignmentId,
    ) -> Result<(), PortError> {
        let id = bill
            .id
            .ok_or_else(|| PortError::validation_field("bill has not been stored", "id"))?;

        let mut state = self.lock_for_write()?;
        state.check_parties(bill)?;
        let owner = state
            .assignments
            .get(&assignment_id.get())
            .and_then(|a| a.bill_id);
        if owner != Some(id) {
            return Err(PortError::not_found("Assignment", assignment_id));
        }

        state.rewrite_bill(id, bill)?;
        state.assignments.remove(&assignment_id.get());
        Ok(())
    }
}

#[async_trait]
impl RateLookup for InMemoryBillingStore {
    async fn rate(&self, from: Currency, to: Currency) -> Result<Option<Decimal>, PortError> {
        if from == to {
            return Ok(Some(Decimal::ONE));
        }
        let state = self.lock();
        if let Some(rate) = state.latest_rate(from, to) {
            return Ok(Some(rate.rate()));
        }
        Ok(state.latest_rate(to, from).and_then(usable_inverse))
    }
}

#[async_trait]
impl RateStore for InMemoryBillingStore {
    async fn record_rate(&self, quote: &mut RateQuote) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        quote.id = Some(ExchangeRateId::new(state.next_id()));
        state.rates.push(quote.clone());
        Ok(())
    }

    async fn rate_history(
        &self,
        from: Currency,
        to: Currency,
        limit: u32,
    ) -> Result<Vec<RateQuote>, PortError> {
        let state = self.lock();
        let mut history: Vec<RateQuote> = state
            .rates
            .iter()
            .filter(|q| q.rate.from() == from && q.rate.to() == to)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.captured_at.cmp(&a.captured_at).then(b.id.cmp(&a.id)));
        history.truncate(limit as usize);
        Ok(history)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryBillingStore {
    async fn create_issuer(&self, issuer: &mut Issuer) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        let id = state.next_id();
        issuer.id = Some(IssuerId::new(id));
        state.issuers.insert(id, issuer.clone());
        Ok(())
    }

    async fn get_issuer(&self, id: IssuerId) -> Result<Option<Issuer>, PortError> {
        Ok(self.lock().issuers.get(&id.get()).cloned())
    }

    async fn list_issuers(&self) -> Result<Vec<Issuer>, PortError> {
        let mut issuers: Vec<Issuer> = self.lock().issuers.values().cloned().collect();
        issuers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(issuers)
    }

    async fn update_issuer(&self, issuer: &Issuer) -> Result<(), PortError> {
        let id = issuer
            .id
            .ok_or_else(|| PortError::validation_field("issuer has not been stored", "id"))?;
        let mut state = self.lock_for_write()?;
        let stored = state
            .issuers
            .get_mut(&id.get())
            .ok_or_else(|| PortError::not_found("Issuer", id))?;
        *stored = issuer.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_issuer(&self, id: IssuerId) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        if state.bills.values().any(|b| b.issuer_id == id) {
            return Err(PortError::conflict(format!("{} is referenced by bills", id)));
        }
        state
            .issuers
            .remove(&id.get())
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("Issuer", id))
    }

    async fn create_receiver(&self, receiver: &mut Receiver) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        let id = state.next_id();
        receiver.id = Some(ReceiverId::new(id));
        state.receivers.insert(id, receiver.clone());
        Ok(())
    }

    async fn get_receiver(&self, id: ReceiverId) -> Result<Option<Receiver>, PortError> {
        Ok(self.lock().receivers.get(&id.get()).cloned())
    }

    async fn list_receivers(&self) -> Result<Vec<Receiver>, PortError> {
        let mut receivers: Vec<Receiver> = self.lock().receivers.values().cloned().collect();
        receivers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(receivers)
    }

    async fn update_receiver(&self, receiver: &Receiver) -> Result<(), PortError> {
        let id = receiver
            .id
            .ok_or_else(|| PortError::validation_field("receiver has not been stored", "id"))?;
        let mut state = self.lock_for_write()?;
        let stored = state
            .receivers
            .get_mut(&id.get())
            .ok_or_else(|| PortError::not_found("Receiver", id))?;
        *stored = receiver.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_receiver(&self, id: ReceiverId) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        if state.bills.values().any(|b| b.receiver_id == id) {
            return Err(PortError::conflict(format!("{} is referenced by bills", id)));
        }
        state
            .receivers
            .remove(&id.get())
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("Receiver", id))
    }

    async fn create_item(&self, item: &mut CatalogItem) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        let id = state.next_id();
        item.id = Some(CatalogItemId::new(id));
        state.items.insert(id, item.clone());
        Ok(())
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, PortError> {
        Ok(self.lock().items.get(&id.get()).cloned())
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, PortError> {
        let mut items: Vec<CatalogItem> = self.lock().items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn update_item(&self, item: &CatalogItem) -> Result<(), PortError> {
        let id = item
            .id
            .ok_or_else(|| PortError::validation_field("item has not been stored", "id"))?;
        let mut state = self.lock_for_write()?;
        let stored = state
            .items
            .get_mut(&id.get())
            .ok_or_else(|| PortError::not_found("CatalogItem", id))?;
        *stored = item.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_item(&self, id: CatalogItemId) -> Result<(), PortError> {
        let mut state = self.lock_for_write()?;
        if state.assignments.values().any(|a| a.item_id == id) {
            return Err(PortError::conflict(format!("{} is referenced by line items", id)));
        }
        state
            .items
            .remove(&id.get())
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("CatalogItem", id))
    }
}
