//! PostgreSQL Bill Adapter
//!
//! Implements the `BillStore` port on top of [`BillRepository`]. The adapter
//! is constructed with the currency registry so that stored base amounts are
//! read back in the configured base currency.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillAdapter;
//! use domain_billing::BillStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn BillStore> = Arc::new(PostgresBillAdapter::new(pool, registry));
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AssignmentId, BillId, CatalogItemId, CurrencyRegistry, DomainPort, HealthCheckResult,
    HealthCheckable, IssuerId, Money, PortError, ReceiverId,
};
use domain_billing::{
    AssignmentRecord, Bill, BillRecord, BillStore, CatalogItem, LineItemAssignment,
};

use crate::adapters::{check_pool, db_to_port_error, stored_currency};
use crate::repositories::bills::{
    AssignmentRow, BillRepository, BillWithAssignments, NewAssignment, NewBill,
};

/// PostgreSQL-backed implementation of the BillStore port
#[derive(Debug, Clone)]
pub struct PostgresBillAdapter {
    repository: BillRepository,
    pool: PgPool,
    registry: CurrencyRegistry,
}

impl PostgresBillAdapter {
    /// Creates a new PostgreSQL bill adapter
    pub fn new(pool: PgPool, registry: CurrencyRegistry) -> Self {
        Self {
            repository: BillRepository::new(pool.clone()),
            pool,
            registry,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillRepository {
        &self.repository
    }

    fn to_domain(&self, data: BillWithAssignments) -> Result<Bill, PortError> {
        let row = data.bill;
        let items = data
            .assignments
            .into_iter()
            .map(row_to_assignment_record)
            .collect::<Result<Vec<_>, _>>()?;

        let record = BillRecord {
            id: BillId::new(row.id),
            due_date: row.due_date,
            issuer_id: IssuerId::new(row.issuer_id),
            receiver_id: ReceiverId::new(row.receiver_id),
            issuer_name: row.issuer_name,
            receiver_name: row.receiver_name,
            paid: row.paid,
            currency: stored_currency(&row.currency)?,
            original_total: row.original_total,
            base_total: row.eur_total,
            items,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok(Bill::restore(record, self.registry.default_currency()))
    }
}

impl DomainPort for PostgresBillAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-bill-adapter").await
    }
}

#[async_trait]
impl BillStore for PostgresBillAdapter {
    #[instrument(skip(self, bill), fields(items = bill.items().len()))]
    async fn create_bill(&self, bill: &mut Bill) -> Result<(), PortError> {
        let assignments = bill
            .items()
            .iter()
            .map(assignment_to_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids = self
            .repository
            .create_with_assignments(bill_to_row(bill), assignments)
            .await
            .map_err(db_to_port_error)?;

        let bill_id = BillId::new(ids.bill_id);
        bill.id = Some(bill_id);
        for (item, id) in bill.items_mut().iter_mut().zip(ids.assignment_ids) {
            item.id = Some(AssignmentId::new(id));
            item.bill_id = Some(bill_id);
        }

        debug!(%bill_id, "Bill stored");
        Ok(())
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    async fn get_bill(&self, id: BillId) -> Result<Option<Bill>, PortError> {
        debug!("Fetching bill by ID");
        self.repository
            .find_by_id(id.get())
            .await
            .map_err(db_to_port_error)?
            .map(|data| self.to_domain(data))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_bills(&self) -> Result<Vec<Bill>, PortError> {
        self.repository
            .list_all()
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(|data| self.to_domain(data))
            .collect()
    }

    #[instrument(skip(self, bill), fields(bill_id = ?bill.id))]
    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError> {
        let id = bill
            .id
            .ok_or_else(|| PortError::validation_field("bill has not been stored", "id"))?;

        self.repository
            .update(id.get(), bill_to_row(bill))
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    async fn delete_bill(&self, id: BillId) -> Result<(), PortError> {
        self.repository.delete(id.get()).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    async fn delete_assignments_by_bill(&self, id: BillId) -> Result<u64, PortError> {
        self.repository
            .delete_assignments_by_bill(id.get())
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, bill), fields(bill_id = ?bill.id, %assignment_id))]
    async fn remove_assignment(
        &self,
        bill: &Bill,
        assignment_id: AssignmentId,
    ) -> Result<(), PortError> {
        let id = bill
            .id
            .ok_or_else(|| PortError::validation_field("bill has not been stored", "id"))?;

        self.repository
            .remove_assignment(id.get(), assignment_id.get(), bill_to_row(bill))
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn bill_to_row(bill: &Bill) -> NewBill {
    NewBill {
        due_date: bill.due_date,
        currency: bill.currency().code().to_string(),
        original_total: bill.original_total().amount(),
        eur_total: bill.base_total().amount(),
        paid: bill.paid(),
        issuer_id: bill.issuer_id.get(),
        receiver_id: bill.receiver_id.get(),
        created_at: bill.created_at,
        updated_at: bill.updated_at,
    }
}

fn assignment_to_row(item: &LineItemAssignment) -> Result<NewAssignment, PortError> {
    let quantity = i32::try_from(item.quantity).map_err(|_| {
        PortError::validation_field(format!("quantity {} is too large", item.quantity), "quantity")
    })?;

    Ok(NewAssignment {
        item_id: item.item_id.get(),
        quantity,
        price: item.unit_price,
        currency: item.currency.code().to_string(),
        exchange_rate: item.exchange_rate,
        original_amount: item.original_amount().amount(),
        eur_amount: item.base_amount().amount(),
        created_at: item.created_at,
        updated_at: item.updated_at,
    })
}

fn row_to_assignment_record(row: AssignmentRow) -> Result<AssignmentRecord, PortError> {
    let quantity = u32::try_from(row.quantity)
        .map_err(|_| PortError::internal(format!("stored quantity is invalid: {}", row.quantity)))?;

    let item = match (row.item_name, row.item_price, row.item_currency) {
        (Some(name), Some(price), Some(currency)) => Some(CatalogItem {
            id: Some(CatalogItemId::new(row.item_id)),
            name,
            price: Money::new(price, stored_currency(&currency)?),
            created_at: row.item_created_at.unwrap_or(row.created_at),
            updated_at: row.item_updated_at.unwrap_or(row.updated_at),
        }),
        _ => None,
    };

    Ok(AssignmentRecord {
        id: AssignmentId::new(row.id),
        bill_id: BillId::new(row.bill_id),
        item_id: CatalogItemId::new(row.item_id),
        item,
        quantity,
        unit_price: row.price,
        currency: stored_currency(&row.currency)?,
        exchange_rate: row.exchange_rate,
        original_amount: row.original_amount,
        base_amount: row.eur_amount,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
