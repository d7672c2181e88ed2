//! Billing Domain Ports
//!
//! Storage interfaces the billing domain needs. The PostgreSQL adapters in
//! `infra_db` implement them for production; `test_utils` provides in-memory
//! versions with the same referential rules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_billing::ports::BillStore;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn BillStore> = Arc::new(PostgresBillAdapter::new(pool, registry));
//! let bill = store.get_bill(id).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    AssignmentId, BillId, CatalogItemId, DomainPort, HealthCheckable, IssuerId, PortError,
    ReceiverId,
};

use crate::bill::Bill;
use crate::catalog::CatalogItem;
use crate::party::{Issuer, Receiver};

/// Persistence gateway for bills and their line-item assignments
#[async_trait]
pub trait BillStore: DomainPort + HealthCheckable {
    /// Stores a new bill with all of its assignments as one unit
    ///
    /// On success the generated identities are written back onto `bill` and
    /// each of its assignments. On failure nothing is stored and `bill` is
    /// left without identities.
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the bill references an unknown issuer,
    /// receiver or catalog item
    async fn create_bill(&self, bill: &mut Bill) -> Result<(), PortError>;

    /// Loads a bill with party names and assignments, or `None` if it does not exist
    async fn get_bill(&self, id: BillId) -> Result<Option<Bill>, PortError>;

    /// Loads every bill, newest first
    ///
    /// Each bill is hydrated with its own follow-up queries, so this scales
    /// linearly in round-trips with the number of bills.
    async fn list_bills(&self) -> Result<Vec<Bill>, PortError>;

    /// Rewrites the bill row and refreshes `updated_at`; assignments are untouched
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if the bill is not stored
    async fn update_bill(&self, bill: &Bill) -> Result<(), PortError>;

    /// Deletes the bill row only
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if the bill is not stored, `PortError::Conflict`
    /// while assignments still reference it
    async fn delete_bill(&self, id: BillId) -> Result<(), PortError>;

    /// Deletes every assignment of a bill, returning how many were removed
    async fn delete_assignments_by_bill(&self, id: BillId) -> Result<u64, PortError>;

    /// Deletes one assignment and rewrites the bill row as one unit
    ///
    /// `bill` carries the totals recomputed without the assignment. Either
    /// both writes happen or neither does.
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if the bill is not stored or the assignment is
    /// not one of its line items
    async fn remove_assignment(
        &self,
        bill: &Bill,
        assignment_id: AssignmentId,
    ) -> Result<(), PortError>;
}

/// Address book and catalog storage
///
/// Deleting a row that bills or assignments still reference fails with
/// `PortError::Conflict`.
#[async_trait]
pub trait DirectoryStore: DomainPort + HealthCheckable {
    // Issuers
    async fn create_issuer(&self, issuer: &mut Issuer) -> Result<(), PortError>;
    async fn get_issuer(&self, id: IssuerId) -> Result<Option<Issuer>, PortError>;
    async fn list_issuers(&self) -> Result<Vec<Issuer>, PortError>;
    async fn update_issuer(&self, issuer: &Issuer) -> Result<(), PortError>;
    async fn delete_issuer(&self, id: IssuerId) -> Result<(), PortError>;

    // Receivers
    async fn create_receiver(&self, receiver: &mut Receiver) -> Result<(), PortError>;
    async fn get_receiver(&self, id: ReceiverId) -> Result<Option<Receiver>, PortError>;
    async fn list_receivers(&self) -> Result<Vec<Receiver>, PortError>;
    async fn update_receiver(&self, receiver: &Receiver) -> Result<(), PortError>;
    async fn delete_receiver(&self, id: ReceiverId) -> Result<(), PortError>;

    // Catalog items
    async fn create_item(&self, item: &mut CatalogItem) -> Result<(), PortError>;
    async fn get_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, PortError>;
    async fn list_items(&self) -> Result<Vec<CatalogItem>, PortError>;
    async fn update_item(&self, item: &CatalogItem) -> Result<(), PortError>;
    async fn delete_item(&self, id: CatalogItemId) -> Result<(), PortError>;
}
