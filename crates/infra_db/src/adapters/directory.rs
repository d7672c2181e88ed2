//! PostgreSQL Directory Adapter
//!
//! Implements the `DirectoryStore` port (issuers, receivers and catalog
//! items) on top of the party and catalog repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{
    CatalogItemId, DomainPort, HealthCheckResult, HealthCheckable, IssuerId, Money, PortError,
    ReceiverId,
};
use domain_billing::{Address, CatalogItem, DirectoryStore, Issuer, Party, Receiver};

use crate::adapters::{check_pool, db_to_port_error, stored_currency};
use crate::repositories::catalog::{CatalogItemRow, CatalogRepository, NewCatalogItem};
use crate::repositories::parties::{NewParty, PartyRepository, PartyRow};

/// PostgreSQL-backed implementation of the DirectoryStore port
#[derive(Debug, Clone)]
pub struct PostgresDirectoryAdapter {
    issuers: PartyRepository,
    receivers: PartyRepository,
    catalog: CatalogRepository,
    pool: PgPool,
}

impl PostgresDirectoryAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            issuers: PartyRepository::issuers(pool.clone()),
            receivers: PartyRepository::receivers(pool.clone()),
            catalog: CatalogRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresDirectoryAdapter {}

#[async_trait]
impl HealthCheckable for PostgresDirectoryAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        check_pool(&self.pool, "postgres-directory-adapter").await
    }
}

#[async_trait]
impl DirectoryStore for PostgresDirectoryAdapter {
    // -------------------------------------------------------------------------
    // Issuers
    // -------------------------------------------------------------------------

    #[instrument(skip(self, issuer), fields(name = %issuer.name))]
    async fn create_issuer(&self, issuer: &mut Issuer) -> Result<(), PortError> {
        let row = self
            .issuers
            .insert(party_to_row(issuer))
            .await
            .map_err(db_to_port_error)?;
        *issuer = row_to_party(row, IssuerId::new);
        Ok(())
    }

    async fn get_issuer(&self, id: IssuerId) -> Result<Option<Issuer>, PortError> {
        let row = self.issuers.find_by_id(id.get()).await.map_err(db_to_port_error)?;
        Ok(row.map(|r| row_to_party(r, IssuerId::new)))
    }

    async fn list_issuers(&self) -> Result<Vec<Issuer>, PortError> {
        let rows = self.issuers.list().await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(|r| row_to_party(r, IssuerId::new)).collect())
    }

    #[instrument(skip(self, issuer), fields(issuer_id = ?issuer.id))]
    async fn update_issuer(&self, issuer: &Issuer) -> Result<(), PortError> {
        let id = issuer
            .id
            .ok_or_else(|| PortError::validation_field("issuer has not been stored", "id"))?;
        self.issuers
            .update(id.get(), party_to_row(issuer))
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(issuer_id = %id))]
    async fn delete_issuer(&self, id: IssuerId) -> Result<(), PortError> {
        self.issuers.delete(id.get()).await.map_err(db_to_port_error)
    }

    // -------------------------------------------------------------------------
    // Receivers
    // -------------------------------------------------------------------------

    #[instrument(skip(self, receiver), fields(name = %receiver.name))]
    async fn create_receiver(&self, receiver: &mut Receiver) -> Result<(), PortError> {
        let row = self
            .receivers
            .insert(party_to_row(receiver))
            .await
            .map_err(db_to_port_error)?;
        *receiver = row_to_party(row, ReceiverId::new);
        Ok(())
    }

    async fn get_receiver(&self, id: ReceiverId) -> Result<Option<Receiver>, PortError> {
        let row = self.receivers.find_by_id(id.get()).await.map_err(db_to_port_error)?;
        Ok(row.map(|r| row_to_party(r, ReceiverId::new)))
    }

    async fn list_receivers(&self) -> Result<Vec<Receiver>, PortError> {
        let rows = self.receivers.list().await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(|r| row_to_party(r, ReceiverId::new)).collect())
    }

    #[instrument(skip(self, receiver), fields(receiver_id = ?receiver.id))]
    async fn update_receiver(&self, receiver: &Receiver) -> Result<(), PortError> {
        let id = receiver
            .id
            .ok_or_else(|| PortError::validation_field("receiver has not been stored", "id"))?;
        self.receivers
            .update(id.get(), party_to_row(receiver))
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(receiver_id = %id))]
    async fn delete_receiver(&self, id: ReceiverId) -> Result<(), PortError> {
        self.receivers.delete(id.get()).await.map_err(db_to_port_error)
    }

    // -------------------------------------------------------------------------
    // Catalog items
    // -------------------------------------------------------------------------

    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create_item(&self, item: &mut CatalogItem) -> Result<(), PortError> {
        let row = self
            .catalog
            .insert(item_to_row(item))
            .await
            .map_err(db_to_port_error)?;
        *item = row_to_item(row)?;
        Ok(())
    }

    async fn get_item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, PortError> {
        self.catalog
            .find_by_id(id.get())
            .await
            .map_err(db_to_port_error)?
            .map(row_to_item)
            .transpose()
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, PortError> {
        self.catalog
            .list()
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_item)
            .collect()
    }

    #[instrument(skip(self, item), fields(item_id = ?item.id))]
    async fn update_item(&self, item: &CatalogItem) -> Result<(), PortError> {
        let id = item
            .id
            .ok_or_else(|| PortError::validation_field("item has not been stored", "id"))?;
        self.catalog
            .update(id.get(), item_to_row(item))
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn delete_item(&self, id: CatalogItemId) -> Result<(), PortError> {
        self.catalog.delete(id.get()).await.map_err(db_to_port_error)
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn party_to_row<Id>(party: &Party<Id>) -> NewParty {
    NewParty {
        name: party.name.clone(),
        vat_number: party.vat_number.clone(),
        street: party.address.street.clone(),
        city: party.address.city.clone(),
        state: party.address.state.clone(),
        zip_code: party.address.zip_code.clone(),
        country: party.address.country.clone(),
        created_at: party.created_at,
    }
}

fn row_to_party<Id>(row: PartyRow, id: impl Fn(i64) -> Id) -> Party<Id> {
    Party {
        id: Some(id(row.id)),
        name: row.name,
        vat_number: row.vat_number,
        address: Address {
            street: row.street,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            country: row.country,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn item_to_row(item: &CatalogItem) -> NewCatalogItem {
    NewCatalogItem {
        name: item.name.clone(),
        price: item.price.amount(),
        currency: item.price.currency().code().to_string(),
        created_at: item.created_at,
    }
}

fn row_to_item(row: CatalogItemRow) -> Result<CatalogItem, PortError> {
    Ok(CatalogItem {
        id: Some(CatalogItemId::new(row.id)),
        name: row.name,
        price: Money::new(row.price, stored_currency(&row.currency)?),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
