//! Catalog repository implementation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// Repository for reusable priced items (`bill_items`)
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an item and returns the stored row
    pub async fn insert(&self, item: NewCatalogItem) -> Result<CatalogItemRow, DatabaseError> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            r#"
            INSERT INTO bill_items (name, price, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, name, price, currency, created_at, updated_at
            "#,
        )
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.currency)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<CatalogItemRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CatalogItemRow>(
            "SELECT id, name, price, currency, created_at, updated_at FROM bill_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All items ordered by name
    pub async fn list(&self) -> Result<Vec<CatalogItemRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CatalogItemRow>(
            "SELECT id, name, price, currency, created_at, updated_at FROM bill_items ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rewrites an item, returning the new `updated_at`
    pub async fn update(&self, id: i64, item: NewCatalogItem) -> Result<DateTime<Utc>, DatabaseError> {
        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE bill_items SET name = $2, price = $3, currency = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.currency)
        .fetch_optional(&self.pool)
        .await?;

        updated_at.ok_or_else(|| DatabaseError::not_found("CatalogItem", id))
    }

    /// Deletes an item; fails with `ForeignKeyViolation` while assignments reference it
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM bill_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("CatalogItem", id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
