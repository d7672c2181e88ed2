//! Issuer and receiver repository implementation
//!
//! Issuers and receivers share one column layout, so a single repository
//! serves both tables.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

const PARTY_COLUMNS: &str =
    "id, name, vat_number, street, city, state, zip_code, country, created_at, updated_at";

/// Table a [`PartyRepository`] operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyTable {
    Issuers,
    Receivers,
}

impl PartyTable {
    pub fn name(&self) -> &'static str {
        match self {
            PartyTable::Issuers => "issuers",
            PartyTable::Receivers => "receivers",
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            PartyTable::Issuers => "Issuer",
            PartyTable::Receivers => "Receiver",
        }
    }
}

/// Repository for one of the party tables
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: PgPool,
    table: PartyTable,
}

impl PartyRepository {
    pub fn new(pool: PgPool, table: PartyTable) -> Self {
        Self { pool, table }
    }

    pub fn issuers(pool: PgPool) -> Self {
        Self::new(pool, PartyTable::Issuers)
    }

    pub fn receivers(pool: PgPool) -> Self {
        Self::new(pool, PartyTable::Receivers)
    }

    pub fn table(&self) -> PartyTable {
        self.table
    }

    /// Inserts a party and returns the stored row
    pub async fn insert(&self, party: NewParty) -> Result<PartyRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, vat_number, street, city, state, zip_code, country, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            self.table.name(),
            PARTY_COLUMNS
        );

        let row = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(&party.name)
            .bind(&party.vat_number)
            .bind(&party.street)
            .bind(&party.city)
            .bind(&party.state)
            .bind(&party.zip_code)
            .bind(&party.country)
            .bind(party.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<PartyRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", PARTY_COLUMNS, self.table.name());
        let row = sqlx::query_as::<_, PartyRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// All parties ordered by name
    pub async fn list(&self) -> Result<Vec<PartyRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM {} ORDER BY name, id", PARTY_COLUMNS, self.table.name());
        let rows = sqlx::query_as::<_, PartyRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Rewrites a party, returning the new `updated_at`
    pub async fn update(&self, id: i64, party: NewParty) -> Result<DateTime<Utc>, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = $2, vat_number = $3, street = $4, city = $5, state = $6,
                zip_code = $7, country = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
            self.table.name()
        );

        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(&sql)
            .bind(id)
            .bind(&party.name)
            .bind(&party.vat_number)
            .bind(&party.street)
            .bind(&party.city)
            .bind(&party.state)
            .bind(&party.zip_code)
            .bind(&party.country)
            .fetch_optional(&self.pool)
            .await?;

        updated_at.ok_or_else(|| DatabaseError::not_found(self.table.entity(), id))
    }

    /// Deletes a party; fails with `ForeignKeyViolation` while bills reference it
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(self.table.entity(), id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewParty {
    pub name: String,
    pub vat_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PartyRow {
    pub id: i64,
    pub name: String,
    pub vat_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
