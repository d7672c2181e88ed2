//! Bill repository implementation
//!
//! Database access for bills and their line-item assignments. A bill is
//! always written together with its assignments in one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use crate::error::DatabaseError;

const BILL_SELECT: &str = r#"
    SELECT b.id, b.due_date, b.currency, b.original_total, b.eur_total, b.paid,
           b.issuer_id, b.receiver_id, b.created_at, b.updated_at,
           i.name AS issuer_name, r.name AS receiver_name
    FROM bills b
    LEFT JOIN issuers i ON i.id = b.issuer_id
    LEFT JOIN receivers r ON r.id = b.receiver_id
"#;

/// Repository for bills and line-item assignments
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    /// Creates a new BillRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a bill and all of its assignments in a single transaction
    ///
    /// Either the bill and every assignment are stored, or nothing is: the
    /// transaction is rolled back when it is dropped without a commit.
    ///
    /// # Returns
    ///
    /// The generated bill id and assignment ids, in input order
    #[instrument(skip(self, bill, assignments), fields(assignments = assignments.len()))]
    pub async fn create_with_assignments(
        &self,
        bill: NewBill,
        assignments: Vec<NewAssignment>,
    ) -> Result<CreatedBillIds, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let bill_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bills (
                due_date, currency, original_total, eur_total, paid,
                issuer_id, receiver_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(bill.due_date)
        .bind(&bill.currency)
        .bind(bill.original_total)
        .bind(bill.eur_total)
        .bind(bill.paid)
        .bind(bill.issuer_id)
        .bind(bill.receiver_id)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut assignment_ids = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO bill_item_assignments (
                    bill_id, item_id, quantity, price, currency, exchange_rate,
                    original_amount, eur_amount, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING id
                "#,
            )
            .bind(bill_id)
            .bind(assignment.item_id)
            .bind(assignment.quantity)
            .bind(assignment.price)
            .bind(&assignment.currency)
            .bind(assignment.exchange_rate)
            .bind(assignment.original_amount)
            .bind(assignment.eur_amount)
            .bind(assignment.created_at)
            .bind(assignment.updated_at)
            .fetch_one(&mut *tx)
            .await?;
            assignment_ids.push(id);
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        debug!(bill_id, "Bill inserted");
        Ok(CreatedBillIds {
            bill_id,
            assignment_ids,
        })
    }

    /// Loads a bill with party names and its assignments ordered by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<BillWithAssignments>, DatabaseError> {
        let bill = sqlx::query_as::<_, BillRow>(&format!("{} WHERE b.id = $1", BILL_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(bill) = bill else {
            return Ok(None);
        };

        let assignments = self.find_assignments(id).await?;
        Ok(Some(BillWithAssignments { bill, assignments }))
    }

    /// Loads the assignments of a bill joined to their catalog items
    pub async fn find_assignments(&self, bill_id: i64) -> Result<Vec<AssignmentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT a.id, a.bill_id, a.item_id, a.quantity, a.price, a.currency,
                   a.exchange_rate, a.original_amount, a.eur_amount,
                   a.created_at, a.updated_at,
                   bi.name AS item_name, bi.price AS item_price, bi.currency AS item_currency,
                   bi.created_at AS item_created_at, bi.updated_at AS item_updated_at
            FROM bill_item_assignments a
            LEFT JOIN bill_items bi ON bi.id = a.item_id
            WHERE a.bill_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Loads every bill, newest first
    ///
    /// Issues one query for the bill list and one per bill for its
    /// assignments.
    pub async fn list_all(&self) -> Result<Vec<BillWithAssignments>, DatabaseError> {
        let bills = sqlx::query_as::<_, BillRow>(&format!(
            "{} ORDER BY b.created_at DESC, b.id DESC",
            BILL_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(bills.len());
        for bill in bills {
            let assignments = self.find_assignments(bill.id).await?;
            result.push(BillWithAssignments { bill, assignments });
        }
        Ok(result)
    }

    /// Rewrites the bill row and refreshes `updated_at`
    ///
    /// # Returns
    ///
    /// The new `updated_at` timestamp
    pub async fn update(&self, id: i64, bill: NewBill) -> Result<DateTime<Utc>, DatabaseError> {
        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE bills
            SET due_date = $2, currency = $3, original_total = $4, eur_total = $5,
                paid = $6, issuer_id = $7, receiver_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(id)
        .bind(bill.due_date)
        .bind(&bill.currency)
        .bind(bill.original_total)
        .bind(bill.eur_total)
        .bind(bill.paid)
        .bind(bill.issuer_id)
        .bind(bill.receiver_id)
        .fetch_optional(&self.pool)
        .await?;

        updated_at.ok_or_else(|| DatabaseError::not_found("Bill", id))
    }

    /// Deletes a bill row
    ///
    /// Fails with `ForeignKeyViolation` while assignments still reference it.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Bill", id));
        }
        Ok(())
    }

    /// Deletes all assignments of a bill, returning how many were removed
    pub async fn delete_assignments_by_bill(&self, bill_id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM bill_item_assignments WHERE bill_id = $1")
            .bind(bill_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes one assignment of a bill and rewrites the bill row in a
    /// single transaction
    ///
    /// Fails with `NotFound` if the assignment does not belong to the bill or
    /// the bill row is gone; nothing is changed in that case.
    #[instrument(skip(self, bill))]
    pub async fn remove_assignment(
        &self,
        bill_id: i64,
        assignment_id: i64,
        bill: NewBill,
    ) -> Result<DateTime<Utc>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM bill_item_assignments WHERE id = $1 AND bill_id = $2",
        )
        .bind(assignment_id)
        .bind(bill_id)
        .execute(&mut *tx)
        .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Assignment", assignment_id));
        }

        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE bills
            SET due_date = $2, currency = $3, original_total = $4, eur_total = $5,
                paid = $6, issuer_id = $7, receiver_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(bill_id)
        .bind(bill.due_date)
        .bind(&bill.currency)
        .bind(bill.original_total)
        .bind(bill.eur_total)
        .bind(bill.paid)
        .bind(bill.issuer_id)
        .bind(bill.receiver_id)
        .fetch_optional(&mut *tx)
        .await?;
        let updated_at = updated_at.ok_or_else(|| DatabaseError::not_found("Bill", bill_id))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        debug!(bill_id, assignment_id, "Assignment removed");
        Ok(updated_at)
    }
}

/// Column values for inserting or rewriting a bill row
#[derive(Debug, Clone)]
pub struct NewBill {
    pub due_date: NaiveDate,
    pub currency: String,
    pub original_total: Decimal,
    pub eur_total: Decimal,
    pub paid: bool,
    pub issuer_id: i64,
    pub receiver_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for inserting an assignment row
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub item_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub original_amount: Decimal,
    pub eur_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identities generated by [`BillRepository::create_with_assignments`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBillIds {
    pub bill_id: i64,
    pub assignment_ids: Vec<i64>,
}

/// Bill row with joined party names
#[derive(Debug, Clone, FromRow)]
pub struct BillRow {
    pub id: i64,
    pub due_date: NaiveDate,
    pub currency: String,
    pub original_total: Decimal,
    pub eur_total: Decimal,
    pub paid: bool,
    pub issuer_id: i64,
    pub receiver_id: i64,
    pub issuer_name: Option<String>,
    pub receiver_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment row with its joined catalog item columns
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub bill_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub original_amount: Decimal,
    pub eur_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_name: Option<String>,
    pub item_price: Option<Decimal>,
    pub item_currency: Option<String>,
    pub item_created_at: Option<DateTime<Utc>>,
    pub item_updated_at: Option<DateTime<Utc>>,
}

/// A bill row together with its assignment rows
#[derive(Debug, Clone)]
pub struct BillWithAssignments {
    pub bill: BillRow,
    pub assignments: Vec<AssignmentRow>,
}
