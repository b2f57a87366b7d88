//! # Sale Repository
//!
//! Database operations for sales, sale lines, and payments.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Who Writes What                                    │
//! │                                                                         │
//! │  PurchaseTransactionProcessor                                          │
//! │     └── insert_sale + insert_line (once, at creation)                  │
//! │     └── set_status (explicit transitions)                              │
//! │                                                                         │
//! │  PaymentReconciliationEngine                                           │
//! │     └── insert_payment (append-only)                                   │
//! │     └── update_settlement (is_paid / payment_status rollup)            │
//! │                                                                         │
//! │  Sale lines are snapshots: never updated after the sale commits.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kardex_core::{Payment, PaymentStatus, Sale, SaleLine, SaleStatus};

/// Columns selected for every sale query; must stay in sync with [`Sale`].
const SALE_COLUMNS: &str = "id, client_id, status, total_cents, currency, \
     conversion_rate_scaled, payment_method, is_paid, payment_status, \
     purchase_date, created_at, updated_at";

/// Columns selected for sale line queries; must stay in sync with [`SaleLine`].
const LINE_COLUMNS: &str =
    "id, sale_id, item_id, quantity, unit_price_cents, total_price_cents, position";

/// Columns selected for payment queries; must stay in sync with [`Payment`].
const PAYMENT_COLUMNS: &str = "id, sale_id, amount_cents, currency, \
     conversion_rate_scaled, method, status, transaction_reference, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all lines for a sale, in position order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let query = format!(
            "SELECT {LINE_COLUMNS} FROM sale_lines WHERE sale_id = ?1 ORDER BY position"
        );
        let lines = sqlx::query_as::<_, SaleLine>(&query)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Gets all payments for a sale, oldest first.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id = ?1 ORDER BY created_at"
        );
        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Lists sales for a client, newest first.
    pub async fn list_for_client(&self, client_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let query = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE client_id = ?1 ORDER BY purchase_date DESC LIMIT ?2"
        );
        let sales = sqlx::query_as::<_, Sale>(&query)
            .bind(client_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sets a sale's workflow status.
    ///
    /// Pure field transition; stock is only touched at creation.
    pub async fn set_status(&self, sale_id: &str, status: SaleStatus) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(sale_id)
                .bind(status)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Fetches a sale inside the current transaction.
pub async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let query = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(sale)
}

/// Fetches a sale's payments inside the current transaction.
pub async fn fetch_payments(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Vec<Payment>> {
    let query = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id = ?1 ORDER BY created_at"
    );
    let payments = sqlx::query_as::<_, Payment>(&query)
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

    Ok(payments)
}

/// Inserts a sale row.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, client_id = %sale.client_id, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, client_id, status, total_cents, currency,
            conversion_rate_scaled, payment_method, is_paid, payment_status,
            purchase_date, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.client_id)
    .bind(sale.status)
    .bind(sale.total_cents)
    .bind(sale.currency)
    .bind(sale.conversion_rate_scaled)
    .bind(sale.payment_method)
    .bind(sale.is_paid)
    .bind(sale.payment_status)
    .bind(sale.purchase_date)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a sale line snapshot.
pub async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, item_id, quantity,
            unit_price_cents, total_price_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.item_id)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.total_price_cents)
    .bind(line.position)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts a payment row.
pub async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    debug!(
        sale_id = %payment.sale_id,
        amount_cents = payment.amount_cents,
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, sale_id, amount_cents, currency, conversion_rate_scaled,
            method, status, transaction_reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.amount_cents)
    .bind(payment.currency)
    .bind(payment.conversion_rate_scaled)
    .bind(payment.method)
    .bind(payment.status)
    .bind(&payment.transaction_reference)
    .bind(payment.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Updates the derived settlement rollup on a sale.
pub async fn update_settlement(
    conn: &mut SqliteConnection,
    sale_id: &str,
    is_paid: bool,
    payment_status: PaymentStatus,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE sales SET is_paid = ?2, payment_status = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(sale_id)
    .bind(is_paid)
    .bind(payment_status)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}
