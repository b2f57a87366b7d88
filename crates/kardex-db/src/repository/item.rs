//! # Inventory Item Repository
//!
//! Database operations for inventory items.
//!
//! ## Guarded Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Why Guards Live In The WHERE Clause                     │
//! │                                                                         │
//! │  ❌ WRONG: read, check in Rust, then write                             │
//! │     Two concurrent sales both read stock=1, both pass the check,       │
//! │     both write. One unit sold twice.                                   │
//! │                                                                         │
//! │  ✅ CORRECT: single conditional UPDATE                                 │
//! │     UPDATE inventory_items                                             │
//! │     SET current_stock = current_stock - ?                              │
//! │     WHERE id = ? AND current_stock >= ?                                │
//! │                                                                         │
//! │     SQLite executes the statement atomically. rows_affected == 0       │
//! │     means the guard failed; the engine decides what that means         │
//! │     (missing item vs. insufficient stock).                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mutating functions here take `&mut SqliteConnection` so the engines
//! can compose several of them under one transaction. Read paths that need
//! no transaction go through [`ItemRepository`] and the pool.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kardex_core::InventoryItem;

/// Columns selected for every item query; must stay in sync with
/// [`InventoryItem`] for `FromRow` mapping.
const ITEM_COLUMNS: &str = "id, sku, name, current_stock, reserved_stock, minimum_stock, \
     base_price_cents, currency, is_active, created_at, updated_at";

/// Repository for inventory item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1");
        let item = sqlx::query_as::<_, InventoryItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<InventoryItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE sku = ?1");
        let item = sqlx::query_as::<_, InventoryItem>(&query)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists active items sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let items = sqlx::query_as::<_, InventoryItem>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists active items at or below their reorder threshold.
    ///
    /// ## Usage
    /// Feeds the restock report; never blocks any ledger operation.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<InventoryItem>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE is_active = 1 AND current_stock <= minimum_stock \
             ORDER BY sku"
        );
        let items = sqlx::query_as::<_, InventoryItem>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Soft-deletes an item by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Sale lines and audit rows reference the item; history must survive.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory_items SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Inserts a new item row.
pub async fn insert_item(conn: &mut SqliteConnection, item: &InventoryItem) -> DbResult<()> {
    debug!(sku = %item.sku, "Inserting inventory item");

    sqlx::query(
        r#"
        INSERT INTO inventory_items (
            id, sku, name, current_stock, reserved_stock, minimum_stock,
            base_price_cents, currency, is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sku)
    .bind(&item.name)
    .bind(item.current_stock)
    .bind(item.reserved_stock)
    .bind(item.minimum_stock)
    .bind(item.base_price_cents)
    .bind(item.currency)
    .bind(item.is_active)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Fetches an item inside the current transaction.
pub async fn fetch_item(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<InventoryItem>> {
    let query = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1");
    let item = sqlx::query_as::<_, InventoryItem>(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(item)
}

/// Reads `(current_stock, reserved_stock)` inside the current transaction.
///
/// The engines re-check the ledger invariant with this after every write.
pub async fn stock_levels(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<(i64, i64)>> {
    let levels = sqlx::query_as::<_, (i64, i64)>(
        "SELECT current_stock, reserved_stock FROM inventory_items WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(levels)
}

/// Attempts to reserve stock: available-to-promise must cover the quantity.
///
/// Returns the number of affected rows (0 = guard failed: item missing,
/// inactive, or insufficient availability).
pub async fn try_reserve(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET reserved_stock = reserved_stock + ?2, updated_at = ?3
        WHERE id = ?1
          AND is_active = 1
          AND current_stock - reserved_stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Releases reserved stock, flooring at zero.
///
/// Returns the number of affected rows (0 = item missing).
pub async fn try_release(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET reserved_stock = MAX(reserved_stock - ?2, 0), updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Attempts to consume stock: `current_stock` must cover the quantity.
/// Any matching reservation shrinks by `min(reserved_stock, quantity)`.
///
/// Returns the number of affected rows (0 = guard failed).
pub async fn try_consume(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET current_stock = current_stock - ?2,
            reserved_stock = MAX(reserved_stock - ?2, 0),
            updated_at = ?3
        WHERE id = ?1
          AND is_active = 1
          AND current_stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Applies a signed manual stock correction; `current_stock` may not go
/// negative.
///
/// Returns the number of affected rows (0 = guard failed).
pub async fn try_adjust(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory_items
        SET current_stock = current_stock + ?2, updated_at = ?3
        WHERE id = ?1
          AND current_stock + ?2 >= 0
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}
