//! # Inventory Audit Trail Repository
//!
//! Append-only storage for [`InventoryTransaction`] rows.
//!
//! One row per stock-affecting ledger operation, written inside the same
//! transaction as the stock mutation it records. Rows are never updated or
//! deleted; there are deliberately no UPDATE or DELETE statements in this
//! module.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use kardex_core::InventoryTransaction;

/// Columns selected for audit queries; must stay in sync with
/// [`InventoryTransaction`].
const AUDIT_COLUMNS: &str =
    "id, item_id, quantity_delta, transaction_type, reference, created_at";

/// Repository for the inventory audit trail.
#[derive(Debug, Clone)]
pub struct AuditTrailRepository {
    pool: SqlitePool,
}

impl AuditTrailRepository {
    /// Creates a new AuditTrailRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditTrailRepository { pool }
    }

    /// Lists the audit trail for an item, oldest first.
    pub async fn list_for_item(&self, item_id: &str) -> DbResult<Vec<InventoryTransaction>> {
        let query = format!(
            "SELECT {AUDIT_COLUMNS} FROM inventory_transactions \
             WHERE item_id = ?1 ORDER BY created_at, id"
        );
        let entries = sqlx::query_as::<_, InventoryTransaction>(&query)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Appends an audit row.
pub async fn append(
    conn: &mut SqliteConnection,
    entry: &InventoryTransaction,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, item_id, quantity_delta, transaction_type, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.item_id)
    .bind(entry.quantity_delta)
    .bind(entry.transaction_type)
    .bind(&entry.reference)
    .bind(entry.created_at)
    .execute(conn)
    .await?;

    Ok(())
}
