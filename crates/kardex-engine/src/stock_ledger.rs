//! # Stock Ledger
//!
//! Owns every mutation of `current_stock` / `reserved_stock` and the
//! append-only audit trail that mirrors them.
//!
//! ## Operation Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Every ledger operation is one transaction                    │
//! │                                                                         │
//! │  begin ──► guarded UPDATE (condition in WHERE, rows_affected checked)  │
//! │                │                                                        │
//! │                ├── 0 rows? diagnose: missing item vs. guard failure    │
//! │                │            → ItemNotFound / InsufficientStock         │
//! │                ▼                                                        │
//! │          append InventoryTransaction (same transaction)                │
//! │                ▼                                                        │
//! │          re-read (current, reserved), check 0 ≤ reserved ≤ current     │
//! │                │                                                        │
//! │                ├── violated? error! log → LedgerCorruption, rollback   │
//! │                ▼                                                        │
//! │             commit                                                      │
//! │                                                                         │
//! │  Stock can therefore never change without a matching audit row, and    │
//! │  no committed state can violate the invariant.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use kardex_core::validation::{validate_name, validate_quantity, validate_reference, validate_sku};
use kardex_core::{CoreError, InventoryItem, InventoryTransaction, Money, TransactionType};
use kardex_db::repository::{audit, item};
use kardex_db::{Database, SqliteConnection};

use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Inputs
// =============================================================================

/// Definition of a new inventory item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    /// Units on hand at registration time.
    pub opening_stock: i64,
    /// Reorder threshold.
    pub minimum_stock: i64,
    /// Immutable catalog price.
    pub base_price: Money,
}

/// How a consumption is classified in the audit trail.
///
/// A closed set instead of a raw [`TransactionType`] so callers cannot
/// record an outflow as, say, `reservation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeKind {
    /// Generic outflow not tied to a sale.
    Out,
    /// Consumption tied to a direct sale.
    Sale,
    /// Reserved stock handed over against a sold bundle.
    Fulfillment,
}

impl ConsumeKind {
    fn transaction_type(self) -> TransactionType {
        match self {
            ConsumeKind::Out => TransactionType::Out,
            ConsumeKind::Sale => TransactionType::Sale,
            ConsumeKind::Fulfillment => TransactionType::Fulfillment,
        }
    }
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// The only component allowed to mutate item stock fields.
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: Database,
}

impl StockLedger {
    /// Creates a stock ledger over the given database.
    pub fn new(db: Database) -> Self {
        StockLedger { db }
    }

    /// Registers a new inventory item.
    ///
    /// Appends an `initial` audit row when the opening stock is non-zero,
    /// so the trail reproduces the full stock history from day one.
    pub async fn register_item(&self, new_item: NewItem) -> LedgerResult<InventoryItem> {
        validate_sku(&new_item.sku).map_err(CoreError::from)?;
        validate_name(&new_item.name).map_err(CoreError::from)?;
        if new_item.opening_stock < 0 {
            return Err(CoreError::InvalidQuantity {
                requested: new_item.opening_stock,
            }
            .into());
        }
        if new_item.minimum_stock < 0 {
            return Err(CoreError::InvalidQuantity {
                requested: new_item.minimum_stock,
            }
            .into());
        }

        let now = Utc::now();
        let record = InventoryItem {
            id: Uuid::new_v4().to_string(),
            sku: new_item.sku,
            name: new_item.name,
            current_stock: new_item.opening_stock,
            reserved_stock: 0,
            minimum_stock: new_item.minimum_stock,
            base_price_cents: new_item.base_price.cents(),
            currency: new_item.base_price.currency(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        item::insert_item(&mut tx, &record).await?;
        if record.current_stock > 0 {
            audit::append(
                &mut tx,
                &audit_entry(
                    &record.id,
                    record.current_stock,
                    TransactionType::Initial,
                    None,
                ),
            )
            .await?;
        }
        tx.commit().await.map_err(kardex_db::DbError::from)?;

        info!(
            item_id = %record.id,
            sku = %record.sku,
            opening_stock = record.current_stock,
            "Inventory item registered"
        );

        Ok(record)
    }

    /// Loads an item, mapping absence to `ItemNotFound`.
    pub async fn item(&self, item_id: &str) -> LedgerResult<InventoryItem> {
        self.db
            .items()
            .get_by_id(item_id)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(item_id.to_string()))
    }

    /// Reserves stock for a bundle: available-to-promise must cover the
    /// quantity.
    ///
    /// ## Errors
    /// - `InsufficientStock` when `current − reserved < quantity`
    /// - `ItemNotFound` when the item is missing or inactive
    pub async fn reserve(
        &self,
        item_id: &str,
        quantity: i64,
        reference: Option<&str>,
    ) -> LedgerResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;
        reserve_in_tx(&mut tx, item_id, quantity, reference).await?;
        tx.commit().await.map_err(kardex_db::DbError::from)?;

        debug!(item_id = %item_id, quantity, "Stock reserved");
        Ok(())
    }

    /// Releases reserved stock (floor at zero). Used when a reservation is
    /// abandoned or compensated.
    ///
    /// Returns the quantity actually released (the clamped amount).
    pub async fn release(
        &self,
        item_id: &str,
        quantity: i64,
        reference: Option<&str>,
    ) -> LedgerResult<i64> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;
        let released = release_in_tx(&mut tx, item_id, quantity, reference).await?;
        tx.commit().await.map_err(kardex_db::DbError::from)?;

        debug!(item_id = %item_id, quantity, released, "Reservation released");
        Ok(released)
    }

    /// Consumes stock permanently: `current_stock` must cover the quantity.
    /// Any matching reservation shrinks by `min(reserved, quantity)`.
    ///
    /// ## Errors
    /// - `InsufficientStock` when `current_stock < quantity`
    /// - `ItemNotFound` when the item is missing or inactive
    pub async fn consume(
        &self,
        item_id: &str,
        quantity: i64,
        kind: ConsumeKind,
        reference: Option<&str>,
    ) -> LedgerResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;
        consume_in_tx(&mut tx, item_id, quantity, kind, reference).await?;
        tx.commit().await.map_err(kardex_db::DbError::from)?;

        debug!(item_id = %item_id, quantity, kind = ?kind, "Stock consumed");
        Ok(())
    }

    /// Applies a signed manual correction (restock count, shrinkage).
    ///
    /// The only bound enforced on the correction itself is
    /// `current_stock ≥ 0`; the per-write invariant recheck still runs, so
    /// a shrinkage that would strand reservations above the physical count
    /// aborts with `LedgerCorruption` instead of committing.
    pub async fn adjust(&self, item_id: &str, delta: i64, reason: &str) -> LedgerResult<()> {
        if delta == 0 {
            return Err(CoreError::InvalidQuantity { requested: 0 }.into());
        }
        if reason.trim().is_empty() {
            return Err(CoreError::Validation(
                kardex_core::ValidationError::Required {
                    field: "reason".to_string(),
                },
            )
            .into());
        }
        validate_reference(reason).map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;

        let affected = item::try_adjust(&mut tx, item_id, delta).await?;
        if affected == 0 {
            return Err(match item::fetch_item(&mut tx, item_id).await? {
                None => LedgerError::ItemNotFound(item_id.to_string()),
                Some(existing) => LedgerError::InsufficientStock {
                    item_id: item_id.to_string(),
                    available: existing.current_stock,
                    requested: delta.abs(),
                },
            });
        }

        audit::append(
            &mut tx,
            &audit_entry(item_id, delta, TransactionType::Adjustment, Some(reason)),
        )
        .await?;
        check_invariant(&mut tx, item_id).await?;

        tx.commit().await.map_err(kardex_db::DbError::from)?;

        info!(item_id = %item_id, delta, reason, "Stock adjusted");
        Ok(())
    }

    /// Records a restock inflow.
    pub async fn receive(
        &self,
        item_id: &str,
        quantity: i64,
        reference: Option<&str>,
    ) -> LedgerResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut tx = self.db.begin().await?;

        let affected = item::try_adjust(&mut tx, item_id, quantity).await?;
        if affected == 0 {
            return Err(LedgerError::ItemNotFound(item_id.to_string()));
        }

        audit::append(
            &mut tx,
            &audit_entry(item_id, quantity, TransactionType::In, reference),
        )
        .await?;
        check_invariant(&mut tx, item_id).await?;

        tx.commit().await.map_err(kardex_db::DbError::from)?;

        info!(item_id = %item_id, quantity, "Stock received");
        Ok(())
    }

    /// Read-only projection of an item's audit trail, oldest first.
    pub async fn transactions_for(
        &self,
        item_id: &str,
    ) -> LedgerResult<Vec<InventoryTransaction>> {
        Ok(self.db.audit().list_for_item(item_id).await?)
    }
}

// =============================================================================
// In-Transaction Building Blocks
// =============================================================================
// The purchase processor composes these under its own transaction, so a
// failed consumption on line 3 of 4 rolls back the sale row and the
// consumption of lines 1-2 together.

/// Reserve step: guarded update + audit row + invariant recheck.
pub(crate) async fn reserve_in_tx(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    reference: Option<&str>,
) -> LedgerResult<()> {
    let affected = item::try_reserve(conn, item_id, quantity).await?;
    if affected == 0 {
        return Err(diagnose_reserve_failure(conn, item_id, quantity).await?);
    }

    audit::append(
        conn,
        &audit_entry(item_id, quantity, TransactionType::Reservation, reference),
    )
    .await?;
    check_invariant(conn, item_id).await
}

/// Release step: clamp, guarded update, audit row for the amount actually
/// released (a no-op release appends nothing).
pub(crate) async fn release_in_tx(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    reference: Option<&str>,
) -> LedgerResult<i64> {
    let (_, reserved) = item::stock_levels(conn, item_id)
        .await?
        .ok_or_else(|| LedgerError::ItemNotFound(item_id.to_string()))?;
    let released = reserved.min(quantity);

    item::try_release(conn, item_id, quantity).await?;

    if released > 0 {
        audit::append(
            conn,
            &audit_entry(item_id, -released, TransactionType::Reservation, reference),
        )
        .await?;
    }
    check_invariant(conn, item_id).await?;

    Ok(released)
}

/// Consume step: guarded update + audit row + invariant recheck.
pub(crate) async fn consume_in_tx(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    kind: ConsumeKind,
    reference: Option<&str>,
) -> LedgerResult<()> {
    let affected = item::try_consume(conn, item_id, quantity).await?;
    if affected == 0 {
        return Err(diagnose_consume_failure(conn, item_id, quantity).await?);
    }

    audit::append(
        conn,
        &audit_entry(item_id, -quantity, kind.transaction_type(), reference),
    )
    .await?;
    check_invariant(conn, item_id).await
}

/// Distinguishes "item missing/inactive" from "not enough availability"
/// after a failed reserve guard.
async fn diagnose_reserve_failure(
    conn: &mut SqliteConnection,
    item_id: &str,
    requested: i64,
) -> LedgerResult<LedgerError> {
    Ok(match item::fetch_item(conn, item_id).await? {
        None => LedgerError::ItemNotFound(item_id.to_string()),
        Some(existing) if !existing.is_active => {
            LedgerError::ItemNotFound(item_id.to_string())
        }
        Some(existing) => LedgerError::InsufficientStock {
            item_id: item_id.to_string(),
            available: existing.available_to_promise(),
            requested,
        },
    })
}

/// Distinguishes "item missing/inactive" from "not enough stock" after a
/// failed consume guard. Direct consumption reports `current_stock` as the
/// availability, not available-to-promise (preserved source asymmetry).
async fn diagnose_consume_failure(
    conn: &mut SqliteConnection,
    item_id: &str,
    requested: i64,
) -> LedgerResult<LedgerError> {
    Ok(match item::fetch_item(conn, item_id).await? {
        None => LedgerError::ItemNotFound(item_id.to_string()),
        Some(existing) if !existing.is_active => {
            LedgerError::ItemNotFound(item_id.to_string())
        }
        Some(existing) => LedgerError::InsufficientStock {
            item_id: item_id.to_string(),
            available: existing.current_stock,
            requested,
        },
    })
}

/// Re-reads the stock fields and verifies `0 ≤ reserved ≤ current` before
/// the transaction is allowed to commit.
///
/// A violation is fatal for the operation: it is logged for operator
/// investigation and the transaction rolls back. Never repaired in place.
pub(crate) async fn check_invariant(
    conn: &mut SqliteConnection,
    item_id: &str,
) -> LedgerResult<()> {
    let (current, reserved) = item::stock_levels(conn, item_id)
        .await?
        .ok_or_else(|| LedgerError::ItemNotFound(item_id.to_string()))?;

    if reserved < 0 || reserved > current {
        error!(
            item_id = %item_id,
            current_stock = current,
            reserved_stock = reserved,
            "Ledger invariant violated, rolling back"
        );
        return Err(LedgerError::LedgerCorruption {
            item_id: item_id.to_string(),
            current_stock: current,
            reserved_stock: reserved,
        });
    }

    Ok(())
}

/// Builds an audit row for the current instant.
fn audit_entry(
    item_id: &str,
    quantity_delta: i64,
    transaction_type: TransactionType,
    reference: Option<&str>,
) -> InventoryTransaction {
    InventoryTransaction {
        id: Uuid::new_v4().to_string(),
        item_id: item_id.to_string(),
        quantity_delta,
        transaction_type,
        reference: reference.map(str::to_string),
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{registered_item, test_db, usd};
    use kardex_core::TransactionType;

    #[tokio::test]
    async fn test_register_item_writes_initial_audit_row() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);

        let item = registered_item(&ledger, "CEM-42", 10).await;
        let trail = ledger.transactions_for(&item.id).await.unwrap();

        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].transaction_type, TransactionType::Initial);
        assert_eq!(trail[0].quantity_delta, 10);
    }

    #[tokio::test]
    async fn test_register_item_rejects_bad_input() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);

        let bad_sku = NewItem {
            sku: "BAD SKU".to_string(),
            name: "x".to_string(),
            opening_stock: 1,
            minimum_stock: 0,
            base_price: usd(100),
        };
        assert!(matches!(
            ledger.register_item(bad_sku).await.unwrap_err(),
            LedgerError::Core(_)
        ));

        let negative_stock = NewItem {
            sku: "OK-1".to_string(),
            name: "x".to_string(),
            opening_stock: -1,
            minimum_stock: 0,
            base_price: usd(100),
        };
        assert!(matches!(
            ledger.register_item(negative_stock).await.unwrap_err(),
            LedgerError::Core(CoreError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_reserve_then_consume_scenario() {
        // §8 scenario: stock 10, reserve 4, consume 4 →
        // current 6, reserved 0, trail = [initial +10, reservation +4, sale −4]
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 10).await;

        ledger.reserve(&item.id, 4, None).await.unwrap();
        let after_reserve = ledger.item(&item.id).await.unwrap();
        assert_eq!(after_reserve.current_stock, 10);
        assert_eq!(after_reserve.reserved_stock, 4);

        ledger
            .consume(&item.id, 4, ConsumeKind::Sale, Some("sale-1"))
            .await
            .unwrap();
        let after_consume = ledger.item(&item.id).await.unwrap();
        assert_eq!(after_consume.current_stock, 6);
        assert_eq!(after_consume.reserved_stock, 0);

        let trail = ledger.transactions_for(&item.id).await.unwrap();
        let movements: Vec<(TransactionType, i64)> = trail
            .iter()
            .map(|t| (t.transaction_type, t.quantity_delta))
            .collect();
        assert_eq!(
            movements,
            vec![
                (TransactionType::Initial, 10),
                (TransactionType::Reservation, 4),
                (TransactionType::Sale, -4),
            ]
        );
        assert_eq!(trail[2].reference.as_deref(), Some("sale-1"));
    }

    #[tokio::test]
    async fn test_reserve_respects_available_to_promise() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 10).await;

        ledger.reserve(&item.id, 7, None).await.unwrap();

        // 3 units available-to-promise; 4 must fail even though
        // current_stock is 10.
        let err = ledger.reserve(&item.id, 4, None).await.unwrap_err();
        match err {
            LedgerError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 4);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The failed attempt left no trace.
        let unchanged = ledger.item(&item.id).await.unwrap();
        assert_eq!(unchanged.reserved_stock, 7);
    }

    #[tokio::test]
    async fn test_release_floors_at_zero_and_reports_clamped_amount() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 10).await;

        ledger.reserve(&item.id, 3, None).await.unwrap();
        let released = ledger.release(&item.id, 5, None).await.unwrap();
        assert_eq!(released, 3);

        let after = ledger.item(&item.id).await.unwrap();
        assert_eq!(after.reserved_stock, 0);
        assert_eq!(after.current_stock, 10);

        // Releasing with nothing reserved is a no-op, not an error.
        let released = ledger.release(&item.id, 2, None).await.unwrap();
        assert_eq!(released, 0);
    }

    #[tokio::test]
    async fn test_consume_checks_current_stock_not_available() {
        // Preserved source asymmetry: direct consumption ignores
        // reservations when checking stock.
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 5).await;

        ledger.reserve(&item.id, 5, None).await.unwrap();

        // All 5 reserved, yet a direct consume of 5 succeeds.
        ledger
            .consume(&item.id, 5, ConsumeKind::Out, None)
            .await
            .unwrap();

        let after = ledger.item(&item.id).await.unwrap();
        assert_eq!(after.current_stock, 0);
        assert_eq!(after.reserved_stock, 0);
    }

    #[tokio::test]
    async fn test_consume_insufficient_stock() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 2).await;

        let err = ledger
            .consume(&item.id, 3, ConsumeKind::Out, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));

        let unchanged = ledger.item(&item.id).await.unwrap();
        assert_eq!(unchanged.current_stock, 2);
        assert!(ledger.transactions_for(&item.id).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_adjust_cannot_go_negative() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 2).await;

        let err = ledger.adjust(&item.id, -3, "recount").await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));

        ledger.adjust(&item.id, -2, "shrinkage").await.unwrap();
        let after = ledger.item(&item.id).await.unwrap();
        assert_eq!(after.current_stock, 0);
    }

    #[tokio::test]
    async fn test_adjust_below_reservation_is_corruption_and_rolls_back() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 5).await;

        ledger.reserve(&item.id, 4, None).await.unwrap();

        // current would become 2 < reserved 4: the write must abort.
        let err = ledger.adjust(&item.id, -3, "shrinkage").await.unwrap_err();
        assert!(matches!(err, LedgerError::LedgerCorruption { .. }));

        // Rolled back: neither the stock nor the audit trail changed.
        let unchanged = ledger.item(&item.id).await.unwrap();
        assert_eq!(unchanged.current_stock, 5);
        assert_eq!(unchanged.reserved_stock, 4);
        assert_eq!(ledger.transactions_for(&item.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receive_restocks_and_logs_inflow() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 1).await;

        ledger.receive(&item.id, 24, Some("PO-77")).await.unwrap();

        let after = ledger.item(&item.id).await.unwrap();
        assert_eq!(after.current_stock, 25);

        let trail = ledger.transactions_for(&item.id).await.unwrap();
        let last = trail.last().unwrap();
        assert_eq!(last.transaction_type, TransactionType::In);
        assert_eq!(last.quantity_delta, 24);
        assert_eq!(last.reference.as_deref(), Some("PO-77"));
    }

    #[tokio::test]
    async fn test_fulfillment_consume_is_classified_as_such() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 8).await;

        ledger.reserve(&item.id, 2, Some("bundle-7")).await.unwrap();
        ledger
            .consume(&item.id, 2, ConsumeKind::Fulfillment, Some("bundle-7"))
            .await
            .unwrap();

        let trail = ledger.transactions_for(&item.id).await.unwrap();
        let last = trail.last().unwrap();
        assert_eq!(last.transaction_type, TransactionType::Fulfillment);
        assert_eq!(last.quantity_delta, -2);
    }

    #[tokio::test]
    async fn test_deactivated_item_behaves_as_missing() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let item = registered_item(&ledger, "CEM-42", 8).await;

        db.items().deactivate(&item.id).await.unwrap();

        assert!(matches!(
            ledger.reserve(&item.id, 1, None).await.unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
        assert!(matches!(
            ledger
                .consume(&item.id, 1, ConsumeKind::Out, None)
                .await
                .unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);

        assert!(matches!(
            ledger.reserve("ghost", 1, None).await.unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
        assert!(matches!(
            ledger
                .consume("ghost", 1, ConsumeKind::Out, None)
                .await
                .unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
        assert!(matches!(
            ledger.release("ghost", 1, None).await.unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
        assert!(matches!(
            ledger.adjust("ghost", 1, "x").await.unwrap_err(),
            LedgerError::ItemNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_quantities_must_be_positive() {
        let db = test_db().await;
        let ledger = StockLedger::new(db);
        let item = registered_item(&ledger, "CEM-42", 5).await;

        assert!(ledger.reserve(&item.id, 0, None).await.is_err());
        assert!(ledger.reserve(&item.id, -2, None).await.is_err());
        assert!(ledger
            .consume(&item.id, 0, ConsumeKind::Out, None)
            .await
            .is_err());
        assert!(ledger.adjust(&item.id, 0, "noop").await.is_err());
    }
}
