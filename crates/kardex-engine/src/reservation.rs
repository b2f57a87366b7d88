//! # Bundle Reservation Engine
//!
//! Expands a bundle definition into per-item stock reservations,
//! all-or-nothing across the whole bundle.
//!
//! ## Compensation Stack (saga pattern)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_bundle([A×2, B×1, C×3])                                         │
//! │                                                                         │
//! │  reserve A ✓ ── push A onto stack                                      │
//! │  reserve B ✓ ── push B onto stack                                      │
//! │  reserve C ✗ (insufficient)                                            │
//! │       │                                                                 │
//! │       ▼   unwind stack in reverse order                                │
//! │  release B ✓                                                           │
//! │  release A ✓                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BundleStockUnavailable { failed_item_id: C, available, requested }    │
//! │                                                                         │
//! │  If a release itself fails the engine surfaces                         │
//! │  PartialReservationFailure instead: stock is over-reserved and an      │
//! │  operator must intervene; nothing is silently retried.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reservations are taken in ascending item-id order so two concurrent
//! bundles over overlapping item sets acquire their per-item locks in the
//! same sequence. Success means the bundle's full item set has stock
//! promised to it; no sale exists yet. A bundle catalog entry may be
//! created long before any customer buys it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use kardex_core::validation::{validate_line_count, validate_name, validate_quantity};
use kardex_core::{Bundle, BundleLine, CoreError, Money};
use kardex_db::repository::bundle;
use kardex_db::Database;

use crate::error::{LedgerError, LedgerResult};
use crate::stock_ledger::StockLedger;

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// One line of a bundle definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleLineSpec {
    pub item_id: String,
    pub quantity: i64,
    /// Optional line-total override; `None` prices the line at
    /// `base_price × quantity`.
    pub override_price: Option<Money>,
}

/// A bundle definition to create and reserve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBundleRequest {
    pub name: String,
    pub lines: Vec<BundleLineSpec>,
}

/// A created bundle with its persisted lines and nominal price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedBundle {
    pub bundle: Bundle,
    pub lines: Vec<BundleLine>,
    /// Σ(override ?? base_price × quantity) over all lines.
    pub nominal_price: Money,
}

// =============================================================================
// Engine
// =============================================================================

/// Creates bundles and manages their stock reservations.
#[derive(Debug, Clone)]
pub struct BundleReservationEngine {
    db: Database,
    ledger: StockLedger,
}

impl BundleReservationEngine {
    /// Creates a reservation engine over the given database.
    pub fn new(db: Database) -> Self {
        let ledger = StockLedger::new(db.clone());
        BundleReservationEngine { db, ledger }
    }

    /// Creates a bundle: validates the definition, reserves stock for every
    /// line (all-or-nothing), then persists the bundle and its lines.
    ///
    /// ## Errors
    /// - `ItemNotFound` when a line references a missing/inactive item
    /// - `BundleStockUnavailable` when a line cannot be reserved; all prior
    ///   reservations of this call are released first
    /// - `PartialReservationFailure` when such a release fails
    pub async fn create_bundle(
        &self,
        request: CreateBundleRequest,
    ) -> LedgerResult<CreatedBundle> {
        validate_name(&request.name).map_err(CoreError::from)?;
        validate_line_count(request.lines.len()).map_err(CoreError::from)?;
        for line in &request.lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let bundle_id = Uuid::new_v4().to_string();

        // Price and existence check before any stock is touched. Also the
        // nominal price needs every item's base price.
        let mut nominal_price: Option<Money> = None;
        for spec in &request.lines {
            let item = self.ledger.item(&spec.item_id).await?;
            if !item.is_active {
                return Err(LedgerError::ItemNotFound(spec.item_id.clone()));
            }

            let line_price = match &spec.override_price {
                Some(price) => *price,
                None => item.base_price().multiply_quantity(spec.quantity)?,
            };
            nominal_price = Some(match nominal_price {
                Some(sum) => sum.try_add(line_price)?,
                None => line_price,
            });
        }
        // validate_line_count guarantees at least one line
        let nominal_price = match nominal_price {
            Some(total) => total,
            None => {
                return Err(CoreError::Validation(
                    kardex_core::ValidationError::Required {
                        field: "lines".to_string(),
                    },
                )
                .into())
            }
        };

        // Reservation pass in ascending item-id order (fixed lock order for
        // overlapping concurrent bundles). Each success lands on the
        // compensation stack.
        let mut order: Vec<&BundleLineSpec> = request.lines.iter().collect();
        order.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        let mut reserved: Vec<&BundleLineSpec> = Vec::with_capacity(order.len());
        for spec in order {
            match self
                .ledger
                .reserve(&spec.item_id, spec.quantity, Some(&bundle_id))
                .await
            {
                Ok(()) => reserved.push(spec),
                Err(failure) => {
                    self.compensate(&spec.item_id, &reserved, &bundle_id)
                        .await?;
                    return Err(match failure {
                        LedgerError::InsufficientStock {
                            item_id,
                            available,
                            requested,
                        } => LedgerError::BundleStockUnavailable {
                            failed_item_id: item_id,
                            available,
                            requested,
                        },
                        other => other,
                    });
                }
            }
        }

        // Stock is promised; persist the definition. A persistence failure
        // compensates the same way.
        let now = Utc::now();
        let record = Bundle {
            id: bundle_id.clone(),
            name: request.name,
            created_at: now,
        };
        let lines: Vec<BundleLine> = request
            .lines
            .iter()
            .enumerate()
            .map(|(position, spec)| BundleLine {
                id: Uuid::new_v4().to_string(),
                bundle_id: bundle_id.clone(),
                item_id: spec.item_id.clone(),
                quantity: spec.quantity,
                override_price_cents: spec.override_price.map(|p| p.cents()),
                position: position as i64,
            })
            .collect();

        let persisted = async {
            let mut tx = self.db.begin().await?;
            bundle::insert_bundle(&mut tx, &record).await?;
            for line in &lines {
                bundle::insert_line(&mut tx, line).await?;
            }
            tx.commit().await.map_err(kardex_db::DbError::from)?;
            Ok::<(), LedgerError>(())
        }
        .await;

        if let Err(failure) = persisted {
            warn!(bundle_id = %bundle_id, "Bundle persistence failed, releasing reservations");
            self.compensate(&bundle_id, &reserved, &bundle_id).await?;
            return Err(failure);
        }

        info!(
            bundle_id = %bundle_id,
            lines = lines.len(),
            nominal_price = %nominal_price,
            "Bundle created and reserved"
        );

        Ok(CreatedBundle {
            bundle: record,
            lines,
            nominal_price,
        })
    }

    /// Loads a bundle with its lines and recomputed nominal price.
    pub async fn get_bundle(&self, bundle_id: &str) -> LedgerResult<CreatedBundle> {
        let record = self
            .db
            .bundles()
            .get_by_id(bundle_id)
            .await?
            .ok_or_else(|| LedgerError::BundleNotFound(bundle_id.to_string()))?;
        let lines = self.db.bundles().get_lines(bundle_id).await?;

        let mut nominal_price: Option<Money> = None;
        for line in &lines {
            let item = self.ledger.item(&line.item_id).await?;
            let line_price = line.nominal_price(item.base_price())?;
            nominal_price = Some(match nominal_price {
                Some(sum) => sum.try_add(line_price)?,
                None => line_price,
            });
        }
        let nominal_price = nominal_price.ok_or_else(|| {
            // A bundle with no lines cannot be created through this engine.
            LedgerError::BundleNotFound(bundle_id.to_string())
        })?;

        Ok(CreatedBundle {
            bundle: record,
            lines,
            nominal_price,
        })
    }

    /// Unwinds the compensation stack in reverse order.
    ///
    /// A failed release leaves stock over-reserved; that is surfaced as
    /// `PartialReservationFailure` and logged at error level; operator
    /// territory, not retry territory.
    async fn compensate(
        &self,
        failed_item_id: &str,
        reserved: &[&BundleLineSpec],
        bundle_id: &str,
    ) -> LedgerResult<()> {
        for spec in reserved.iter().rev() {
            if let Err(release_failure) = self
                .ledger
                .release(&spec.item_id, spec.quantity, Some(bundle_id))
                .await
            {
                error!(
                    bundle_id = %bundle_id,
                    stuck_item_id = %spec.item_id,
                    "Compensating release failed; stock left over-reserved"
                );
                return Err(LedgerError::PartialReservationFailure {
                    failed_item_id: failed_item_id.to_string(),
                    stuck_item_id: spec.item_id.clone(),
                    reason: release_failure.to_string(),
                });
            }
        }
        Ok(())
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

    fn spec(item_id: &str, quantity: i64) -> BundleLineSpec {
        BundleLineSpec {
            item_id: item_id.to_string(),
            quantity,
            override_price: None,
        }
    }

    #[tokio::test]
    async fn test_create_bundle_reserves_every_line() {
        let db = test_db().await;
        let engine = BundleReservationEngine::new(db.clone());
        let ledger = StockLedger::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await;
        let b = registered_item(&ledger, "ITEM-B", 5).await;

        let created = engine
            .create_bundle(CreateBundleRequest {
                name: "Starter kit".to_string(),
                lines: vec![spec(&a.id, 2), spec(&b.id, 1)],
            })
            .await
            .unwrap();

        assert_eq!(created.lines.len(), 2);
        // $10.00 × 2 + $10.00 × 1
        assert_eq!(created.nominal_price.cents(), 3000);

        assert_eq!(ledger.item(&a.id).await.unwrap().reserved_stock, 2);
        assert_eq!(ledger.item(&b.id).await.unwrap().reserved_stock, 1);

        // Each reservation carries the bundle id in the audit trail.
        let trail = ledger.transactions_for(&a.id).await.unwrap();
        let reservation = trail
            .iter()
            .find(|t| t.transaction_type == TransactionType::Reservation)
            .unwrap();
        assert_eq!(reservation.reference.as_deref(), Some(created.bundle.id.as_str()));
    }

    #[tokio::test]
    async fn test_price_override_replaces_line_total() {
        let db = test_db().await;
        let engine = BundleReservationEngine::new(db.clone());
        let ledger = StockLedger::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await;
        let b = registered_item(&ledger, "ITEM-B", 10).await;

        let created = engine
            .create_bundle(CreateBundleRequest {
                name: "Promo".to_string(),
                lines: vec![
                    BundleLineSpec {
                        item_id: a.id.clone(),
                        quantity: 3,
                        override_price: Some(usd(2500)), // instead of 3000
                    },
                    spec(&b.id, 1),
                ],
            })
            .await
            .unwrap();

        assert_eq!(created.nominal_price.cents(), 3500);

        // The stored line keeps the override for later reads.
        let reloaded = engine.get_bundle(&created.bundle.id).await.unwrap();
        assert_eq!(reloaded.nominal_price.cents(), 3500);
        assert_eq!(reloaded.lines[0].override_price_cents, Some(2500));
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_prior_reservations() {
        // §8 bundle-rollback property: a 3-line bundle failing on one line
        // leaves every reserved_stock at its pre-call value.
        let db = test_db().await;
        let engine = BundleReservationEngine::new(db.clone());
        let ledger = StockLedger::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await;
        let b = registered_item(&ledger, "ITEM-B", 1).await;
        let c = registered_item(&ledger, "ITEM-C", 10).await;

        // Pre-existing hold on A proves release restores, not zeroes.
        ledger.reserve(&a.id, 3, None).await.unwrap();

        let err = engine
            .create_bundle(CreateBundleRequest {
                name: "Too big".to_string(),
                lines: vec![spec(&a.id, 2), spec(&b.id, 4), spec(&c.id, 1)],
            })
            .await
            .unwrap_err();

        match err {
            LedgerError::BundleStockUnavailable {
                failed_item_id,
                available,
                requested,
            } => {
                assert_eq!(failed_item_id, b.id);
                assert_eq!(available, 1);
                assert_eq!(requested, 4);
            }
            other => panic!("expected BundleStockUnavailable, got {other:?}"),
        }

        assert_eq!(ledger.item(&a.id).await.unwrap().reserved_stock, 3);
        assert_eq!(ledger.item(&b.id).await.unwrap().reserved_stock, 0);
        assert_eq!(ledger.item(&c.id).await.unwrap().reserved_stock, 0);

        // No bundle row survived the failure.
        assert!(matches!(
            engine.get_bundle("missing").await.unwrap_err(),
            LedgerError::BundleNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_item_fails_before_any_reservation() {
        let db = test_db().await;
        let engine = BundleReservationEngine::new(db.clone());
        let ledger = StockLedger::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await;

        let err = engine
            .create_bundle(CreateBundleRequest {
                name: "Ghost".to_string(),
                lines: vec![spec(&a.id, 2), spec("ghost", 1)],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::ItemNotFound(_)));
        assert_eq!(ledger.item(&a.id).await.unwrap().reserved_stock, 0);
    }

    #[tokio::test]
    async fn test_empty_definition_is_rejected() {
        let db = test_db().await;
        let engine = BundleReservationEngine::new(db);

        let err = engine
            .create_bundle(CreateBundleRequest {
                name: "Empty".to_string(),
                lines: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Core(_)));
    }
}
