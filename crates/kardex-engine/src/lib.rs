//! # kardex-engine: Stock Ledger & Reconciliation Engines
//!
//! The public API of Kardex. Four engines own everything in the system with
//! cross-entity consistency requirements, arithmetic-correctness
//! requirements, and partial-failure semantics; everything else in the
//! surrounding application is single-record persistence and stays outside
//! this workspace.
//!
//! ## The Four Engines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         kardex-engine                                   │
//! │                                                                         │
//! │  ┌────────────────────────┐      ┌─────────────────────────────┐       │
//! │  │ BundleReservationEngine│      │ PurchaseTransactionProcessor│       │
//! │  │  all-or-nothing        │      │  direct sales: freeze       │       │
//! │  │  reservations with     │      │  prices, persist sale,      │       │
//! │  │  compensation stack    │      │  consume stock atomically   │       │
//! │  └───────────┬────────────┘      └──────────────┬──────────────┘       │
//! │              │                                  │                      │
//! │              ▼                                  ▼                      │
//! │  ┌─────────────────────────────────────────────────────────────┐      │
//! │  │                      StockLedger                            │      │
//! │  │   reserve / release / consume / adjust / receive            │      │
//! │  │   invariant: 0 ≤ reserved_stock ≤ current_stock             │      │
//! │  │   one audit row per stock-affecting operation               │      │
//! │  └─────────────────────────────────────────────────────────────┘      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────┐      │
//! │  │               PaymentReconciliationEngine                   │      │
//! │  │   accumulates payments (two currencies, per-payment rate    │      │
//! │  │   snapshots) against a sale's total; derives paid status    │      │
//! │  └─────────────────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Contract
//!
//! Every operation that reads-then-writes quantity or money state runs in a
//! single database transaction; stock checks live in the `WHERE` clause of
//! guarded updates, so two concurrent sales can never both take the last
//! unit. Lock contention past the configured timeout surfaces as
//! [`LedgerError::Busy`], the only error documented retry-safe.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod payment;
pub mod purchase;
pub mod reservation;
pub mod stock_ledger;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{LedgerError, LedgerResult};
pub use payment::{PaymentOutcome, PaymentReconciliationEngine, RecordPaymentRequest};
pub use purchase::{CartLine, CreateSaleRequest, CreatedSale, PurchaseTransactionProcessor};
pub use reservation::{
    BundleLineSpec, BundleReservationEngine, CreateBundleRequest, CreatedBundle,
};
pub use stock_ledger::{ConsumeKind, NewItem, StockLedger};

// =============================================================================
// Test Utilities
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use kardex_core::{Currency, Money};
    use kardex_db::{Database, DbConfig};

    use crate::stock_ledger::{NewItem, StockLedger};

    /// Fresh in-memory database with migrations applied.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// USD money from cents.
    pub fn usd(cents: i64) -> Money {
        Money::from_cents(cents, Currency::Usd)
    }

    /// Registers an item with the given SKU and opening stock at $10.00.
    pub async fn registered_item(
        ledger: &StockLedger,
        sku: &str,
        opening_stock: i64,
    ) -> kardex_core::InventoryItem {
        ledger
            .register_item(NewItem {
                sku: sku.to_string(),
                name: format!("Test item {sku}"),
                opening_stock,
                minimum_stock: 0,
                base_price: usd(1000),
            })
            .await
            .unwrap()
    }
}
