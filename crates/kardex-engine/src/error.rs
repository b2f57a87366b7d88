//! # Ledger Error Taxonomy
//!
//! The typed errors callers of the engines see.
//!
//! ## Handling Guide
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Error                      Meaning                      Retry?         │
//! │  ─────────────────────────  ──────────────────────────   ─────────      │
//! │  InsufficientStock          availability ran out at      no (business   │
//! │                             lock time                    decision)      │
//! │  ItemNotFound/SaleNotFound  stale or wrong reference     no             │
//! │  BundleNotFound             stale or wrong reference     no             │
//! │  InvalidAmount/InvalidRate  malformed input              no             │
//! │  BundleStockUnavailable     one line failed; prior       no             │
//! │                             reservations were released   │              │
//! │  PartialReservationFailure  compensation itself failed   OPERATOR       │
//! │  AlreadyFullyPaid           sale is settled              no             │
//! │  InvalidStatus              unknown status value         no             │
//! │  Busy                       lock contention              YES, backoff   │
//! │  LedgerCorruption           invariant violated           NEVER (page    │
//! │                             inside a transaction         an operator)   │
//! │  Persistence                storage failure              depends        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error rolls back its enclosing transaction fully. Nothing is
//! retried inside the engines themselves.

use thiserror::Error;

use kardex_core::CoreError;
use kardex_db::DbError;

/// Errors surfaced by the ledger and reconciliation engines.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Requested quantity exceeds availability at lock time.
    ///
    /// For reservations `available` is available-to-promise
    /// (`current − reserved`); for direct-sale consumption it is
    /// `current_stock` (see DESIGN.md on the preserved asymmetry).
    #[error("Insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// Referenced inventory item does not exist (or is inactive).
    #[error("Inventory item not found: {0}")]
    ItemNotFound(String),

    /// Referenced sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Referenced bundle does not exist.
    #[error("Bundle not found: {0}")]
    BundleNotFound(String),

    /// One line of a bundle could not be reserved after others succeeded.
    /// All prior reservations in the same call were released before this
    /// error was returned.
    #[error(
        "Bundle stock unavailable for item {failed_item_id}: available {available}, requested {requested}"
    )]
    BundleStockUnavailable {
        failed_item_id: String,
        available: i64,
        requested: i64,
    },

    /// A compensating release failed after a bundle reservation failure.
    /// Stock for `stuck_item_id` is left over-reserved; requires operator
    /// intervention, not a retry.
    #[error(
        "Partial reservation failure: line {failed_item_id} failed and the release for {stuck_item_id} did not complete: {reason}"
    )]
    PartialReservationFailure {
        /// The line whose reservation failed, or the bundle id when
        /// persistence failed after a successful reservation pass.
        failed_item_id: String,
        stuck_item_id: String,
        reason: String,
    },

    /// Payment attempted against a sale whose total is already covered.
    #[error("Sale {0} is already fully paid")]
    AlreadyFullyPaid(String),

    /// Transient lock contention. Safe to retry with backoff; retry count
    /// and interval are caller policy, not enforced here.
    #[error("Ledger busy: lock not acquired within the configured timeout")]
    Busy,

    /// The `reserved_stock ≤ current_stock` invariant was violated inside
    /// a transaction. Fatal: the transaction was rolled back and the
    /// condition logged. Never silently repaired.
    #[error(
        "Ledger corruption on item {item_id}: reserved_stock {reserved_stock} exceeds current_stock {current_stock}"
    )]
    LedgerCorruption {
        item_id: String,
        current_stock: i64,
        reserved_stock: i64,
    },

    /// Domain-level failure (invalid amount, rate, quantity, status,
    /// currency mismatch, validation).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying storage failure; the transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(DbError),
}

impl LedgerError {
    /// Whether the operation may be retried safely (with backoff).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Busy)
    }
}

/// Lock contention keeps its identity; everything else from storage is a
/// persistence failure.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy => LedgerError::Busy,
            other => LedgerError::Persistence(other),
        }
    }
}

/// Result type for engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_passes_through_from_db() {
        let err: LedgerError = DbError::Busy.into();
        assert!(matches!(err, LedgerError::Busy));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_db_errors_become_persistence() {
        let err: LedgerError = DbError::PoolExhausted.into();
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_corruption_message_names_the_item() {
        let err = LedgerError::LedgerCorruption {
            item_id: "i-9".to_string(),
            current_stock: 2,
            reserved_stock: 4,
        };
        assert!(err.to_string().contains("i-9"));
        assert!(!err.is_retryable());
    }
}
