//! # kardex-core: Pure Business Logic for Kardex
//!
//! This crate is the **heart** of the Kardex stock-ledger and
//! reconciliation engine. It contains all business logic as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kardex Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI / API layer (out of scope)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kardex-engine                                │   │
//! │  │   StockLedger • BundleReservationEngine •                       │   │
//! │  │   PurchaseTransactionProcessor • PaymentReconciliationEngine    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kardex-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ settlement │  │ validation│  │   │
//! │  │   │ Item,Sale │  │ Money,Rate│  │ paid/owing │  │   rules   │  │   │
//! │  │   │ Payment.. │  │ Currency  │  │   math     │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kardex-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, Sale, Payment, etc.)
//! - [`money`] - Money and ExchangeRate with integer arithmetic (no floats!)
//! - [`settlement`] - Shared paid/outstanding reconciliation math
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: Amounts are cents (i64), rates are scaled by 10^4
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use kardex_core::money::{Currency, ExchangeRate, Money};
//!
//! // Parse at the boundary (never from floats!)
//! let total = Money::parse("100.00", Currency::Usd).unwrap();
//! let rate = ExchangeRate::parse("36.50").unwrap();
//!
//! // 3650.00 BS settles a 100.00 USD sale exactly
//! let paid = Money::parse("3650.00", Currency::Bs).unwrap();
//! assert_eq!(paid.convert(Currency::Usd, rate), total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kardex_core::Money` instead of
// `use kardex_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Currency, ExchangeRate, Money, RATE_SCALE};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale or bundle definition
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single item per line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9_999;
