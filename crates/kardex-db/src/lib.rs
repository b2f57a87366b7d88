//! # kardex-db: Database Layer for Kardex
//!
//! This crate provides database access for the Kardex ledger engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kardex Data Flow                                 │
//! │                                                                         │
//! │  Engine operation (reserve, create_direct_sale, record_payment)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kardex-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (item, sale, │    │  (embedded)  │  │   │
//! │  │   │               │    │  bundle,audit)│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  guarded      │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │  updates      │    │ ...          │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys, busy_timeout)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (item, bundle, sale, audit)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kardex_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kardex.db")).await?;
//! let item = db.items().get_by_sku("CEM-42").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// sqlx types that appear in this crate's public API, re-exported so
// dependents compose transactions without a direct sqlx dependency
pub use sqlx::{Sqlite, SqliteConnection, Transaction};

// Repository re-exports for convenience
pub use repository::audit::AuditTrailRepository;
pub use repository::bundle::BundleRepository;
pub use repository::item::ItemRepository;
pub use repository::sale::SaleRepository;
