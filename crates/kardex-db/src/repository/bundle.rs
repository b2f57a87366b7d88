//! # Bundle Repository
//!
//! Database operations for bundle definitions.
//!
//! Bundles are written exactly once, by the reservation engine, after its
//! reservation pass has succeeded. Lines are immutable thereafter.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kardex_core::{Bundle, BundleLine};

/// Columns selected for bundle line queries; must stay in sync with
/// [`BundleLine`].
const LINE_COLUMNS: &str =
    "id, bundle_id, item_id, quantity, override_price_cents, position";

/// Repository for bundle database operations.
#[derive(Debug, Clone)]
pub struct BundleRepository {
    pool: SqlitePool,
}

impl BundleRepository {
    /// Creates a new BundleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BundleRepository { pool }
    }

    /// Gets a bundle by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bundle>> {
        let bundle = sqlx::query_as::<_, Bundle>(
            "SELECT id, name, created_at FROM bundles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bundle)
    }

    /// Gets all lines for a bundle, in position order.
    pub async fn get_lines(&self, bundle_id: &str) -> DbResult<Vec<BundleLine>> {
        let query = format!(
            "SELECT {LINE_COLUMNS} FROM bundle_lines WHERE bundle_id = ?1 ORDER BY position"
        );
        let lines = sqlx::query_as::<_, BundleLine>(&query)
            .bind(bundle_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }
}

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Inserts a bundle row.
pub async fn insert_bundle(conn: &mut SqliteConnection, bundle: &Bundle) -> DbResult<()> {
    debug!(id = %bundle.id, name = %bundle.name, "Inserting bundle");

    sqlx::query("INSERT INTO bundles (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(&bundle.id)
        .bind(&bundle.name)
        .bind(bundle.created_at)
        .execute(conn)
        .await?;

    Ok(())
}

/// Inserts a bundle line.
pub async fn insert_line(conn: &mut SqliteConnection, line: &BundleLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bundle_lines (
            id, bundle_id, item_id, quantity, override_price_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&line.id)
    .bind(&line.bundle_id)
    .bind(&line.item_id)
    .bind(line.quantity)
    .bind(line.override_price_cents)
    .bind(line.position)
    .execute(conn)
    .await?;

    Ok(())
}
