//! # Domain Types
//!
//! Core domain types used throughout Kardex.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  client_id (FK) │   │  sale_id (FK)   │       │
//! │  │  current_stock  │   │  total_cents    │   │  amount_cents   │       │
//! │  │  reserved_stock │   │  currency+rate  │   │  currency+rate  │       │
//! │  │  minimum_stock  │   │  payment_status │   │  method/status  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐                        │
//! │  │ Bundle + Lines  │   │ InventoryTransaction │                        │
//! │  │  ─────────────  │   │  ──────────────────  │                        │
//! │  │  item + qty +   │   │  signed delta +      │                        │
//! │  │  optional       │   │  type + reference    │                        │
//! │  │  price override │   │  (append-only)       │                        │
//! │  └─────────────────┘   └──────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (item SKU) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{Currency, ExchangeRate, Money};

// =============================================================================
// Inventory Item
// =============================================================================

/// A physical stock-keeping unit tracked by the ledger.
///
/// ## Stock Fields
/// - `current_stock`: physically available units, *including* reserved ones
/// - `reserved_stock`: units promised to assembled-but-unsold bundles
/// - `minimum_stock`: reorder threshold (reporting only, never enforced)
///
/// Invariant: `0 ≤ reserved_stock ≤ current_stock`. Available-to-promise is
/// `current_stock − reserved_stock`. These fields are mutated only by the
/// stock ledger, never by direct writes.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Physically available units, including reserved ones.
    pub current_stock: i64,

    /// Units promised to bundles, not yet consumed.
    pub reserved_stock: i64,

    /// Reorder threshold.
    pub minimum_stock: i64,

    /// Immutable catalog price in minor units.
    pub base_price_cents: i64,

    /// Currency of the catalog price.
    pub currency: Currency,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    /// When the item was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Returns the catalog price as a Money type.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents, self.currency)
    }

    /// Returns the quantity that can still be reserved or promised.
    #[inline]
    pub fn available_to_promise(&self) -> i64 {
        self.current_stock - self.reserved_stock
    }

    /// Checks if the item is at or below its reorder threshold.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// A sellable package of items assembled from inventory.
///
/// Bundles are created once with immutable lines; creation triggers exactly
/// one reservation pass. A reserved bundle means "this configuration is
/// sellable now", not "this has been sold".
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bundle {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line in a bundle definition.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleLine {
    pub id: String,
    pub bundle_id: String,
    pub item_id: String,
    /// Units of the item included in the bundle. Always positive.
    pub quantity: i64,
    /// Optional line-total override in minor units; `None` falls back to
    /// `base_price × quantity`.
    pub override_price_cents: Option<i64>,
    /// Order of the line within the bundle definition.
    pub position: i64,
}

impl BundleLine {
    /// Returns the line's contribution to the bundle's nominal price.
    ///
    /// The override, when present, replaces the whole
    /// `base_price × quantity` term.
    pub fn nominal_price(&self, base_price: Money) -> Result<Money, CoreError> {
        match self.override_price_cents {
            Some(cents) => Money::new(cents, base_price.currency()),
            None => base_price.multiply_quantity(self.quantity),
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The workflow status of a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded, awaiting approval.
    Pending,
    /// Approved for fulfilment.
    Approved,
    /// Being assembled or delivered.
    InProgress,
    /// Finalized; stock has been consumed.
    Completed,
    /// Cancelled before completion.
    Cancelled,
}

impl SaleStatus {
    /// Returns the canonical snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Approved => "approved",
            SaleStatus::InProgress => "in_progress",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary parsing for status-transition requests.
///
/// Unknown values are a [`CoreError::InvalidStatus`]: the caller sent
/// something outside the enumerated set.
impl FromStr for SaleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "approved" => Ok(SaleStatus::Approved),
            "in_progress" => Ok(SaleStatus::InProgress),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement status, used both per payment row and as the sale-level rollup.
///
/// `Partial` only ever appears on the sale rollup; individual payment rows
/// are recorded as `Paid` (or administratively `Cancelled`/`Overdue`).
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    /// Returns the canonical snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer (pago móvil, wire).
    Transfer,
    /// Anything else the operation accepts ad hoc.
    Other,
}

impl PaymentMethod {
    /// Lenient boundary parsing: common synonyms map onto the closed set,
    /// anything unrecognized lands on `Other`.
    pub fn parse_lenient(s: &str) -> PaymentMethod {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" | "efectivo" => PaymentMethod::Cash,
            "card" | "credit" | "debit" => PaymentMethod::Card,
            "transfer" | "wire" | "pago_movil" => PaymentMethod::Transfer,
            _ => PaymentMethod::Other,
        }
    }

    /// Returns the canonical snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale (purchase) with frozen prices and a currency/rate snapshot.
///
/// `is_paid` and `payment_status` are derived from the payment sum by the
/// reconciliation engine; they are stored for row consumers but recomputed
/// on every settlement path.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub client_id: String,
    pub status: SaleStatus,
    /// Total of all line totals, in the sale's currency.
    pub total_cents: i64,
    /// Currency the sale is denominated in.
    pub currency: Currency,
    /// BS-per-USD rate snapshot at sale time, scaled by 10^4.
    pub conversion_rate_scaled: i64,
    /// Settlement method agreed at sale time; individual payments may differ.
    pub payment_method: PaymentMethod,
    /// Derived: whether accumulated payments cover the total.
    pub is_paid: bool,
    /// Derived: settlement rollup (pending/partial/paid/...).
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents, self.currency)
    }

    /// Returns the sale-time rate snapshot.
    #[inline]
    pub fn conversion_rate(&self) -> ExchangeRate {
        ExchangeRate::from_scaled(self.conversion_rate_scaled)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze prices at time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price at time of sale (frozen), in the sale's currency.
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity), frozen.
    pub total_price_cents: i64,
    /// Order of the line within the sale.
    pub position: i64,
}

impl SaleLine {
    /// Returns the frozen unit price in the sale's currency.
    #[inline]
    pub fn unit_price(&self, currency: Currency) -> Money {
        Money::from_cents(self.unit_price_cents, currency)
    }

    /// Returns the frozen line total in the sale's currency.
    #[inline]
    pub fn total_price(&self, currency: Currency) -> Money {
        Money::from_cents(self.total_price_cents, currency)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale.
/// A sale can have multiple payments; each keeps its own rate snapshot.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    /// Amount paid, in `currency`.
    pub amount_cents: i64,
    /// Currency the payment was made in (may differ from the sale's).
    pub currency: Currency,
    /// BS-per-USD rate snapshot at payment time, scaled by 10^4.
    pub conversion_rate_scaled: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External reference (transfer number, card auth code).
    pub transaction_reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents, self.currency)
    }

    /// Returns the payment-time rate snapshot.
    #[inline]
    pub fn conversion_rate(&self) -> ExchangeRate {
        ExchangeRate::from_scaled(self.conversion_rate_scaled)
    }

    /// Returns the amount expressed in `native`, converted at this
    /// payment's own recorded rate. Historical rates are never recomputed.
    pub fn amount_in(&self, native: Currency) -> Money {
        self.amount().convert(native, self.conversion_rate())
    }
}

// =============================================================================
// Inventory Transaction
// =============================================================================

/// Classification of a stock movement in the audit trail.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Opening stock recorded when the item is registered.
    Initial,
    /// Restock inflow.
    In,
    /// Generic outflow not tied to a sale.
    Out,
    /// Manual correction (shrinkage, recount).
    Adjustment,
    /// Soft hold for a bundle (positive delta) or its release (negative).
    Reservation,
    /// Reserved stock handed over against a bundle sale.
    Fulfillment,
    /// Consumption tied to a direct sale.
    Sale,
}

impl TransactionType {
    /// Returns the canonical snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Initial => "initial",
            TransactionType::In => "in",
            TransactionType::Out => "out",
            TransactionType::Adjustment => "adjustment",
            TransactionType::Reservation => "reservation",
            TransactionType::Fulfillment => "fulfillment",
            TransactionType::Sale => "sale",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit row per stock-affecting ledger operation.
/// Never updated or deleted.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryTransaction {
    pub id: String,
    pub item_id: String,
    /// Signed unit delta. Reservations count the held units as positive;
    /// consumption and releases are negative.
    pub quantity_delta: i64,
    pub transaction_type: TransactionType,
    /// Free-text reference (sale id, restock note, adjustment reason).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_to_promise() {
        let now = Utc::now();
        let item = InventoryItem {
            id: "i-1".to_string(),
            sku: "CEM-42".to_string(),
            name: "Cemento gris 42kg".to_string(),
            current_stock: 10,
            reserved_stock: 4,
            minimum_stock: 2,
            base_price_cents: 1250,
            currency: Currency::Usd,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(item.available_to_promise(), 6);
        assert!(!item.needs_reorder());
        assert_eq!(item.base_price().cents(), 1250);
    }

    #[test]
    fn test_bundle_line_nominal_price() {
        let base = Money::new(1000, Currency::Usd).unwrap();

        let line = BundleLine {
            id: "l-1".to_string(),
            bundle_id: "b-1".to_string(),
            item_id: "i-1".to_string(),
            quantity: 3,
            override_price_cents: None,
            position: 0,
        };
        assert_eq!(line.nominal_price(base).unwrap().cents(), 3000);

        let discounted = BundleLine {
            override_price_cents: Some(2500),
            ..line
        };
        assert_eq!(discounted.nominal_price(base).unwrap().cents(), 2500);
    }

    #[test]
    fn test_sale_status_parsing() {
        assert_eq!("completed".parse::<SaleStatus>().unwrap(), SaleStatus::Completed);
        assert_eq!(
            "IN_PROGRESS".parse::<SaleStatus>().unwrap(),
            SaleStatus::InProgress
        );
        assert!(matches!(
            "shipped".parse::<SaleStatus>().unwrap_err(),
            CoreError::InvalidStatus(_)
        ));
    }

    #[test]
    fn test_payment_method_lenient_parsing() {
        assert_eq!(PaymentMethod::parse_lenient("cash"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse_lenient("debit"), PaymentMethod::Card);
        assert_eq!(
            PaymentMethod::parse_lenient("pago_movil"),
            PaymentMethod::Transfer
        );
        assert_eq!(PaymentMethod::parse_lenient("crypto"), PaymentMethod::Other);
    }

    #[test]
    fn test_payment_amount_in_native_currency() {
        let payment = Payment {
            id: "p-1".to_string(),
            sale_id: "s-1".to_string(),
            amount_cents: 365_000, // 3650.00 BS
            currency: Currency::Bs,
            conversion_rate_scaled: 365_000, // 36.50
            method: PaymentMethod::Transfer,
            status: PaymentStatus::Paid,
            transaction_reference: Some("TRF-001".to_string()),
            created_at: Utc::now(),
        };

        assert_eq!(payment.amount_in(Currency::Usd).cents(), 10_000);
        assert_eq!(payment.amount_in(Currency::Bs).cents(), 365_000);
    }
}
