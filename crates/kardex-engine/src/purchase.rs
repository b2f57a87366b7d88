//! # Purchase Transaction Processor
//!
//! Direct sales: a cart of items sold off the shelf, not bundle-backed.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_direct_sale is ONE transaction                                  │
//! │                                                                         │
//! │  begin                                                                  │
//! │    1. load every item, check stock        (ItemNotFound /              │
//! │       against current_stock                InsufficientStock)          │
//! │    2. freeze unit prices, sum the total   (integer cents, exact)       │
//! │    3. INSERT sale + sale_lines                                         │
//! │    4. per line: guarded consume + audit row + invariant recheck        │
//! │  commit                                                                 │
//! │                                                                         │
//! │  Any failure before commit rolls the whole transaction back:           │
//! │  the sale never exists without its stock consumption, and stock is     │
//! │  never consumed without the sale record.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock for a direct sale is checked against `current_stock`, not
//! available-to-promise: bundle reservations do not block a direct sale.
//! This mirrors the behavior the business runs on today; see DESIGN.md
//! before hardening it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use kardex_core::validation::{validate_identity, validate_line_count, validate_quantity};
use kardex_core::{
    CoreError, Currency, ExchangeRate, Money, PaymentMethod, PaymentStatus, Sale, SaleLine,
    SaleStatus,
};
use kardex_db::repository::{item, sale};
use kardex_db::Database;

use crate::error::{LedgerError, LedgerResult};
use crate::stock_ledger::{self, ConsumeKind};

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// One cart line of a direct sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    pub quantity: i64,
}

/// A direct sale to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub client_id: String,
    pub lines: Vec<CartLine>,
    /// Settlement method agreed with the client.
    pub payment_method: PaymentMethod,
    /// Currency the sale is denominated in.
    pub currency: Currency,
    /// BS-per-USD snapshot at sale time.
    pub conversion_rate: ExchangeRate,
}

/// A persisted sale with its line snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSale {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Processor
// =============================================================================

/// Creates direct sales and handles explicit status transitions.
#[derive(Debug, Clone)]
pub struct PurchaseTransactionProcessor {
    db: Database,
}

impl PurchaseTransactionProcessor {
    /// Creates a processor over the given database.
    pub fn new(db: Database) -> Self {
        PurchaseTransactionProcessor { db }
    }

    /// Creates a direct sale: validates the cart, freezes prices, persists
    /// the sale, consumes stock, and appends the audit trail atomically.
    pub async fn create_direct_sale(
        &self,
        request: CreateSaleRequest,
    ) -> LedgerResult<CreatedSale> {
        validate_identity("client_id", &request.client_id).map_err(CoreError::from)?;
        validate_line_count(request.lines.len()).map_err(CoreError::from)?;
        for line in &request.lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let mut tx = self.db.begin().await?;

        // Pass 1: load items, check stock, freeze prices, sum the total.
        // The check here produces the caller-facing error before anything
        // is written; the guarded consume below is the authoritative check
        // under the same transaction.
        let mut priced_lines: Vec<(CartLine, Money, Money)> =
            Vec::with_capacity(request.lines.len());
        let mut total = Money::zero(request.currency);
        for cart_line in &request.lines {
            let record = item::fetch_item(&mut tx, &cart_line.item_id)
                .await?
                .filter(|i| i.is_active)
                .ok_or_else(|| LedgerError::ItemNotFound(cart_line.item_id.clone()))?;

            if record.current_stock < cart_line.quantity {
                return Err(LedgerError::InsufficientStock {
                    item_id: cart_line.item_id.clone(),
                    available: record.current_stock,
                    requested: cart_line.quantity,
                });
            }

            let unit_price = record
                .base_price()
                .convert(request.currency, request.conversion_rate);
            let line_total = unit_price.multiply_quantity(cart_line.quantity)?;
            total = total.try_add(line_total)?;
            priced_lines.push((cart_line.clone(), unit_price, line_total));
        }

        // Persist the sale and its snapshots.
        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();
        let record = Sale {
            id: sale_id.clone(),
            client_id: request.client_id,
            status: SaleStatus::Completed,
            total_cents: total.cents(),
            currency: request.currency,
            conversion_rate_scaled: request.conversion_rate.scaled(),
            payment_method: request.payment_method,
            is_paid: false,
            payment_status: PaymentStatus::Pending,
            purchase_date: now,
            created_at: now,
            updated_at: now,
        };
        sale::insert_sale(&mut tx, &record).await?;

        let mut lines: Vec<SaleLine> = Vec::with_capacity(priced_lines.len());
        for (position, (cart_line, unit_price, line_total)) in
            priced_lines.into_iter().enumerate()
        {
            let line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                item_id: cart_line.item_id,
                quantity: cart_line.quantity,
                unit_price_cents: unit_price.cents(),
                total_price_cents: line_total.cents(),
                position: position as i64,
            };
            sale::insert_line(&mut tx, &line).await?;
            lines.push(line);
        }

        // Consume stock per line under the same transaction. A failure on
        // line 3 of 4 rolls back the sale row and the consumption of
        // lines 1-2 together.
        for line in &lines {
            stock_ledger::consume_in_tx(
                &mut tx,
                &line.item_id,
                line.quantity,
                ConsumeKind::Sale,
                Some(&sale_id),
            )
            .await?;
        }

        tx.commit().await.map_err(kardex_db::DbError::from)?;

        info!(
            sale_id = %sale_id,
            client_id = %record.client_id,
            total = %total,
            lines = lines.len(),
            "Direct sale created"
        );

        Ok(CreatedSale {
            sale: record,
            lines,
        })
    }

    /// Transitions a sale's workflow status.
    ///
    /// Validates `new_status` against the enumerated set (`InvalidStatus`
    /// otherwise). Pure field transition: stock is only touched at sale
    /// creation, never by status changes.
    pub async fn update_status(&self, sale_id: &str, new_status: &str) -> LedgerResult<Sale> {
        let status: SaleStatus = new_status.parse()?;

        self.db
            .sales()
            .set_status(sale_id, status)
            .await
            .map_err(|err| match err {
                kardex_db::DbError::NotFound { .. } => {
                    LedgerError::SaleNotFound(sale_id.to_string())
                }
                other => other.into(),
            })?;

        info!(sale_id = %sale_id, status = %status, "Sale status updated");

        self.get_sale(sale_id).await.map(|created| created.sale)
    }

    /// Loads a sale with its line snapshots.
    pub async fn get_sale(&self, sale_id: &str) -> LedgerResult<CreatedSale> {
        let record = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(sale_id.to_string()))?;
        let lines = self.db.sales().get_lines(sale_id).await?;

        Ok(CreatedSale {
            sale: record,
            lines,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock_ledger::StockLedger;
    use crate::testutil::{registered_item, test_db};
    use kardex_core::TransactionType;

    fn rate(text: &str) -> ExchangeRate {
        ExchangeRate::parse(text).unwrap()
    }

    fn usd_request(client: &str, lines: Vec<CartLine>) -> CreateSaleRequest {
        CreateSaleRequest {
            client_id: client.to_string(),
            lines,
            payment_method: PaymentMethod::Cash,
            currency: Currency::Usd,
            conversion_rate: rate("36.50"),
        }
    }

    fn cart(item_id: &str, quantity: i64) -> CartLine {
        CartLine {
            item_id: item_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_direct_sale_freezes_prices_and_consumes_stock() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await; // $10.00
        let b = registered_item(&ledger, "ITEM-B", 4).await;

        let created = processor
            .create_direct_sale(usd_request(
                "client-1",
                vec![cart(&a.id, 3), cart(&b.id, 2)],
            ))
            .await
            .unwrap();

        assert_eq!(created.sale.status, SaleStatus::Completed);
        assert_eq!(created.sale.payment_status, PaymentStatus::Pending);
        assert!(!created.sale.is_paid);
        assert_eq!(created.sale.total_cents, 5000); // 3×$10 + 2×$10
        assert_eq!(created.lines[0].unit_price_cents, 1000);
        assert_eq!(created.lines[0].total_price_cents, 3000);

        assert_eq!(ledger.item(&a.id).await.unwrap().current_stock, 7);
        assert_eq!(ledger.item(&b.id).await.unwrap().current_stock, 2);

        // Each consumption references the sale in the audit trail.
        let trail = ledger.transactions_for(&a.id).await.unwrap();
        let sale_row = trail
            .iter()
            .find(|t| t.transaction_type == TransactionType::Sale)
            .unwrap();
        assert_eq!(sale_row.quantity_delta, -3);
        assert_eq!(sale_row.reference.as_deref(), Some(created.sale.id.as_str()));
    }

    #[tokio::test]
    async fn test_bs_sale_converts_catalog_prices_at_the_snapshot_rate() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db);

        let a = registered_item(&ledger, "ITEM-A", 10).await; // $10.00 catalog

        let mut request = usd_request("client-1", vec![cart(&a.id, 2)]);
        request.currency = Currency::Bs;

        let created = processor.create_direct_sale(request).await.unwrap();

        // $10.00 at 36.50 = 365.00 BS per unit, 730.00 BS total.
        assert_eq!(created.sale.currency, Currency::Bs);
        assert_eq!(created.lines[0].unit_price_cents, 36_500);
        assert_eq!(created.sale.total_cents, 73_000);
    }

    #[tokio::test]
    async fn test_atomicity_failure_on_later_line_leaves_nothing_behind() {
        // §8 atomicity property: consume fails on the third of four lines →
        // no sale row, no stock decrement for lines 1-2.
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db.clone());

        let a = registered_item(&ledger, "ITEM-A", 10).await;
        let b = registered_item(&ledger, "ITEM-B", 10).await;
        let c = registered_item(&ledger, "ITEM-C", 1).await;
        let d = registered_item(&ledger, "ITEM-D", 10).await;

        let err = processor
            .create_direct_sale(usd_request(
                "client-1",
                vec![cart(&a.id, 2), cart(&b.id, 2), cart(&c.id, 2), cart(&d.id, 2)],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));

        // Nothing committed: stock untouched, no sale rows at all.
        assert_eq!(ledger.item(&a.id).await.unwrap().current_stock, 10);
        assert_eq!(ledger.item(&b.id).await.unwrap().current_stock, 10);
        assert_eq!(ledger.item(&c.id).await.unwrap().current_stock, 1);

        let sales = db.sales().list_for_client("client-1", 10).await.unwrap();
        assert!(sales.is_empty());

        // No sale/audit rows beyond the initial registrations either.
        for item in [&a, &b, &c, &d] {
            assert_eq!(ledger.transactions_for(&item.id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_direct_sale_ignores_reservations_when_checking_stock() {
        // The preserved asymmetry: 5 on hand, all 5 reserved for a bundle,
        // and a direct sale of 5 still goes through.
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db);

        let a = registered_item(&ledger, "ITEM-A", 5).await;
        ledger.reserve(&a.id, 5, None).await.unwrap();

        let created = processor
            .create_direct_sale(usd_request("client-1", vec![cart(&a.id, 5)]))
            .await
            .unwrap();

        assert_eq!(created.sale.total_cents, 5000);
        let after = ledger.item(&a.id).await.unwrap();
        assert_eq!(after.current_stock, 0);
        // The matching reservation shrank with the consumption.
        assert_eq!(after.reserved_stock, 0);
    }

    #[tokio::test]
    async fn test_concurrent_sales_for_the_last_unit() {
        // §8 concurrency property: two sales race for current_stock = 1;
        // exactly one succeeds, the other sees InsufficientStock.
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db);

        let a = registered_item(&ledger, "ITEM-A", 1).await;

        let first = processor.create_direct_sale(usd_request("client-1", vec![cart(&a.id, 1)]));
        let second = processor.create_direct_sale(usd_request("client-2", vec![cart(&a.id, 1)]));
        let (first, second) = tokio::join!(first, second);

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let failure = if first.is_err() { first } else { second };
        assert!(matches!(
            failure.unwrap_err(),
            LedgerError::InsufficientStock {
                available: 0,
                requested: 1,
                ..
            }
        ));

        assert_eq!(ledger.item(&a.id).await.unwrap().current_stock, 0);
    }

    #[tokio::test]
    async fn test_unknown_item_and_empty_cart() {
        let db = test_db().await;
        let processor = PurchaseTransactionProcessor::new(db);

        let err = processor
            .create_direct_sale(usd_request("client-1", vec![cart("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ItemNotFound(_)));

        let err = processor
            .create_direct_sale(usd_request("client-1", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(_)));
    }

    #[tokio::test]
    async fn test_update_status_validates_and_transitions() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let processor = PurchaseTransactionProcessor::new(db);

        let a = registered_item(&ledger, "ITEM-A", 5).await;
        let created = processor
            .create_direct_sale(usd_request("client-1", vec![cart(&a.id, 1)]))
            .await
            .unwrap();

        let updated = processor
            .update_status(&created.sale.id, "in_progress")
            .await
            .unwrap();
        assert_eq!(updated.status, SaleStatus::InProgress);

        // Status transitions never touch stock.
        assert_eq!(ledger.item(&a.id).await.unwrap().current_stock, 4);

        assert!(matches!(
            processor
                .update_status(&created.sale.id, "shipped")
                .await
                .unwrap_err(),
            LedgerError::Core(CoreError::InvalidStatus(_))
        ));
        assert!(matches!(
            processor.update_status("ghost", "completed").await.unwrap_err(),
            LedgerError::SaleNotFound(_)
        ));
    }
}
