//! # Payment Reconciliation Engine
//!
//! Accumulates full or partial payments (potentially in two currencies
//! with a floating exchange rate) against a sale's total and derives its
//! paid/unpaid state.
//!
//! ## Reconciliation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_payment is ONE transaction                                      │
//! │                                                                         │
//! │  begin                                                                  │
//! │    1. load sale                      (SaleNotFound)                    │
//! │    2. sum prior PAID payments,       (AlreadyFullyPaid when the        │
//! │       each at its own recorded rate   total is already covered)        │
//! │    3. convert this payment to the                                      │
//! │       sale's native currency                                           │
//! │    4. remaining = total − paid       (floor at zero)                   │
//! │    5. INSERT payment (status paid),                                    │
//! │       UPDATE sale rollup (is_paid, payment_status)                     │
//! │  commit                                                                 │
//! │                                                                         │
//! │  The stored rollup is a convenience for row consumers; every decision  │
//! │  in this engine is made from the recomputed payment sum, so a stale    │
//! │  flag can never let money through twice.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both rate snapshots survive: the sale keeps its creation-time rate, each
//! payment keeps the rate that produced its converted amount. The engine
//! records what rate produced what amount; it never recomputes history.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use kardex_core::validation::validate_reference;
use kardex_core::{settlement, CoreError, ExchangeRate, Money, Payment, PaymentMethod, PaymentStatus};
use kardex_db::repository::sale;
use kardex_db::Database;

use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// A payment to record against a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub sale_id: String,
    /// Amount in the currency it was actually paid in.
    pub amount: Money,
    /// BS-per-USD snapshot at payment time; used to convert when the
    /// payment currency differs from the sale's.
    pub conversion_rate: ExchangeRate,
    pub method: PaymentMethod,
    /// External reference (transfer number, card auth code).
    pub reference: Option<String>,
}

/// Result of recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub is_fully_paid: bool,
    /// Outstanding balance in the sale's native currency (zero when
    /// settled; an overpayment also reports zero).
    pub remaining_balance: Money,
}

// =============================================================================
// Engine
// =============================================================================

/// Records payments and derives settlement state.
#[derive(Debug, Clone)]
pub struct PaymentReconciliationEngine {
    db: Database,
}

impl PaymentReconciliationEngine {
    /// Creates a reconciliation engine over the given database.
    pub fn new(db: Database) -> Self {
        PaymentReconciliationEngine { db }
    }

    /// Records a payment against a sale.
    ///
    /// ## Errors
    /// - `SaleNotFound` when the sale doesn't exist
    /// - `AlreadyFullyPaid` when prior payments already cover the total
    /// - `InvalidAmount` for a zero amount
    pub async fn record_payment(
        &self,
        request: RecordPaymentRequest,
    ) -> LedgerResult<PaymentOutcome> {
        if request.amount.is_zero() {
            return Err(CoreError::InvalidAmount {
                reason: "payment amount must be positive".to_string(),
            }
            .into());
        }
        if let Some(reference) = &request.reference {
            validate_reference(reference).map_err(CoreError::from)?;
        }

        let mut tx = self.db.begin().await?;

        let sale_record = sale::fetch_sale(&mut tx, &request.sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(request.sale_id.clone()))?;

        // Settlement state comes from the recomputed sum, not the stored
        // flag (the flag is updated below for row consumers).
        let prior_payments = sale::fetch_payments(&mut tx, &request.sale_id).await?;
        let prior_paid = settlement::total_paid(sale_record.currency, &prior_payments)?;
        let (already_paid, _) = settlement::derive_status(sale_record.total(), prior_paid);
        if already_paid {
            return Err(LedgerError::AlreadyFullyPaid(request.sale_id));
        }

        // Convert to the sale's native currency at this payment's rate.
        let native_amount = request
            .amount
            .convert(sale_record.currency, request.conversion_rate);
        let total_paid = prior_paid.try_add(native_amount)?;
        let remaining = settlement::outstanding(sale_record.total(), total_paid)?;
        let (is_fully_paid, payment_status) =
            settlement::derive_status(sale_record.total(), total_paid);

        let record = Payment {
            id: Uuid::new_v4().to_string(),
            sale_id: request.sale_id.clone(),
            amount_cents: request.amount.cents(),
            currency: request.amount.currency(),
            conversion_rate_scaled: request.conversion_rate.scaled(),
            method: request.method,
            status: PaymentStatus::Paid,
            transaction_reference: request.reference,
            created_at: Utc::now(),
        };
        sale::insert_payment(&mut tx, &record).await?;
        sale::update_settlement(&mut tx, &request.sale_id, is_fully_paid, payment_status)
            .await?;

        tx.commit().await.map_err(kardex_db::DbError::from)?;

        info!(
            sale_id = %record.sale_id,
            payment_id = %record.id,
            amount = %record.amount(),
            remaining = %remaining,
            is_fully_paid,
            "Payment recorded"
        );

        Ok(PaymentOutcome {
            payment: record,
            is_fully_paid,
            remaining_balance: remaining,
        })
    }

    /// Read-only projection of the outstanding balance.
    ///
    /// Used to prefill payment forms with the exact amount due. Shares the
    /// settlement math with [`record_payment`](Self::record_payment), so
    /// the two can never drift.
    pub async fn get_remaining_balance(&self, sale_id: &str) -> LedgerResult<Money> {
        let sale_record = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(sale_id.to_string()))?;
        let payments = self.db.sales().get_payments(sale_id).await?;

        let paid = settlement::total_paid(sale_record.currency, &payments)?;
        Ok(settlement::outstanding(sale_record.total(), paid)?)
    }

    /// Read-only list of a sale's payments, oldest first.
    pub async fn payments_for(&self, sale_id: &str) -> LedgerResult<Vec<Payment>> {
        if self.db.sales().get_by_id(sale_id).await?.is_none() {
            return Err(LedgerError::SaleNotFound(sale_id.to_string()));
        }
        Ok(self.db.sales().get_payments(sale_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
