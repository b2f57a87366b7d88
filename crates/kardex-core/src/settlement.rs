//! # Settlement Math
//!
//! Pure reconciliation arithmetic shared by every path that asks "how much
//! of this sale is paid?".
//!
//! ## Why One Module
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_payment (authoritative)      get_remaining_balance (read-only)  │
//! │        │                                     │                          │
//! │        └──────────────┬──────────────────────┘                          │
//! │                       ▼                                                 │
//! │              settlement::total_paid                                     │
//! │              settlement::outstanding                                    │
//! │              settlement::derive_status                                  │
//! │                                                                         │
//! │  One implementation means the prefilled payment form and the            │
//! │  authoritative write path can never disagree about the balance.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rate Handling
//! Each payment is converted to the sale's native currency at the rate
//! recorded on that payment. Historical rates are never re-derived from the
//! current rate; the audit stays reproducible.

use crate::error::CoreResult;
use crate::money::{Currency, Money};
use crate::types::{Payment, PaymentStatus};

/// Sums the PAID payments of a sale in the sale's native currency.
///
/// Non-PAID rows (pending, cancelled, overdue) contribute nothing.
///
/// ## Errors
/// `InvalidAmount` on overflow of the accumulated sum.
pub fn total_paid(native: Currency, payments: &[Payment]) -> CoreResult<Money> {
    let mut sum = Money::zero(native);
    for payment in payments {
        if payment.status != PaymentStatus::Paid {
            continue;
        }
        sum = sum.try_add(payment.amount_in(native))?;
    }
    Ok(sum)
}

/// Returns the outstanding balance, floored at zero.
///
/// An overpayment (paid > total) reports a zero balance; the engine never
/// represents change or credit as negative money.
pub fn outstanding(total: Money, paid: Money) -> CoreResult<Money> {
    total.saturating_sub(paid)
}

/// Derives the sale-level settlement rollup from the paid sum.
///
/// ```text
/// paid ≥ total  →  (is_paid = true,  Paid)
/// 0 < paid      →  (is_paid = false, Partial)
/// paid = 0      →  (is_paid = false, Pending)
/// ```
pub fn derive_status(total: Money, paid: Money) -> (bool, PaymentStatus) {
    if paid.cents() >= total.cents() {
        (true, PaymentStatus::Paid)
    } else if paid.cents() > 0 {
        (false, PaymentStatus::Partial)
    } else {
        (false, PaymentStatus::Pending)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
