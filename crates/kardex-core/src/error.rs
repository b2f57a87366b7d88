//! # Error Types
//!
//! Domain-specific error types for kardex-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kardex-core errors (this file)                                        │
//! │  ├── CoreError        - Money/rate/quantity domain errors              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kardex-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  kardex-engine errors (separate crate)                                 │
//! │  └── LedgerError      - The public error taxonomy callers see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, quantities, currencies)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Currency;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors for money, rates, quantities, and statuses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed monetary amount.
    ///
    /// ## When This Occurs
    /// - Negative amount where negativity is disallowed
    /// - More than 2 fractional digits in a decimal input
    /// - Arithmetic overflow
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Malformed or non-positive exchange rate.
    #[error("Invalid exchange rate: {reason}")]
    InvalidRate { reason: String },

    /// Arithmetic attempted across different currencies without conversion.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Quantity is zero or negative where a positive count is required.
    #[error("Invalid quantity: {requested} (must be positive)")]
    InvalidQuantity { requested: i64 },

    /// A status value outside the enumerated set.
    ///
    /// ## When This Occurs
    /// - `update_status` called with an unknown status string
    /// - A stale client sending a retired status value
    #[error("Invalid status: '{0}'")]
    InvalidStatus(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid characters in a SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CurrencyMismatch {
            left: Currency::Usd,
            right: Currency::Bs,
        };
        assert_eq!(err.to_string(), "Currency mismatch: USD vs BS");

        let err = CoreError::InvalidQuantity { requested: -2 };
        assert_eq!(err.to_string(), "Invalid quantity: -2 (must be positive)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
