//! # Validation Module
//!
//! Input validation utilities for Kardex.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API layer, out of scope)                        │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine boundary (Rust)                                       │
//! │  ├── Type validation (Money::parse, ExchangeRate::parse, FromStr)      │
//! │  └── THIS MODULE: field-level rules                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use kardex_core::validation::validate_sku;
///
/// assert!(validate_sku("CEM-42").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an item or bundle name.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an entity reference (client id, sale id, item id).
///
/// Identities are opaque here; the only rule is presence.
pub fn validate_identity(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a free-text reference attached to payments or adjustments.
pub fn validate_reference(reference: &str) -> ValidationResult<()> {
    if reference.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "reference".to_string(),
            max: 200,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed `MAX_LINE_QUANTITY` (guards against typos like
///   1000 instead of 10)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the number of lines in a cart or bundle definition.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if count > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CEM-42").is_ok());
        assert!(validate_sku("tubo_pvc_110").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("BAD SKU").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_SALE_LINES).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_SALE_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("client_id", "c-123").is_ok());
        assert!(validate_identity("client_id", "  ").is_err());
    }
}
