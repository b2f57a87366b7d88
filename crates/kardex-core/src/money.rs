//! # Money Module
//!
//! Provides the `Money` and `ExchangeRate` types for handling monetary
//! values safely across the two operating currencies (USD and BS).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  At an exchange rate of 36.50 BS/USD:                                   │
//! │    100.00 × 36.50 as floats can drift by fractions of a céntimo,        │
//! │    and a drifted balance never reaches exactly zero.                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Amounts are cents (i64), rates are scaled by 10,000 (i64).           │
//! │    All arithmetic is integer arithmetic with explicit rounding.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kardex_core::money::{Currency, ExchangeRate, Money};
//!
//! // Parse at the input boundary (validates sign and precision)
//! let total = Money::parse("100.00", Currency::Usd).unwrap();
//! let rate = ExchangeRate::parse("36.50").unwrap();
//!
//! // A BS payment converted back to the sale currency settles exactly
//! let paid = Money::parse("3650.00", Currency::Bs).unwrap();
//! assert_eq!(paid.convert(Currency::Usd, rate), total);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Currency
// =============================================================================

/// The currencies the operation trades in.
///
/// ## Design Decision
/// A closed enum, not an ISO-4217 string: the business runs on exactly two
/// currencies and every conversion is anchored to the BS-per-USD rate.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// Venezuelan bolívar.
    Bs,
}

impl Currency {
    /// Returns the display code for the currency.
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Bs => "BS",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "bs" => Ok(Currency::Bs),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: vec!["usd".to_string(), "bs".to_string()],
            }),
        }
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// Number of scaled units per whole rate unit (10^4 = four decimal places).
pub const RATE_SCALE: i64 = 10_000;

/// A BS-per-USD exchange rate snapshot, scaled by [`RATE_SCALE`].
///
/// ## Why A Scaled Integer?
/// Same reasoning as [`Money`]: `36.50` is stored as `365000`, so rate
/// arithmetic never touches floating point. Four decimal places cover the
/// granularity published by the central bank.
///
/// ## Example
/// ```rust
/// use kardex_core::money::ExchangeRate;
///
/// let rate = ExchangeRate::parse("36.50").unwrap();
/// assert_eq!(rate.scaled(), 365_000);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// Creates a rate from a validated scaled value.
    ///
    /// ## Errors
    /// `InvalidRate` when the scaled value is not strictly positive.
    pub fn new(scaled: i64) -> CoreResult<Self> {
        if scaled <= 0 {
            return Err(CoreError::InvalidRate {
                reason: format!("rate must be positive, got {scaled} (scaled)"),
            });
        }
        Ok(ExchangeRate(scaled))
    }

    /// Creates a rate from a scaled value already known to be valid.
    ///
    /// ## Trust Boundary
    /// For rehydrating storage rows that were validated on the way in.
    /// External input goes through [`ExchangeRate::new`] or
    /// [`ExchangeRate::parse`].
    #[inline]
    pub const fn from_scaled(scaled: i64) -> Self {
        ExchangeRate(scaled)
    }

    /// Parses a decimal string such as `"36.50"` into a rate.
    ///
    /// ## Rules
    /// - Must be strictly positive
    /// - At most 4 fractional digits
    ///
    /// ## Errors
    /// `InvalidRate` on violation of either rule or on non-numeric input.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let scaled = parse_scaled_decimal(input, 4, RATE_SCALE).map_err(|reason| {
            CoreError::InvalidRate { reason }
        })?;
        ExchangeRate::new(scaled)
    }

    /// Returns the rate scaled by [`RATE_SCALE`].
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / RATE_SCALE, self.0 % RATE_SCALE)
    }
}

// =============================================================================
// Money
// =============================================================================

/// A non-negative monetary amount in minor units (cents) with a currency tag.
///
/// ## Design Decisions
/// - **i64 cents**: exact arithmetic, no binary floating-point drift
/// - **Currency tag**: cross-currency arithmetic is a typed error, not a
///   silent unit bug
/// - **Non-negative**: this engine never represents debt as negative money;
///   outstanding balances floor at zero
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InventoryItem.base_price ──► SaleLine.unit_price ──► SaleLine.total    │
/// │                                                            │            │
/// │                             Sale.total_amount ◄────────────┘            │
/// │                                    │                                    │
/// │  Payment.amount ──convert(rate)──► settlement::total_paid               │
/// │                                    │                                    │
/// │                             remaining balance / paid status             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money {
    cents: i64,
    currency: Currency,
}

impl Money {
    /// Creates a validated Money value from minor units.
    ///
    /// ## Errors
    /// `InvalidAmount` when `cents` is negative.
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::{Currency, Money};
    ///
    /// let price = Money::new(1099, Currency::Usd).unwrap(); // $10.99
    /// assert!(Money::new(-1, Currency::Usd).is_err());
    /// ```
    pub fn new(cents: i64, currency: Currency) -> CoreResult<Self> {
        if cents < 0 {
            return Err(CoreError::InvalidAmount {
                reason: format!("amount must not be negative, got {cents} cents"),
            });
        }
        Ok(Money { cents, currency })
    }

    /// Creates a Money value from minor units already known to be valid.
    ///
    /// ## Trust Boundary
    /// For rehydrating storage rows (the schema enforces non-negative
    /// amounts). External input goes through [`Money::new`] or
    /// [`Money::parse`].
    #[inline]
    pub const fn from_cents(cents: i64, currency: Currency) -> Self {
        Money { cents, currency }
    }

    /// Parses a decimal string such as `"123.45"` into Money.
    ///
    /// ## Rules
    /// - Must not be negative
    /// - At most 2 fractional digits (a price of `"1.999"` is a data bug,
    ///   not a rounding candidate)
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::{Currency, Money};
    ///
    /// assert_eq!(Money::parse("10.99", Currency::Usd).unwrap().cents(), 1099);
    /// assert_eq!(Money::parse("10.5", Currency::Usd).unwrap().cents(), 1050);
    /// assert!(Money::parse("10.999", Currency::Usd).is_err());
    /// assert!(Money::parse("-1.00", Currency::Usd).is_err());
    /// ```
    pub fn parse(input: &str, currency: Currency) -> CoreResult<Self> {
        let cents = parse_scaled_decimal(input, 2, 100).map_err(|reason| {
            CoreError::InvalidAmount { reason }
        })?;
        Money::new(cents, currency)
    }

    /// Returns zero in the given currency.
    #[inline]
    pub const fn zero(currency: Currency) -> Self {
        Money { cents: 0, currency }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the currency tag.
    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Adds two amounts of the same currency.
    ///
    /// ## Errors
    /// - `CurrencyMismatch` when the currencies differ
    /// - `InvalidAmount` on overflow
    pub fn try_add(&self, other: Money) -> CoreResult<Money> {
        self.require_same_currency(other)?;
        let cents = self.cents.checked_add(other.cents).ok_or_else(|| {
            CoreError::InvalidAmount {
                reason: "amount overflow in addition".to_string(),
            }
        })?;
        Ok(Money {
            cents,
            currency: self.currency,
        })
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// Used for outstanding-balance math where an overpayment simply means
    /// the balance is settled, never negative.
    ///
    /// ## Errors
    /// `CurrencyMismatch` when the currencies differ.
    pub fn saturating_sub(&self, other: Money) -> CoreResult<Money> {
        self.require_same_currency(other)?;
        Ok(Money {
            cents: (self.cents - other.cents).max(0),
            currency: self.currency,
        })
    }

    /// Multiplies the amount by an item quantity.
    ///
    /// ## Errors
    /// - `InvalidQuantity` when `quantity` is not positive
    /// - `InvalidAmount` on overflow
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::{Currency, Money};
    ///
    /// let unit = Money::new(299, Currency::Usd).unwrap(); // $2.99
    /// assert_eq!(unit.multiply_quantity(3).unwrap().cents(), 897);
    /// ```
    pub fn multiply_quantity(&self, quantity: i64) -> CoreResult<Money> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                requested: quantity,
            });
        }
        let cents = self.cents.checked_mul(quantity).ok_or_else(|| {
            CoreError::InvalidAmount {
                reason: format!("amount overflow multiplying by {quantity}"),
            }
        })?;
        Ok(Money {
            cents,
            currency: self.currency,
        })
    }

    /// Converts the amount to `target` using a BS-per-USD rate snapshot.
    ///
    /// ## Rounding
    /// Half-up on the final minor unit, computed in `i128` so intermediate
    /// products cannot overflow:
    /// ```text
    /// USD → BS:  (cents × rate + RATE_SCALE/2) / RATE_SCALE
    /// BS → USD:  (cents × RATE_SCALE + rate/2) / rate
    /// ```
    /// Same-currency conversion is the identity, whatever the rate.
    ///
    /// ## Example
    /// ```rust
    /// use kardex_core::money::{Currency, ExchangeRate, Money};
    ///
    /// let rate = ExchangeRate::parse("36.50").unwrap();
    /// let usd = Money::parse("100.00", Currency::Usd).unwrap();
    /// assert_eq!(usd.convert(Currency::Bs, rate).cents(), 365_000);
    /// ```
    pub fn convert(&self, target: Currency, rate: ExchangeRate) -> Money {
        if self.currency == target {
            return *self;
        }
        let cents = self.cents as i128;
        let scaled = rate.scaled() as i128;
        let scale = RATE_SCALE as i128;
        let converted = match target {
            Currency::Bs => (cents * scaled + scale / 2) / scale,
            Currency::Usd => (cents * scale + scaled / 2) / scaled,
        };
        Money {
            cents: converted as i64,
            currency: target,
        }
    }

    fn require_same_currency(&self, other: Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }
}

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The UI handles locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency.code(),
            self.cents / 100,
            self.cents % 100
        )
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses a non-negative decimal string into an integer scaled by `scale`.
///
/// `max_fraction` bounds the accepted fractional digits; shorter fractions
/// are right-padded (`"10.5"` with scale 100 → `1050`). Implemented on
/// integers end to end so parsing can never introduce float drift.
fn parse_scaled_decimal(input: &str, max_fraction: u32, scale: i64) -> Result<i64, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("value is empty".to_string());
    }
    if let Some(stripped) = text.strip_prefix('-') {
        return Err(format!("value must not be negative, got -{stripped}"));
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("'{text}' is not a number"));
    }
    if fraction.len() as u32 > max_fraction {
        return Err(format!(
            "'{text}' has more than {max_fraction} fractional digits"
        ));
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("'{text}' is not a number"));
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| format!("'{text}' is out of range"))?
    };

    let mut fraction_units: i64 = 0;
    if !fraction.is_empty() {
        fraction_units = fraction
            .parse()
            .map_err(|_| format!("'{text}' is out of range"))?;
        for _ in 0..(max_fraction as usize - fraction.len()) {
            fraction_units *= 10;
        }
    }

    whole_units
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(|| format!("'{text}' is out of range"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(Money::parse("10.99", Currency::Usd).unwrap().cents(), 1099);
        assert_eq!(Money::parse("10.5", Currency::Usd).unwrap().cents(), 1050);
        assert_eq!(Money::parse("10", Currency::Bs).unwrap().cents(), 1000);
        assert_eq!(Money::parse("0.05", Currency::Usd).unwrap().cents(), 5);
        assert_eq!(Money::parse(".50", Currency::Usd).unwrap().cents(), 50);
    }

    #[test]
    fn test_parse_money_rejects_excess_precision() {
        let err = Money::parse("10.999", Currency::Usd).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_parse_money_rejects_negative() {
        assert!(Money::parse("-1.00", Currency::Usd).is_err());
        assert!(Money::new(-1, Currency::Usd).is_err());
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(Money::parse("", Currency::Usd).is_err());
        assert!(Money::parse("abc", Currency::Usd).is_err());
        assert!(Money::parse("1.2.3", Currency::Usd).is_err());
        assert!(Money::parse("1,50", Currency::Usd).is_err());
    }

    #[test]
    fn test_rate_parse_and_bounds() {
        assert_eq!(ExchangeRate::parse("36.50").unwrap().scaled(), 365_000);
        assert_eq!(ExchangeRate::parse("36.5001").unwrap().scaled(), 365_001);
        assert!(ExchangeRate::parse("0").is_err());
        assert!(ExchangeRate::parse("36.50001").is_err());
        assert!(ExchangeRate::new(0).is_err());
        assert!(ExchangeRate::new(-10).is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(1000, Currency::Usd).unwrap();
        let b = Money::new(250, Currency::Usd).unwrap();

        assert_eq!(a.try_add(b).unwrap().cents(), 1250);
        assert_eq!(a.saturating_sub(b).unwrap().cents(), 750);
        assert_eq!(b.saturating_sub(a).unwrap().cents(), 0);
        assert_eq!(b.multiply_quantity(4).unwrap().cents(), 1000);
    }

    #[test]
    fn test_currency_mismatch_is_an_error() {
        let usd = Money::new(100, Currency::Usd).unwrap();
        let bs = Money::new(100, Currency::Bs).unwrap();

        assert!(matches!(
            usd.try_add(bs).unwrap_err(),
            CoreError::CurrencyMismatch { .. }
        ));
        assert!(matches!(
            usd.saturating_sub(bs).unwrap_err(),
            CoreError::CurrencyMismatch { .. }
        ));
    }

    #[test]
    fn test_multiply_rejects_non_positive_quantity() {
        let unit = Money::new(100, Currency::Usd).unwrap();
        assert!(unit.multiply_quantity(0).is_err());
        assert!(unit.multiply_quantity(-3).is_err());
    }

    #[test]
    fn test_convert_round_trip_exact() {
        // The §8 currency property: 100.00 USD at 36.50 is settled by
        // exactly 3650.00 BS.
        let rate = ExchangeRate::parse("36.50").unwrap();
        let total = Money::parse("100.00", Currency::Usd).unwrap();
        let paid = Money::parse("3650.00", Currency::Bs).unwrap();

        assert_eq!(total.convert(Currency::Bs, rate), paid);
        assert_eq!(paid.convert(Currency::Usd, rate), total);
    }

    #[test]
    fn test_convert_rounds_half_up() {
        // 0.01 USD at 36.5001 = 0.365001 BS → 0.37 BS
        let rate = ExchangeRate::parse("36.5001").unwrap();
        let cent = Money::new(1, Currency::Usd).unwrap();
        assert_eq!(cent.convert(Currency::Bs, rate).cents(), 37);

        // 1 BS-cent back to USD at 36.50 is 0.027 cents → 0
        let rate = ExchangeRate::parse("36.50").unwrap();
        let centimo = Money::new(1, Currency::Bs).unwrap();
        assert_eq!(centimo.convert(Currency::Usd, rate).cents(), 0);
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rate = ExchangeRate::parse("36.50").unwrap();
        let amount = Money::new(12345, Currency::Usd).unwrap();
        assert_eq!(amount.convert(Currency::Usd, rate), amount);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", Money::new(1099, Currency::Usd).unwrap()),
            "USD 10.99"
        );
        assert_eq!(
            format!("{}", Money::new(365_000, Currency::Bs).unwrap()),
            "BS 3650.00"
        );
        assert_eq!(format!("{}", ExchangeRate::parse("36.50").unwrap()), "36.5000");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("BS".parse::<Currency>().unwrap(), Currency::Bs);
        assert!("eur".parse::<Currency>().is_err());
    }
}
