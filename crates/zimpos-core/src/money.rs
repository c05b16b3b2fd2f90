//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A sale's subtotal MUST equal the sum of its lines, to the cent.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "5.00" × 2 + "20.00" = 500×2 + 2000 = 3000 cents = "30.00"          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Internally everything is cents (`i64`). On the HTTP boundary amounts travel
//! as two-place decimal strings (`"32.00"`), see [`decimal`].
//!
//! ## Usage
//! ```rust
//! use zimpos_core::money::Money;
//!
//! let price = Money::parse("5.00").unwrap();
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.to_string(), "10.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and reversals
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: serde as plain cents; use [`decimal`] for the wire format
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleItem.unit_price × quantity ──► SaleItem.total_price               │
/// │                                                                         │
/// │  Σ total_price ──► Sale.subtotal ──► + tax − discount ──► total_amount │
/// │                                                                         │
/// │  total_amount ──► Session.total_sales                                   │
/// │               ──► LedgerAccount.current_balance                         │
/// │               ──► Fiscal payload                                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use zimpos_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses a decimal amount such as `"32.00"`, `"5.5"` or `"7"`.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At least one digit before the decimal point
    /// - At most two fractional digits (no silent rounding)
    ///
    /// ## Example
    /// ```rust
    /// use zimpos_core::money::Money;
    ///
    /// assert_eq!(Money::parse("32.00").unwrap().cents(), 3200);
    /// assert_eq!(Money::parse("5.5").unwrap().cents(), 550);
    /// assert!(Money::parse("1.005").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Money, MoneyParseError> {
        let raw = input.trim();
        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let (major_str, minor_str) = match unsigned.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (unsigned, ""),
        };

        if major_str.is_empty() || !major_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyParseError::Malformed(input.to_string()));
        }
        if !minor_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyParseError::Malformed(input.to_string()));
        }
        if minor_str.len() > 2 {
            return Err(MoneyParseError::TooPrecise(input.to_string()));
        }
        if unsigned.ends_with('.') {
            return Err(MoneyParseError::Malformed(input.to_string()));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| MoneyParseError::OutOfRange(input.to_string()))?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().unwrap_or(0) * 10,
            _ => minor_str.parse::<i64>().unwrap_or(0),
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| MoneyParseError::OutOfRange(input.to_string()))?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use zimpos_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(500);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 1000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Checked variant of [`Money::multiply_quantity`].
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Checked addition.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// Errors produced by [`Money::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    #[error("'{0}' is not a decimal amount")]
    Malformed(String),

    #[error("'{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as a plain two-place decimal, e.g. `32.00` or `-5.50`.
///
/// The currency code travels separately; this is also the wire format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Decimal Wire Format
// =============================================================================

/// serde helpers that (de)serialize [`Money`] as a decimal string.
///
/// ## Accepted Input
/// ```text
/// "32.00"  → 3200     (preferred)
/// 32       → 3200     (JSON integer, major units)
/// 32.5     → 3250     (JSON number, at most two places)
/// ```
///
/// ## Usage
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct Line {
///     #[serde(with = "zimpos_core::money::decimal")]
///     unit_price: Money,
/// }
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }

    struct MoneyVisitor;

    impl<'de> Visitor<'de> for MoneyVisitor {
        type Value = Money;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal amount such as \"12.50\"")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
            Money::parse(v).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
            v.checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
            i64::try_from(v)
                .map_err(|_| E::custom("amount out of range"))
                .and_then(|v| self.visit_i64(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
            if !v.is_finite() {
                return Err(E::custom("amount must be finite"));
            }
            // Reuse the string rules so 1.005 is rejected rather than rounded
            Money::parse(&v.to_string()).map_err(E::custom)
        }
    }

    /// Same as the parent module, for `Option<Money>` fields.
    pub mod option {
        use super::super::Money;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Money>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(m) => serializer.collect_str(m),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Money>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] Money);

            let wrapped: Option<Wrapper> = Option::deserialize(deserializer)?;
            Ok(wrapped.map(|Wrapper(m)| m))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Money::default(), Money::zero());
        assert_eq!(None::<Money>.unwrap_or_default().to_string(), "0.00");
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(3200).to_string(), "32.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse_accepts_common_shapes() {
        assert_eq!(Money::parse("32.00").unwrap().cents(), 3200);
        assert_eq!(Money::parse("5.5").unwrap().cents(), 550);
        assert_eq!(Money::parse("7").unwrap().cents(), 700);
        assert_eq!(Money::parse(" 0.01 ").unwrap().cents(), 1);
        assert_eq!(Money::parse("-2.25").unwrap().cents(), -225);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Money::parse("1.005"), Err(MoneyParseError::TooPrecise(_))));
        assert!(matches!(Money::parse(""), Err(MoneyParseError::Malformed(_))));
        assert!(matches!(Money::parse(".50"), Err(MoneyParseError::Malformed(_))));
        assert!(matches!(Money::parse("5."), Err(MoneyParseError::Malformed(_))));
        assert!(matches!(Money::parse("abc"), Err(MoneyParseError::Malformed(_))));
        assert!(matches!(Money::parse("1e3"), Err(MoneyParseError::Malformed(_))));
        assert!(matches!(
            Money::parse("99999999999999999999"),
            Err(MoneyParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_sum_has_no_drift() {
        // 0.10 added ten times is exactly 1.00
        let dimes = vec![Money::parse("0.10").unwrap(); 10];
        let total: Money = dimes.iter().sum();
        assert_eq!(total, Money::parse("1.00").unwrap());
    }

    #[test]
    fn test_checked_multiply_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_multiply_quantity(2).is_none());
        assert_eq!(
            Money::from_cents(299).checked_multiply_quantity(3),
            Some(Money::from_cents(897))
        );
    }

    #[derive(Debug, Deserialize, Serialize)]
    struct Line {
        #[serde(with = "decimal")]
        price: Money,
        #[serde(default, with = "decimal::option")]
        tax: Option<Money>,
    }

    #[test]
    fn test_decimal_serde_shapes() {
        let line: Line = serde_json::from_str(r#"{"price": "5.00", "tax": "2.00"}"#).unwrap();
        assert_eq!(line.price.cents(), 500);
        assert_eq!(line.tax.map(|t| t.cents()), Some(200));

        let line: Line = serde_json::from_str(r#"{"price": 20}"#).unwrap();
        assert_eq!(line.price.cents(), 2000);
        assert!(line.tax.is_none());

        let line: Line = serde_json::from_str(r#"{"price": 12.5, "tax": null}"#).unwrap();
        assert_eq!(line.price.cents(), 1250);

        assert!(serde_json::from_str::<Line>(r#"{"price": "1.999"}"#).is_err());

        let json = serde_json::to_value(Line {
            price: Money::from_cents(3200),
            tax: None,
        })
        .unwrap();
        assert_eq!(json["price"], "32.00");
        assert!(json["tax"].is_null());
    }
}
