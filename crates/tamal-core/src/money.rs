//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Spreadsheet cells come back as "8.5", "$1,234.50", "20.0" ...          │
//! │  Summing those as floats drifts: 0.1 + 0.2 = 0.30000000000000004        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "$8.50"  → 850 cents                                                 │
//! │    margin  = (2000 - 850) × 3 = 3450 cents                              │
//! │    Every ledger sum is exact; rounding happens once, at the edge        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tamal_core::money::Money;
//!
//! let price = Money::from_cents(2000); // $20.00
//! let line = price * 3;                // $60.00
//! assert_eq!(line.cents(), 6000);
//!
//! // Store cells normalize to the same value however they were formatted
//! assert_eq!(Money::parse("$1,234.50"), Money::parse("1234.5"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative margins when cost exceeds price
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Serializes as plain cents
///
/// ## Where Money is Used
/// ```text
/// Product.price ──┬──► LineItem.unit_price ──► LineItem.revenue ──► Ticket.total
///                 │
/// Product.cost ───┴──► LineItem.unit_cost  ──► LineItem.margin  ──► Ticket.margin
///
/// IngredientLine.contribution ──► Σ / yield ──► Product.cost
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tamal_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(8, 50).cents(), 850);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use tamal_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2000);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 6000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by an exact ratio, rounding half away from zero.
    ///
    /// Used for the suggested price tiers (cost × 3/2, cost × 3/1).
    pub fn mul_ratio(&self, numerator: u32, denominator: u32) -> Money {
        let denominator = i128::from(denominator.max(1));
        let product = i128::from(self.0) * i128::from(numerator);
        Money(round_div_i128(product, denominator) as i64)
    }

    /// Scales by a measured factor (a lot fraction, grams used, ...),
    /// rounding to the nearest cent.
    ///
    /// The factor comes from a physical measurement, so it is a float; the
    /// result goes straight back to integer cents.
    pub fn scale(&self, factor: f64) -> Money {
        Money((self.0 as f64 * factor).round() as i64)
    }

    /// Divides into `parts` equal shares, rounding half away from zero.
    ///
    /// Returns `None` when `parts` is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use tamal_core::money::Money;
    ///
    /// // A $425.00 pot that yields 50 tamales costs $8.50 each
    /// let unit = Money::from_cents(42500).checked_div_round(50).unwrap();
    /// assert_eq!(unit.cents(), 850);
    /// assert!(Money::from_cents(100).checked_div_round(0).is_none());
    /// ```
    pub fn checked_div_round(&self, parts: i64) -> Option<Money> {
        if parts <= 0 {
            return None;
        }
        Some(Money(round_div_i128(i128::from(self.0), i128::from(parts)) as i64))
    }

    /// Parses a currency-formatted cell into cents.
    ///
    /// ## Normalization Rules
    /// - `$`, `,` and surrounding whitespace are stripped
    /// - A third decimal rounds half away from zero (`8.505` → 851)
    /// - Anything else that is not a plain decimal yields `None`
    ///
    /// ## Example
    /// ```rust
    /// use tamal_core::money::Money;
    ///
    /// assert_eq!(Money::parse("$1,234.50").unwrap().cents(), 123450);
    /// assert_eq!(Money::parse("8.5").unwrap().cents(), 850);
    /// assert_eq!(Money::parse("-$5").unwrap().cents(), -500);
    /// assert!(Money::parse("n/a").is_none());
    /// assert!(Money::parse("").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Money> {
        let cleaned: String = text
            .chars()
            .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
            .collect();

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
        };

        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().ok()?.checked_mul(100)?
        };

        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().is_some_and(|d| d >= 5);

        let mut cents = whole_cents.checked_add(tenths * 10 + hundredths)?;
        if round_up {
            cents = cents.checked_add(1)?;
        }

        Some(Money(if negative { -cents } else { cents }))
    }

    /// Formats as a plain decimal for storage (`"8.50"`, `"-5.50"`).
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

    /// Returns `self / other` as a percentage, or 0 when `other` is zero.
    ///
    /// Display only; never feed the result back into money arithmetic.
    pub fn percent_of(&self, other: Money) -> f64 {
        if other.is_zero() {
            return 0.0;
        }
        self.0 as f64 / other.0 as f64 * 100.0
    }
}

/// Integer division rounding half away from zero.
fn round_div_i128(value: i128, divisor: i128) -> i128 {
    let half = divisor / 2;
    if value >= 0 {
        (value + half) / divisor
    } else {
        (value - half) / divisor
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
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
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_plain_string_is_parseable() {
        for cents in [0, 5, 850, 2000, -550, 123_456] {
            let text = Money::from_cents(cents).to_plain_string();
            assert_eq!(Money::parse(&text), Some(Money::from_cents(cents)), "{text}");
        }
        assert_eq!(Money::from_cents(850).to_plain_string(), "8.50");
        assert_eq!(Money::from_cents(-5).to_plain_string(), "-0.05");
    }

    #[test]
    fn test_parse_currency_formats() {
        assert_eq!(Money::parse("20").unwrap().cents(), 2000);
        assert_eq!(Money::parse("20.0").unwrap().cents(), 2000);
        assert_eq!(Money::parse(" $20 ").unwrap().cents(), 2000);
        assert_eq!(Money::parse(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse("8.505").unwrap().cents(), 851);
        assert_eq!(Money::parse("8.504").unwrap().cents(), 850);
        assert_eq!(Money::parse("-8.505").unwrap().cents(), -851);
        assert!(Money::parse("12abc").is_none());
        assert!(Money::parse("1.2.3").is_none());
        assert!(Money::parse("$").is_none());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_mul_ratio_for_suggested_prices() {
        let cost = Money::from_cents(850);
        assert_eq!(cost.mul_ratio(3, 2).cents(), 1275);
        assert_eq!(cost.mul_ratio(3, 1).cents(), 2550);
        assert_eq!(Money::from_cents(1).mul_ratio(3, 2).cents(), 2); // 1.5 rounds up
    }

    #[test]
    fn test_scale_rounds_to_nearest_cent() {
        let bag = Money::from_cents(9000); // $90 for 1000 g
        assert_eq!(bag.scale(0.25).cents(), 2250);
        assert_eq!(Money::from_cents(100).scale(1.0 / 3.0).cents(), 33);
    }

    #[test]
    fn test_checked_div_round() {
        assert_eq!(Money::from_cents(1000).checked_div_round(3).unwrap().cents(), 333);
        assert_eq!(Money::from_cents(50).checked_div_round(3).unwrap().cents(), 17);
        assert_eq!(Money::from_cents(5).checked_div_round(2).unwrap().cents(), 3);
        assert_eq!(Money::from_cents(-5).checked_div_round(2).unwrap().cents(), -3);
        assert!(Money::from_cents(5).checked_div_round(0).is_none());
        assert!(Money::from_cents(5).checked_div_round(-1).is_none());
    }

    #[test]
    fn test_percent_of() {
        let margin = Money::from_cents(3450);
        let revenue = Money::from_cents(6000);
        assert!((margin.percent_of(revenue) - 57.5).abs() < 1e-9);
        assert_eq!(margin.percent_of(Money::zero()), 0.0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
