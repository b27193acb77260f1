//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A spreadsheet price of 0.1 summed three times:                         │
//! │    0.1 + 0.1 + 0.1 = 0.30000000000000004  ❌                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                      │
//! │    10 + 10 + 10 = 30  →  "0.30"                                         │
//! │                                                                         │
//! │  Decimal strings from files are parsed straight into minor units,      │
//! │  and written back with exactly two fractional digits.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! One rule everywhere: **half-up** (half away from zero) to two fractional
//! digits. Parsing "0.125" gives 0.13 and 18% of 0.25 gives 0.05. Cart
//! totals, bill sheets and CSV exports all go through this type, so the
//! numbers printed on screen are the numbers persisted.
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price: Money = "12.50".parse().unwrap();
//! assert_eq!(price.cents(), 1250);
//!
//! let line = price * 3;
//! assert_eq!(line.to_string(), "37.50");
//! assert_eq!(line.with_symbol("₹"), "₹37.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: stock values never go negative, but differences can
/// - **Single field tuple struct**: zero-cost wrapper over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InventoryItem.price ──► CartLine.unit_price ──► CartLine.line_total    │
/// │                                                                         │
/// │  Cart subtotal ──► tax (half-up) ──► grand total ──► bill sheet / CSV   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (rupees, dollars).
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

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax rounded half-up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(|amount| * bps + 5000) / 10000`,
    /// sign restored afterwards so rounding is symmetric around zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(2500); // 25.00
    /// let gst = subtotal.calculate_tax(TaxRate::from_bps(1800));
    /// assert_eq!(gst.cents(), 450); // 4.50
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large subtotals from overflowing before the division
        let magnitude = (self.0 as i128).abs() * rate.bps() as i128;
        let rounded = ((magnitude + 5000) / 10000) as i64;
        Money::from_cents(if self.0 < 0 { -rounded } else { rounded })
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 2000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `self * qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Formats with a currency symbol in front, e.g. `₹12.50`.
    pub fn with_symbol(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a plain decimal ("12", "12.5", "12.50", "-3.00").
///
/// More than two fractional digits are rounded half-up, so values written by
/// spreadsheet tools as `12.499999999` or `0.125` land on a whole minor unit.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' is not a decimal amount", raw),
        };

        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().map_or(0, |d| i64::from(d >= 5));

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + round_up))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering ("12.50"), used for files and exports.
/// Use [`Money::with_symbol`] for display.
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
        iter.fold(Money::zero(), Add::add)
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
    }

    #[test]
    fn test_with_symbol() {
        assert_eq!(Money::from_cents(2950).with_symbol("₹"), "₹29.50");
        assert_eq!(Money::from_cents(-25).with_symbol("$"), "-$0.25");
    }

    #[test]
    fn test_parse_plain_decimals() {
        assert_eq!("12".parse::<Money>().unwrap().cents(), 1200);
        assert_eq!("12.5".parse::<Money>().unwrap().cents(), 1250);
        assert_eq!(" 12.50 ".parse::<Money>().unwrap().cents(), 1250);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("7.".parse::<Money>().unwrap().cents(), 700);
        assert_eq!("-3.00".parse::<Money>().unwrap().cents(), -300);
        assert_eq!("+0.01".parse::<Money>().unwrap().cents(), 1);
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!("0.125".parse::<Money>().unwrap().cents(), 13);
        assert_eq!("0.1249".parse::<Money>().unwrap().cents(), 12);
        assert_eq!("9.999".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("-0.125".parse::<Money>().unwrap().cents(), -13);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", "abc", "12,50", "1.2.3", "1e3", "--1", "₹10"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_gst_eighteen_percent() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(Money::from_cents(2500).calculate_tax(rate).cents(), 450);
        assert_eq!(Money::from_cents(10000).calculate_tax(rate).cents(), 1800);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let rate = TaxRate::from_bps(1800);
        // 0.25 × 18% = 0.045 → 0.05
        assert_eq!(Money::from_cents(25).calculate_tax(rate).cents(), 5);
        // 0.24 × 18% = 0.0432 → 0.04
        assert_eq!(Money::from_cents(24).calculate_tax(rate).cents(), 4);
        // symmetric for negative amounts
        assert_eq!(Money::from_cents(-25).calculate_tax(rate).cents(), -5);
    }

    #[test]
    fn test_zero_tax_rate() {
        let amount = Money::from_cents(12345);
        assert!(amount.calculate_tax(TaxRate::zero()).is_zero());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_cents(1000);
        assert_eq!(price.checked_mul(3), Some(Money::from_cents(3000)));
        assert_eq!(Money::from_cents(i64::MAX / 2).checked_mul(3), None);
        assert_eq!(price.checked_add(price), Some(Money::from_cents(2000)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(price), None);
    }
}
