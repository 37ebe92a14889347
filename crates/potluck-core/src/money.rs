//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Summing a year of group expenses in floats drifts by cents, and the   │
//! │  balances stop summing to zero.                                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    10.00 / 3 = 333 + 333 + 333 with 1 unit LEFT OVER                   │
//! │    The left-over unit is returned to the caller and placed explicitly  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use potluck_core::money::Money;
//!
//! let amount = Money::from_cents(50000); // 500.00
//! let (each, leftover) = amount.split_evenly(3);
//! assert_eq!(each.cents(), 16666);
//! assert_eq!(leftover, 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percentage;

/// Number of minor units in one major unit (2 decimal digits).
pub const MINOR_UNITS: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: net balances are negative for members who owe
/// - **Single field tuple struct**: serializes as a bare integer on the wire
/// - **No float constructor**: amounts only enter as integer minor units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use potluck_core::money::Money;
    ///
    /// let share = Money::from_cents(12500); // 125.00
    /// assert_eq!(share.cents(), 12500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole major units.
    ///
    /// ## Example
    /// ```rust
    /// use potluck_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(300).cents(), 30000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_UNITS)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Addition that returns `None` instead of overflowing.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums `amounts`, or `None` if the total does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use potluck_core::money::Money;
    ///
    /// let parts = [Money::from_cents(5), Money::from_cents(7)];
    /// assert_eq!(Money::checked_sum(parts), Some(Money::from_cents(12)));
    /// assert_eq!(Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]), None);
    /// ```
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }

    /// Splits the amount into `count` equal parts.
    ///
    /// Returns the per-part amount and the number of minor units left over
    /// (always `0 <= leftover < count` for non-negative amounts). The caller
    /// decides who receives the leftover units; nothing is silently dropped.
    ///
    /// ## Example
    /// ```rust
    /// use potluck_core::money::Money;
    ///
    /// let (each, leftover) = Money::from_cents(1000).split_evenly(3);
    /// assert_eq!(each.cents(), 333);
    /// assert_eq!(leftover, 1);
    /// ```
    ///
    /// ## Panics
    /// Panics if `count` is zero.
    pub fn split_evenly(&self, count: usize) -> (Money, i64) {
        assert!(count > 0, "cannot split money into zero parts");
        let count = count as i64;
        (Money(self.0.div_euclid(count)), self.0.rem_euclid(count))
    }

    /// Calculates a percentage of this amount using Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKERS ROUNDING (Round Half to Even)                              │
    /// │                                                                     │
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use potluck_core::money::Money;
    /// use potluck_core::types::Percentage;
    ///
    /// let amount = Money::from_cents(30000);
    /// assert_eq!(amount.percentage_of(Percentage::from_whole(30)).cents(), 9000);
    ///
    /// // 0.25 at 50% = 0.125 → 0.12 (2 is even)
    /// let odd = Money::from_cents(25);
    /// assert_eq!(odd.percentage_of(Percentage::from_bps(5000)).cents(), 12);
    /// ```
    pub fn percentage_of(&self, pct: Percentage) -> Money {
        Money::from_basis_points(self.0, pct.bps() as i64)
    }

    /// `cents * bps / 10000`, rounded half to even.
    pub(crate) fn from_basis_points(cents: i64, bps: i64) -> Money {
        // i128 so large amounts times 10000 cannot overflow
        let scaled = round_half_even(cents as i128 * bps as i128, 10_000);
        Money(scaled as i64)
    }
}

/// Integer division rounded half to even. `den` must be positive.
fn round_half_even(num: i128, den: i128) -> i128 {
    let quotient = num.div_euclid(den);
    let twice_remainder = num.rem_euclid(den) * 2;

    if twice_remainder > den || (twice_remainder == den && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain fixed-point rendering, e.g. `-12.34`. No currency symbol: the
/// ledger is single-currency and the symbol is a presentation concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = MINOR_UNITS as u64;
        write!(f, "{}{}.{:02}", sign, abs / units, abs % units)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
