use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Quantity,
    util::{format_fixed, parse_fixed},
};

/// Signed money amount represented as **integer minor units** (cents).
///
/// Use this type for **all** monetary values in the engine (prices, tender,
/// balances) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "Rs 12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("470".parse::<Money>().unwrap().minor(), 47000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Addition of caller-supplied amounts, failing with `InvalidAmount`
    /// instead of wrapping.
    ///
    /// ```rust
    /// use engine::Money;
    ///
    /// assert_eq!(Money::new(1).try_add(Money::new(2)).unwrap(), Money::new(3));
    /// assert!(Money::new(i64::MAX).try_add(Money::new(1)).is_err());
    /// ```
    pub fn try_add(self, rhs: Money) -> Result<Money, EngineError> {
        self.checked_add(rhs).ok_or_else(|| out_of_range(self, '+', rhs))
    }

    /// Subtraction counterpart of [`Money::try_add`].
    pub fn try_sub(self, rhs: Money) -> Result<Money, EngineError> {
        self.checked_sub(rhs).ok_or_else(|| out_of_range(self, '-', rhs))
    }

    /// Unit price times quantity, rounded half away from zero to minor units.
    ///
    /// ```rust
    /// use engine::{Money, Quantity};
    ///
    /// let price = Money::new(350_00);
    /// let litres = Quantity::from_whole(100);
    /// assert_eq!(price.times(litres), Money::new(35_000_00));
    /// ```
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Money {
        let raw = i128::from(self.0) * i128::from(quantity.milli());
        let scale = i128::from(Quantity::SCALE);
        let half = scale / 2;
        let rounded = if raw >= 0 {
            (raw + half) / scale
        } else {
            (raw - half) / scale
        };
        Money(rounded as i64)
    }

    /// Share of this amount expressed in basis points (1/100 of a percent),
    /// rounded half away from zero.
    #[must_use]
    pub fn basis_points(self, bp: i64) -> Money {
        let raw = i128::from(self.0) * i128::from(bp);
        let rounded = if raw >= 0 {
            (raw + 5_000) / 10_000
        } else {
            (raw - 5_000) / 10_000
        };
        Money(rounded as i64)
    }
}

fn out_of_range(lhs: Money, op: char, rhs: Money) -> EngineError {
    EngineError::InvalidAmount(format!("amount out of range: {} {op} {}", lhs.0, rhs.0))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rs {}", format_fixed(self.0, 2))
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units (max 2 fractional digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2).map(Money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_rupees() {
        assert_eq!(Money::new(0).to_string(), "Rs 0.00");
        assert_eq!(Money::new(1).to_string(), "Rs 0.01");
        assert_eq!(Money::new(1050).to_string(), "Rs 10.50");
        assert_eq!(Money::new(-1050).to_string(), "Rs -10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn times_rounds_half_away_from_zero() {
        // 1.005 L at Rs 1.00 = 100.5 minor -> 101
        assert_eq!(Money::new(100).times(Quantity::from_milli(1_005)), Money::new(101));
        assert_eq!(Money::new(-100).times(Quantity::from_milli(1_005)), Money::new(-101));
        assert_eq!(Money::new(470_00).times(Quantity::ZERO), Money::ZERO);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(
            Money::new(i64::MAX).try_add(Money::new(1)),
            Err(EngineError::InvalidAmount(format!(
                "amount out of range: {} + 1",
                i64::MAX
            )))
        );
        assert!(Money::new(i64::MIN).try_sub(Money::new(1)).is_err());
        assert_eq!(Money::new(5).try_sub(Money::new(7)).unwrap(), Money::new(-2));
    }

    #[test]
    fn basis_points_of_sales() {
        // 0.3 % of Rs 35,000.00 is Rs 105.00
        assert_eq!(Money::new(35_000_00).basis_points(30), Money::new(105_00));
    }
}
