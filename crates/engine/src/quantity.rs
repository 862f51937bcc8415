use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    EngineError,
    util::{format_fixed, parse_fixed},
};

/// Signed quantity represented as **integer thousandths** of a unit.
///
/// Meter readings, tank levels and test pours are litres; shop stock is
/// product units. Both share this type.
///
/// ```rust
/// use engine::Quantity;
///
/// let litres: Quantity = "12.5".parse().unwrap();
/// assert_eq!(litres.milli(), 12_500);
/// assert_eq!(litres.to_string(), "12.500");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);
    /// Thousandths per whole unit.
    pub const SCALE: i64 = 1_000;

    #[must_use]
    pub const fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    #[must_use]
    pub const fn from_whole(units: i64) -> Self {
        Self(units * Self::SCALE)
    }

    #[must_use]
    pub const fn milli(self) -> i64 {
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
    pub fn min(self, other: Quantity) -> Quantity {
        Quantity(self.0.min(other.0))
    }

    /// Clamps negative values to zero.
    #[must_use]
    pub fn floor_zero(self) -> Quantity {
        Quantity(self.0.max(0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_fixed(self.0, 3))
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Self::Output {
        Quantity(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Self::Output {
        Quantity(self.0 - rhs.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Quantity) {
        self.0 -= rhs.0;
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, Add::add)
    }
}

impl FromStr for Quantity {
    type Err = EngineError;

    /// Parses a decimal string (max 3 fractional digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 3).map(Quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("1000".parse::<Quantity>().unwrap(), Quantity::from_whole(1000));
        assert_eq!("0,25".parse::<Quantity>().unwrap().milli(), 250);
        assert_eq!(Quantity::from_milli(-1_500).to_string(), "-1.500");
        assert!("1.2345".parse::<Quantity>().is_err());
    }

    #[test]
    fn floor_zero_clamps_negatives() {
        assert_eq!(Quantity::from_milli(-5).floor_zero(), Quantity::ZERO);
        assert_eq!(Quantity::from_milli(5).floor_zero(), Quantity::from_milli(5));
    }
}
