//! Pump meter arithmetic.
//!
//! Mechanical totalizers count up to [`METER_MAX`] litres and then wrap back
//! to zero. A closing reading lower than the opening one is only accepted when
//! it looks like such a wrap: the opening reading sits near the top of the
//! dial and the closing one near the bottom.

use crate::{EngineError, Quantity, ResultEngine};

/// Highest value the meter can show before wrapping.
pub const METER_MAX: Quantity = Quantity::from_whole(99_999);
/// Opening readings above this value may wrap.
pub const ROLLOVER_START_ABOVE: Quantity = Quantity::from_whole(90_000);
/// Closing readings below this value may be a wrap.
pub const ROLLOVER_END_BELOW: Quantity = Quantity::from_whole(10_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeterDelta {
    /// `end >= start`
    Forward(Quantity),
    /// The dial wrapped past [`METER_MAX`].
    Rollover(Quantity),
}

impl MeterDelta {
    #[must_use]
    pub fn litres(self) -> Quantity {
        match self {
            Self::Forward(q) | Self::Rollover(q) => q,
        }
    }
}

/// Returns `true` when a backwards reading pair is a meter wrap.
#[must_use]
pub fn is_rollover(start: Quantity, end: Quantity) -> bool {
    end < start && start > ROLLOVER_START_ABOVE && end < ROLLOVER_END_BELOW
}

/// Litres dispensed between two readings.
///
/// ```rust
/// use engine::{Quantity, meter::{meter_delta, MeterDelta}};
///
/// let d = meter_delta(Quantity::from_whole(1000), Quantity::from_whole(1100)).unwrap();
/// assert_eq!(d, MeterDelta::Forward(Quantity::from_whole(100)));
///
/// let d = meter_delta(Quantity::from_whole(99_950), Quantity::from_whole(50)).unwrap();
/// assert_eq!(d.litres(), Quantity::from_whole(99));
/// ```
pub fn meter_delta(start: Quantity, end: Quantity) -> ResultEngine<MeterDelta> {
    if start.is_negative() || end.is_negative() {
        return Err(EngineError::InvalidReading(
            "meter readings must be >= 0".to_string(),
        ));
    }
    if end >= start {
        return Ok(MeterDelta::Forward(end - start));
    }
    if is_rollover(start, end) {
        return Ok(MeterDelta::Rollover((METER_MAX - start) + end));
    }
    Err(EngineError::InvalidReading(format!(
        "end reading {end} is below start reading {start}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(v: i64) -> Quantity {
        Quantity::from_whole(v)
    }

    #[test]
    fn forward_delta() {
        assert_eq!(meter_delta(l(1000), l(1100)).unwrap().litres(), l(100));
        assert_eq!(meter_delta(l(1000), l(1000)).unwrap().litres(), Quantity::ZERO);
    }

    #[test]
    fn rollover_is_measured_against_meter_max() {
        let delta = meter_delta(l(99_900), l(100)).unwrap();
        assert_eq!(delta, MeterDelta::Rollover(l(199)));
    }

    #[test]
    fn backwards_reading_outside_rollover_window_is_rejected() {
        assert!(matches!(
            meter_delta(l(5000), l(4000)),
            Err(EngineError::InvalidReading(_))
        ));
        // start too low for a wrap
        assert!(meter_delta(l(90_000), l(5)).is_err());
        // end too high for a wrap
        assert!(meter_delta(l(95_000), l(10_000)).is_err());
    }

    #[test]
    fn negative_readings_are_rejected() {
        assert!(meter_delta(Quantity::from_milli(-1), l(1)).is_err());
    }
}
