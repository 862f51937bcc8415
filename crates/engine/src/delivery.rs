//! Fuel delivery dip verification.
//!
//! A tanker delivery is dipped before and after the drop. Fuel keeps being
//! sold from the tank while the tanker unloads, so the received quantity is
//! the level gain plus what the nozzles dispensed meanwhile. It is then
//! compared with the invoiced quantity.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Quantity, ResultEngine};

/// Invoice variance still accepted, in basis points of the invoice (0.5 %).
pub const INVOICE_TOLERANCE_BP: i64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    PendingVerification,
    Verified,
    Discrepancy,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingVerification => "PENDING_VERIFICATION",
            Self::Verified => "VERIFIED",
            Self::Discrepancy => "DISCREPANCY",
        }
    }
}

impl TryFrom<&str> for DeliveryStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING_VERIFICATION" => Ok(Self::PendingVerification),
            "VERIFIED" => Ok(Self::Verified),
            "DISCREPANCY" => Ok(Self::Discrepancy),
            other => Err(EngineError::InvalidState(format!(
                "invalid delivery status: {other}"
            ))),
        }
    }
}

/// Dip readings taken around a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dips {
    pub before: Quantity,
    pub after: Quantity,
    /// Litres dispensed from the tank while it was being filled.
    pub sold_during: Quantity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verification {
    pub received: Quantity,
    /// `received - invoice`: negative means short delivery.
    pub invoice_variance: Quantity,
    pub status: DeliveryStatus,
}

/// Checks the dips against the tank and the invoice.
///
/// ```rust
/// use engine::{Quantity, delivery::{verify, Dips, DeliveryStatus}};
///
/// let dips = Dips {
///     before: Quantity::from_whole(2_000),
///     after: Quantity::from_whole(5_950),
///     sold_during: Quantity::from_whole(40),
/// };
/// let v = verify(dips, Quantity::from_whole(4_000), Quantity::from_whole(20_000)).unwrap();
/// assert_eq!(v.received, Quantity::from_whole(3_990));
/// assert_eq!(v.status, DeliveryStatus::Verified);
/// ```
pub fn verify(dips: Dips, invoice: Quantity, capacity: Quantity) -> ResultEngine<Verification> {
    if dips.before.is_negative() || dips.after.is_negative() || dips.sold_during.is_negative() {
        return Err(EngineError::InvalidReading(
            "dip readings must be >= 0".to_string(),
        ));
    }
    if dips.after > capacity {
        return Err(EngineError::InvalidReading(format!(
            "after dip {} exceeds tank capacity {}",
            dips.after, capacity
        )));
    }

    let received = dips.after - dips.before + dips.sold_during;
    let invoice_variance = received - invoice;
    let status = if within_tolerance(invoice_variance, invoice) {
        DeliveryStatus::Verified
    } else {
        DeliveryStatus::Discrepancy
    };
    Ok(Verification {
        received,
        invoice_variance,
        status,
    })
}

/// An empty invoice has nothing to compare against.
fn within_tolerance(variance: Quantity, invoice: Quantity) -> bool {
    if !invoice.is_positive() {
        return true;
    }
    let variance = i128::from(variance.milli()).abs() * 10_000;
    variance <= i128::from(invoice.milli()) * i128::from(INVOICE_TOLERANCE_BP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(value: i64) -> Quantity {
        Quantity::from_whole(value)
    }

    fn dips(before: i64, after: i64, sold: i64) -> Dips {
        Dips {
            before: l(before),
            after: l(after),
            sold_during: l(sold),
        }
    }

    #[test]
    fn half_a_percent_short_is_still_verified() {
        // 20 L short on 4000 L
        let v = verify(dips(1_000, 4_980, 0), l(4_000), l(20_000)).unwrap();
        assert_eq!(v.invoice_variance, l(-20));
        assert_eq!(v.status, DeliveryStatus::Verified);
    }

    #[test]
    fn beyond_tolerance_is_a_discrepancy() {
        let v = verify(dips(1_000, 4_970, 0), l(4_000), l(20_000)).unwrap();
        assert_eq!(v.received, l(3_970));
        assert_eq!(v.status, DeliveryStatus::Discrepancy);

        // over-delivery is flagged too
        let v = verify(dips(1_000, 5_100, 0), l(4_000), l(20_000)).unwrap();
        assert_eq!(v.status, DeliveryStatus::Discrepancy);
    }

    #[test]
    fn sales_during_the_drop_count_as_received() {
        let v = verify(dips(1_000, 4_900, 100), l(4_000), l(20_000)).unwrap();
        assert_eq!(v.received, l(4_000));
        assert_eq!(v.invoice_variance, Quantity::ZERO);
    }

    #[test]
    fn after_dip_cannot_exceed_capacity() {
        let err = verify(dips(1_000, 20_001, 0), l(4_000), l(20_000)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidReading(_)));
        assert!(verify(dips(1_000, 20_000, 0), l(19_000), l(20_000)).is_ok());
    }

    #[test]
    fn zero_invoice_is_verified() {
        let v = verify(dips(500, 900, 0), Quantity::ZERO, l(20_000)).unwrap();
        assert_eq!(v.status, DeliveryStatus::Verified);
    }

    #[test]
    fn status_round_trips_wire_names() {
        assert_eq!(
            DeliveryStatus::try_from("DISCREPANCY").unwrap(),
            DeliveryStatus::Discrepancy
        );
        assert!(DeliveryStatus::try_from("DONE").is_err());
    }
}
