//! Shift close variance.
//!
//! The meter-calculated sales of a shift are compared with the tender the
//! manager declares. The difference is accepted when it stays within the
//! organization's tolerance: the larger of a share of sales (basis points)
//! and a flat amount.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

pub const DEFAULT_TOLERANCE_BP: i64 = 30;
pub const DEFAULT_TOLERANCE_FLAT: Money = Money::new(200_00);

/// Tender declared at shift close, one bucket per payment method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    #[serde(rename = "cash_minor")]
    pub cash: Money,
    #[serde(rename = "card_minor")]
    pub card: Money,
    #[serde(rename = "credit_minor")]
    pub credit: Money,
    #[serde(rename = "cheque_minor")]
    pub cheque: Money,
}

impl Tender {
    /// Rejects negative buckets and totals that do not fit in `i64`.
    pub fn new(cash: Money, card: Money, credit: Money, cheque: Money) -> ResultEngine<Self> {
        let tender = Self {
            cash,
            card,
            credit,
            cheque,
        };
        if [cash, card, credit, cheque].iter().any(|m| m.is_negative()) {
            return Err(EngineError::InvalidAmount(
                "declared amounts must be >= 0".to_string(),
            ));
        }
        tender.total()?;
        Ok(tender)
    }

    pub fn total(&self) -> ResultEngine<Money> {
        self.cash
            .try_add(self.card)?
            .try_add(self.credit)?
            .try_add(self.cheque)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    pub basis_points: i64,
    #[serde(rename = "flat_minor")]
    pub flat: Money,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            basis_points: DEFAULT_TOLERANCE_BP,
            flat: DEFAULT_TOLERANCE_FLAT,
        }
    }
}

impl Tolerance {
    pub fn new(basis_points: i64, flat: Money) -> ResultEngine<Self> {
        if !(0..=10_000).contains(&basis_points) {
            return Err(EngineError::InvalidAmount(
                "tolerance basis points must be between 0 and 10000".to_string(),
            ));
        }
        if flat.is_negative() {
            return Err(EngineError::InvalidAmount(
                "flat tolerance must be >= 0".to_string(),
            ));
        }
        Ok(Self { basis_points, flat })
    }

    /// Largest absolute variance still considered normal for `sales`.
    #[must_use]
    pub fn allowed(&self, sales: Money) -> Money {
        sales.abs().basis_points(self.basis_points).max(self.flat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceStatus {
    Normal,
    Suspicious,
}

impl VarianceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Suspicious => "SUSPICIOUS",
        }
    }
}

/// Outcome of comparing calculated sales with declared tender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variance {
    #[serde(rename = "calculated_minor")]
    pub calculated: Money,
    #[serde(rename = "declared_minor")]
    pub declared: Money,
    /// `calculated - declared`: positive means cash is missing.
    #[serde(rename = "variance_minor")]
    pub variance: Money,
    #[serde(rename = "tolerance_minor")]
    pub tolerance: Money,
    pub status: VarianceStatus,
}

/// ```rust
/// use engine::{Money, variance::{assess, Tender, Tolerance, VarianceStatus}};
///
/// let tender = Tender { cash: Money::new(34_900_00), ..Tender::default() };
/// let v = assess(Money::new(35_000_00), &tender, Tolerance::default()).unwrap();
/// assert_eq!(v.variance, Money::new(100_00));
/// assert_eq!(v.status, VarianceStatus::Normal);
/// ```
pub fn assess(calculated: Money, tender: &Tender, tolerance: Tolerance) -> ResultEngine<Variance> {
    let declared = tender.total()?;
    let variance = calculated.try_sub(declared)?;
    let allowed = tolerance.allowed(calculated);
    let status = if variance.abs() <= allowed {
        VarianceStatus::Normal
    } else {
        VarianceStatus::Suspicious
    };
    Ok(Variance {
        calculated,
        declared,
        variance,
        tolerance: allowed,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_tolerance_wins_on_small_sales() {
        // 0.3 % of Rs 10,000 is Rs 30, below the Rs 200 floor
        let allowed = Tolerance::default().allowed(Money::new(10_000_00));
        assert_eq!(allowed, Money::new(200_00));
    }

    #[test]
    fn share_of_sales_wins_on_large_sales() {
        // 0.3 % of Rs 1,000,000 is Rs 3,000
        let allowed = Tolerance::default().allowed(Money::new(1_000_000_00));
        assert_eq!(allowed, Money::new(3_000_00));
    }

    #[test]
    fn boundary_is_normal() {
        let tender = Tender {
            cash: Money::new(34_800_00),
            ..Tender::default()
        };
        let v = assess(Money::new(35_000_00), &tender, Tolerance::default()).unwrap();
        assert_eq!(v.variance, Money::new(200_00));
        assert_eq!(v.status, VarianceStatus::Normal);
    }

    #[test]
    fn overage_beyond_tolerance_is_suspicious() {
        let tender = Tender {
            cash: Money::new(30_000_00),
            card: Money::new(5_500_00),
            ..Tender::default()
        };
        let v = assess(Money::new(35_000_00), &tender, Tolerance::default()).unwrap();
        assert_eq!(v.declared, Money::new(35_500_00));
        assert_eq!(v.variance, Money::new(-500_00));
        assert_eq!(v.status, VarianceStatus::Suspicious);
    }

    #[test]
    fn negative_tender_is_rejected() {
        assert!(Tender::new(Money::new(-1), Money::ZERO, Money::ZERO, Money::ZERO).is_err());
        assert!(Tolerance::new(10_001, Money::ZERO).is_err());
    }

    #[test]
    fn tender_total_must_fit() {
        let err = Tender::new(Money::new(i64::MAX), Money::new(1), Money::ZERO, Money::ZERO);
        assert!(matches!(err, Err(EngineError::InvalidAmount(_))));

        // built directly, bypassing `new`
        let tender = Tender {
            cash: Money::new(i64::MAX),
            cheque: Money::new(1),
            ..Tender::default()
        };
        assert!(assess(Money::new(100), &tender, Tolerance::default()).is_err());
    }
}
