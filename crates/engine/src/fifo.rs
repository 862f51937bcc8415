//! FIFO consumption of purchase batches.
//!
//! Shop stock is tracked per purchase batch. Sold or wasted quantity is drawn
//! from the oldest batch first; whatever the batches cannot cover is reported
//! as an untracked remainder.

use crate::{EngineError, Money, Quantity, ResultEngine};

/// Remaining stock of one purchase batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchStock<Id> {
    pub batch_id: Id,
    pub remaining: Quantity,
    pub cost_price: Money,
}

/// Quantity taken from a single batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draw<Id> {
    pub batch_id: Id,
    pub quantity: Quantity,
    pub cost_price: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FifoPlan<Id> {
    pub draws: Vec<Draw<Id>>,
    /// Quantity no batch could cover.
    pub untracked: Quantity,
}

impl<Id> FifoPlan<Id> {
    /// Cost of goods covered by batches.
    #[must_use]
    pub fn cost(&self) -> Money {
        self.draws.iter().map(|d| d.cost_price.times(d.quantity)).sum()
    }
}

/// Plans how `wanted` is drawn from `batches`, which must be ordered oldest
/// purchase first. Batches without remaining stock are skipped.
///
/// ```rust
/// use engine::{Money, Quantity, fifo::{plan, BatchStock}};
///
/// let batches = [
///     BatchStock { batch_id: 1, remaining: Quantity::from_whole(10), cost_price: Money::new(100) },
///     BatchStock { batch_id: 2, remaining: Quantity::from_whole(10), cost_price: Money::new(120) },
/// ];
/// let p = plan(&batches, Quantity::from_whole(15)).unwrap();
/// assert_eq!(p.draws.len(), 2);
/// assert_eq!(p.draws[1].quantity, Quantity::from_whole(5));
/// assert!(p.untracked.is_zero());
/// ```
pub fn plan<Id: Clone>(batches: &[BatchStock<Id>], wanted: Quantity) -> ResultEngine<FifoPlan<Id>> {
    if wanted.is_negative() {
        return Err(EngineError::InvalidAmount(
            "quantity to draw must be >= 0".to_string(),
        ));
    }

    let mut left = wanted;
    let mut draws = Vec::new();
    for batch in batches {
        if left.is_zero() {
            break;
        }
        if !batch.remaining.is_positive() {
            continue;
        }
        let take = batch.remaining.min(left);
        draws.push(Draw {
            batch_id: batch.batch_id.clone(),
            quantity: take,
            cost_price: batch.cost_price,
        });
        left -= take;
    }

    Ok(FifoPlan {
        draws,
        untracked: left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batches() -> Vec<BatchStock<&'static str>> {
        vec![
            BatchStock {
                batch_id: "old",
                remaining: Quantity::from_whole(10),
                cost_price: Money::new(100),
            },
            BatchStock {
                batch_id: "empty",
                remaining: Quantity::ZERO,
                cost_price: Money::new(90),
            },
            BatchStock {
                batch_id: "new",
                remaining: Quantity::from_whole(10),
                cost_price: Money::new(120),
            },
        ]
    }

    #[test]
    fn draws_oldest_first() {
        let p = plan(&batches(), Quantity::from_whole(15)).unwrap();
        assert_eq!(
            p.draws,
            vec![
                Draw {
                    batch_id: "old",
                    quantity: Quantity::from_whole(10),
                    cost_price: Money::new(100),
                },
                Draw {
                    batch_id: "new",
                    quantity: Quantity::from_whole(5),
                    cost_price: Money::new(120),
                },
            ]
        );
        assert_eq!(p.cost(), Money::new(1_600));
    }

    #[test]
    fn shortfall_is_untracked() {
        let p = plan(&batches(), Quantity::from_whole(25)).unwrap();
        assert_eq!(p.draws.len(), 2);
        assert_eq!(p.untracked, Quantity::from_whole(5));
    }

    #[test]
    fn nothing_to_draw() {
        let p = plan(&batches(), Quantity::ZERO).unwrap();
        assert!(p.draws.is_empty());
        assert!(plan(&batches(), Quantity::from_milli(-1)).is_err());
    }
}
