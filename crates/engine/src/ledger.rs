//! Safe ledger arithmetic.
//!
//! A safe balance is the fold of its transactions, oldest first:
//! `OPENING_BALANCE` resets the running balance to its amount, income kinds
//! add, every other kind subtracts.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafeTransactionKind {
    OpeningBalance,
    CashFuelSales,
    PosCardPayment,
    CreditPayment,
    ChequeReceived,
    LoanRepaid,
    Expense,
    LoanGiven,
    BankDeposit,
    SalaryPayment,
    CashOut,
}

/// How a kind moves the running balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Reset,
    Income,
    Outflow,
}

impl SafeTransactionKind {
    pub const ALL: [SafeTransactionKind; 11] = [
        Self::OpeningBalance,
        Self::CashFuelSales,
        Self::PosCardPayment,
        Self::CreditPayment,
        Self::ChequeReceived,
        Self::LoanRepaid,
        Self::Expense,
        Self::LoanGiven,
        Self::BankDeposit,
        Self::SalaryPayment,
        Self::CashOut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpeningBalance => "OPENING_BALANCE",
            Self::CashFuelSales => "CASH_FUEL_SALES",
            Self::PosCardPayment => "POS_CARD_PAYMENT",
            Self::CreditPayment => "CREDIT_PAYMENT",
            Self::ChequeReceived => "CHEQUE_RECEIVED",
            Self::LoanRepaid => "LOAN_REPAID",
            Self::Expense => "EXPENSE",
            Self::LoanGiven => "LOAN_GIVEN",
            Self::BankDeposit => "BANK_DEPOSIT",
            Self::SalaryPayment => "SALARY_PAYMENT",
            Self::CashOut => "CASH_OUT",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::OpeningBalance => Direction::Reset,
            Self::CashFuelSales
            | Self::PosCardPayment
            | Self::CreditPayment
            | Self::ChequeReceived
            | Self::LoanRepaid => Direction::Income,
            Self::Expense
            | Self::LoanGiven
            | Self::BankDeposit
            | Self::SalaryPayment
            | Self::CashOut => Direction::Outflow,
        }
    }

    /// Balance after applying one row of this kind.
    pub fn apply(self, balance: Money, amount: Money) -> ResultEngine<Money> {
        match self.direction() {
            Direction::Reset => Ok(amount),
            Direction::Income => balance.try_add(amount),
            Direction::Outflow => balance.try_sub(amount),
        }
    }
}

impl TryFrom<&str> for SafeTransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                EngineError::InvalidAmount(format!("invalid safe transaction kind: {value}"))
            })
    }
}

/// Validates a row amount: strictly positive, except opening balances which
/// may be zero.
pub fn validate_amount(kind: SafeTransactionKind, amount: Money) -> ResultEngine<()> {
    let ok = match kind {
        SafeTransactionKind::OpeningBalance => !amount.is_negative(),
        _ => amount.is_positive(),
    };
    if !ok {
        return Err(EngineError::InvalidAmount(format!(
            "{} amount must be > 0",
            kind.as_str()
        )));
    }
    Ok(())
}

/// Balance pair stored on every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub balance_before: Money,
    pub balance_after: Money,
}

/// Result of folding a ledger from the safe's opening balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    pub snapshots: Vec<Snapshot>,
    pub balance: Money,
    pub last_opening_balance: Money,
    /// Income since the last reset.
    pub total_income: Money,
    /// Outflows since the last reset.
    pub total_outflow: Money,
    pub income_count: usize,
    pub outflow_count: usize,
}

impl Replay {
    /// Human readable check of the fold, e.g. `Rs 100.00 + Rs 50.00 - Rs 20.00 = Rs 130.00`.
    #[must_use]
    pub fn formula(&self) -> String {
        format!(
            "{} + {} - {} = {}",
            self.last_opening_balance, self.total_income, self.total_outflow, self.balance
        )
    }
}

/// Folds `(kind, amount)` rows, which must already be in chronological order.
///
/// ```rust
/// use engine::{Money, ledger::{replay, SafeTransactionKind as K}};
///
/// let rows = [
///     (K::CashFuelSales, Money::new(500)),
///     (K::OpeningBalance, Money::new(1_000)),
///     (K::Expense, Money::new(300)),
/// ];
/// let r = replay(Money::new(100), rows).unwrap();
/// assert_eq!(r.balance, Money::new(700));
/// assert_eq!(r.snapshots[1].balance_before, Money::new(600));
/// ```
pub fn replay<I>(opening: Money, rows: I) -> ResultEngine<Replay>
where
    I: IntoIterator<Item = (SafeTransactionKind, Money)>,
{
    let mut result = Replay {
        snapshots: Vec::new(),
        balance: opening,
        last_opening_balance: opening,
        total_income: Money::ZERO,
        total_outflow: Money::ZERO,
        income_count: 0,
        outflow_count: 0,
    };

    for (kind, amount) in rows {
        let before = result.balance;
        let after = kind.apply(before, amount)?;
        match kind.direction() {
            Direction::Reset => {
                result.last_opening_balance = amount;
                result.total_income = Money::ZERO;
                result.total_outflow = Money::ZERO;
                result.income_count = 0;
                result.outflow_count = 0;
            }
            Direction::Income => {
                result.total_income = result.total_income.try_add(amount)?;
                result.income_count += 1;
            }
            Direction::Outflow => {
                result.total_outflow = result.total_outflow.try_add(amount)?;
                result.outflow_count += 1;
            }
        }
        result.snapshots.push(Snapshot {
            balance_before: before,
            balance_after: after,
        });
        result.balance = after;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use SafeTransactionKind as K;

    #[test]
    fn income_adds_and_outflow_subtracts() {
        let r = replay(
            Money::new(1_000),
            [
                (K::CashFuelSales, Money::new(500)),
                (K::ChequeReceived, Money::new(100)),
                (K::BankDeposit, Money::new(1_200)),
                (K::SalaryPayment, Money::new(100)),
            ],
        )
        .unwrap();
        assert_eq!(r.balance, Money::new(300));
        assert_eq!(r.total_income, Money::new(600));
        assert_eq!(r.total_outflow, Money::new(1_300));
        assert_eq!(r.formula(), "Rs 10.00 + Rs 6.00 - Rs 13.00 = Rs 3.00");
    }

    #[test]
    fn opening_balance_resets_running_totals() {
        let r = replay(
            Money::ZERO,
            [
                (K::CashFuelSales, Money::new(900)),
                (K::OpeningBalance, Money::new(250)),
                (K::LoanRepaid, Money::new(50)),
            ],
        )
        .unwrap();
        assert_eq!(r.snapshots[1].balance_before, Money::new(900));
        assert_eq!(r.snapshots[1].balance_after, Money::new(250));
        assert_eq!(r.last_opening_balance, Money::new(250));
        assert_eq!(r.total_income, Money::new(50));
        assert_eq!(r.balance, Money::new(300));
    }

    #[test]
    fn snapshots_chain() {
        let r = replay(
            Money::new(10),
            [
                (K::CashOut, Money::new(30)),
                (K::PosCardPayment, Money::new(5)),
            ],
        )
        .unwrap();
        assert_eq!(r.snapshots[0].balance_after, Money::new(-20));
        assert_eq!(r.snapshots[1].balance_before, r.snapshots[0].balance_after);
    }

    #[test]
    fn balance_overflow_is_an_error() {
        assert!(K::CashFuelSales.apply(Money::new(i64::MAX), Money::new(1)).is_err());
        assert!(K::Expense.apply(Money::new(i64::MIN + 1), Money::new(2)).is_err());
        assert_eq!(
            K::OpeningBalance.apply(Money::new(i64::MAX), Money::new(7)).unwrap(),
            Money::new(7)
        );

        let result = replay(
            Money::new(i64::MAX - 10),
            [
                (K::LoanRepaid, Money::new(5)),
                (K::ChequeReceived, Money::new(6)),
            ],
        );
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn kinds_parse_from_wire_names() {
        for kind in K::ALL {
            assert_eq!(K::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(K::try_from("DEPOSIT").is_err());
    }

    #[test]
    fn amount_rules() {
        assert!(validate_amount(K::OpeningBalance, Money::ZERO).is_ok());
        assert!(validate_amount(K::Expense, Money::ZERO).is_err());
        assert!(validate_amount(K::CashFuelSales, Money::new(-1)).is_err());
    }
}
