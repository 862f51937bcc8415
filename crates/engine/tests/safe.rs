mod common;

use common::{at, fixture};
use engine::{
    AssignPumperCmd, CloseShiftCmd, EngineError, Money, SafeTransactionCmd,
    SafeTransactionFilter, SafeTransactionKind, Tender,
};
use sea_orm::{ConnectionTrait, Statement};

fn cmd(fx: &common::Fixture, kind: SafeTransactionKind, minor: i64, hour: u32) -> SafeTransactionCmd {
    SafeTransactionCmd::new(fx.station_id, kind, Money::new(minor), at(hour))
}

#[tokio::test]
async fn appends_chain_onto_running_balance() {
    let fx = fixture().await;
    let opening = fx
        .engine
        .set_opening_balance(&fx.owner, fx.station_id, Money::new(10_000_00), at(6))
        .await
        .unwrap();
    assert_eq!(opening.balance_before_minor, Money::new(10_000_00));
    assert_eq!(opening.balance_after_minor, Money::new(10_000_00));

    let sales = fx
        .engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::CashFuelSales, 5_000_00, 10),
        )
        .await
        .unwrap();
    assert_eq!(sales.balance_before_minor, Money::new(10_000_00));
    assert_eq!(sales.balance_after_minor, Money::new(15_000_00));

    let deposit = fx
        .engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::BankDeposit, 12_000_00, 12).reference("BOC-991"),
        )
        .await
        .unwrap();
    assert_eq!(deposit.balance_after_minor, Money::new(3_000_00));
    assert_eq!(deposit.reference.as_deref(), Some("BOC-991"));

    let safe = fx.engine.safe(&fx.owner, fx.station_id).await.unwrap();
    assert_eq!(safe.current_balance_minor, Money::new(3_000_00));
    assert_eq!(safe.recent_transactions.len(), 3);
    assert_eq!(
        safe.recent_transactions[0].kind,
        SafeTransactionKind::BankDeposit
    );
}

#[tokio::test]
async fn back_dated_row_resnapshots_later_rows() {
    let fx = fixture().await;
    fx.engine
        .set_opening_balance(&fx.owner, fx.station_id, Money::new(1_000_00), at(6))
        .await
        .unwrap();
    fx.engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::CashFuelSales, 500_00, 12),
        )
        .await
        .unwrap();

    let expense = fx
        .engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::Expense, 200_00, 9).description("generator diesel"),
        )
        .await
        .unwrap();
    assert_eq!(expense.balance_before_minor, Money::new(1_000_00));
    assert_eq!(expense.balance_after_minor, Money::new(800_00));

    let rows = fx
        .engine
        .safe_transactions(&fx.owner, fx.station_id, SafeTransactionFilter::default())
        .await
        .unwrap();
    let kinds: Vec<_> = rows.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SafeTransactionKind::CashFuelSales,
            SafeTransactionKind::Expense,
            SafeTransactionKind::OpeningBalance,
        ]
    );
    assert_eq!(rows[0].balance_before_minor, Money::new(800_00));
    assert_eq!(rows[0].balance_after_minor, Money::new(1_300_00));

    let safe = fx.engine.safe(&fx.owner, fx.station_id).await.unwrap();
    assert_eq!(safe.current_balance_minor, Money::new(1_300_00));
    let report = fx
        .engine
        .reconcile_safe(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert!(report.is_balanced);
}

#[tokio::test]
async fn transactions_filter_by_kind_and_window() {
    let fx = fixture().await;
    for (kind, minor, hour) in [
        (SafeTransactionKind::CashFuelSales, 100_00, 8),
        (SafeTransactionKind::Expense, 20_00, 9),
        (SafeTransactionKind::CashFuelSales, 300_00, 15),
    ] {
        fx.engine
            .record_safe_transaction(&fx.owner, cmd(&fx, kind, minor, hour))
            .await
            .unwrap();
    }

    let filter = SafeTransactionFilter {
        kind: Some(SafeTransactionKind::CashFuelSales),
        to: Some(at(12)),
        ..SafeTransactionFilter::default()
    };
    let rows = fx
        .engine
        .safe_transactions(&fx.owner, fx.station_id, filter)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount_minor, Money::new(100_00));
}

#[tokio::test]
async fn reconcile_reports_formula_and_recompute_repairs_drift() {
    let fx = fixture().await;
    fx.engine
        .set_opening_balance(&fx.owner, fx.station_id, Money::new(2_000_00), at(6))
        .await
        .unwrap();
    fx.engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::PosCardPayment, 700_00, 8),
        )
        .await
        .unwrap();
    fx.engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::SalaryPayment, 400_00, 9),
        )
        .await
        .unwrap();

    let report = fx
        .engine
        .reconcile_safe(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert!(report.is_balanced);
    assert_eq!(report.calculated_balance, Money::new(2_300_00));
    assert_eq!(report.last_opening_balance, Money::new(2_000_00));
    assert_eq!(report.total_income, Money::new(700_00));
    assert_eq!(report.total_outflow, Money::new(400_00));
    assert_eq!(report.transaction_count, 3);
    assert_eq!(report.formula, "Rs 2000.00 + Rs 700.00 - Rs 400.00 = Rs 2300.00");

    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_string(
            backend,
            "UPDATE safes SET current_balance_minor = 99".to_string(),
        ))
        .await
        .unwrap();
    let drifted = fx
        .engine
        .reconcile_safe(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert!(!drifted.is_balanced);
    assert_eq!(drifted.discrepancy, Money::new(2_300_00 - 99));

    let outcome = fx
        .engine
        .recompute_safe(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert_eq!(outcome.previous_balance, Money::new(99));
    assert_eq!(outcome.balance, Money::new(2_300_00));
    assert_eq!(outcome.rows_repaired, 0);
    let safe = fx.engine.safe(&fx.owner, fx.station_id).await.unwrap();
    assert_eq!(safe.current_balance_minor, Money::new(2_300_00));
}

#[tokio::test]
async fn reconcile_without_safe_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .reconcile_safe(&fx.owner, fx.station_id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("safe not exists".to_string()));
}

#[tokio::test]
async fn amounts_and_roles_are_validated() {
    let fx = fixture().await;
    let err = fx
        .engine
        .record_safe_transaction(&fx.owner, cmd(&fx, SafeTransactionKind::Expense, 0, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .record_safe_transaction(&fx.viewer, cmd(&fx, SafeTransactionKind::Expense, 10, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // a zero float is a valid opening balance
    fx.engine
        .set_opening_balance(&fx.owner, fx.station_id, Money::ZERO, at(6))
        .await
        .unwrap();
}

#[tokio::test]
async fn pending_deposits_track_declared_cash() {
    let fx = fixture().await;
    fx.set_price(100_00).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id)
                .start_meter(common::litres(0)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, shift.id, assignment.id, common::litres(100))
        .await
        .unwrap();
    let tender = Tender {
        cash: Money::new(8_000_00),
        card: Money::new(2_000_00),
        ..Tender::default()
    };
    fx.engine
        .close_shift(&fx.owner, CloseShiftCmd::new(shift.id, tender, at(14)))
        .await
        .unwrap();

    fx.engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::CashFuelSales, 5_000_00, 15).shift_id(shift.id),
        )
        .await
        .unwrap();

    let pending = fx
        .engine
        .pending_deposits(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].shift_id, shift.id);
    assert_eq!(pending[0].declared_cash, Money::new(8_000_00));
    assert_eq!(pending[0].deposited, Money::new(5_000_00));
    assert_eq!(pending[0].pending, Money::new(3_000_00));

    fx.engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::CashFuelSales, 3_000_00, 16).shift_id(shift.id),
        )
        .await
        .unwrap();
    let pending = fx
        .engine
        .pending_deposits(&fx.owner, fx.station_id)
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn balance_overflow_is_rejected_and_rolled_back() {
    let fx = fixture().await;
    fx.engine
        .set_opening_balance(&fx.owner, fx.station_id, Money::new(i64::MAX - 10), at(6))
        .await
        .unwrap();

    let err = fx
        .engine
        .record_safe_transaction(
            &fx.owner,
            cmd(&fx, SafeTransactionKind::CashFuelSales, 11, 10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // back-dated rows are replayed, the replay hits the same limit
    fx.engine
        .record_safe_transaction(&fx.owner, cmd(&fx, SafeTransactionKind::LoanRepaid, 10, 10))
        .await
        .unwrap();
    let err = fx
        .engine
        .record_safe_transaction(&fx.owner, cmd(&fx, SafeTransactionKind::ChequeReceived, 1, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let safe = fx.engine.safe(&fx.owner, fx.station_id).await.unwrap();
    assert_eq!(safe.current_balance_minor, Money::new(i64::MAX));
    assert_eq!(safe.recent_transactions.len(), 2);
}
