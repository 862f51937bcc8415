mod common;

use common::{at, fixture, litres};
use engine::{
    CreditPaymentCmd, CreditSaleCmd, EngineError, Money, NewCustomerCmd, PaymentMethod,
    SafeTransactionKind,
};

#[tokio::test]
async fn sales_respect_credit_limit() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(
            &fx.owner,
            NewCustomerCmd::new("Silva Transport")
                .phone("077 123 4567")
                .credit_limit(Money::new(50_000_00)),
        )
        .await
        .unwrap();

    let sale = fx
        .engine
        .record_credit_sale(
            &fx.owner,
            CreditSaleCmd::new(customer, Money::new(40_000_00), at(9))
                .station_id(fx.station_id)
                .fuel(fx.fuel_id, litres(100)),
        )
        .await
        .unwrap();
    assert_eq!(sale.amount_minor, Money::new(40_000_00));
    assert_eq!(sale.recorded_by, "alice");

    let err = fx
        .engine
        .record_credit_sale(
            &fx.owner,
            CreditSaleCmd::new(customer, Money::new(10_000_01), at(10)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CreditLimitExceeded(_)));

    // exactly at the limit is fine
    fx.engine
        .record_credit_sale(
            &fx.owner,
            CreditSaleCmd::new(customer, Money::new(10_000_00), at(11)),
        )
        .await
        .unwrap();
    let account = fx
        .engine
        .credit_customer(&fx.owner, customer)
        .await
        .unwrap();
    assert_eq!(account.balance_minor, Money::new(50_000_00));
    assert_eq!(account.recent_sales.len(), 2);
}

#[tokio::test]
async fn zero_limit_is_unlimited() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Perera Hardware"))
        .await
        .unwrap();
    fx.engine
        .record_credit_sale(
            &fx.owner,
            CreditSaleCmd::new(customer, Money::new(9_999_999_00), at(9)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn cash_payment_lands_in_the_safe() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Silva Transport"))
        .await
        .unwrap();
    fx.engine
        .record_credit_sale(
            &fx.owner,
            CreditSaleCmd::new(customer, Money::new(8_000_00), at(9)),
        )
        .await
        .unwrap();

    fx.engine
        .record_credit_payment(
            &fx.owner,
            CreditPaymentCmd::new(customer, Money::new(5_000_00), PaymentMethod::Cash, at(12))
                .station_id(fx.station_id)
                .reference("RCPT-12"),
        )
        .await
        .unwrap();
    fx.engine
        .record_credit_payment(
            &fx.owner,
            CreditPaymentCmd::new(customer, Money::new(1_000_00), PaymentMethod::Cheque, at(13))
                .station_id(fx.station_id),
        )
        .await
        .unwrap();

    let account = fx
        .engine
        .credit_customer(&fx.owner, customer)
        .await
        .unwrap();
    assert_eq!(account.balance_minor, Money::new(2_000_00));
    assert_eq!(account.recent_payments.len(), 2);
    assert_eq!(account.recent_payments[0].method, PaymentMethod::Cheque);

    let safe = fx.engine.safe(&fx.owner, fx.station_id).await.unwrap();
    assert_eq!(safe.current_balance_minor, Money::new(5_000_00));
    assert_eq!(safe.recent_transactions.len(), 1);
    let row = &safe.recent_transactions[0];
    assert_eq!(row.kind, SafeTransactionKind::CreditPayment);
    assert_eq!(row.reference.as_deref(), Some("RCPT-12"));
}

#[tokio::test]
async fn overpayment_leaves_a_credit_balance() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Fernando"))
        .await
        .unwrap();
    fx.engine
        .record_credit_payment(
            &fx.owner,
            CreditPaymentCmd::new(
                customer,
                Money::new(300_00),
                PaymentMethod::BankTransfer,
                at(9),
            ),
        )
        .await
        .unwrap();
    let account = fx
        .engine
        .credit_customer(&fx.owner, customer)
        .await
        .unwrap();
    assert_eq!(account.balance_minor, Money::new(-300_00));
}

#[tokio::test]
async fn customers_with_history_cannot_be_deleted() {
    let fx = fixture().await;
    let idle = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Idle Ltd"))
        .await
        .unwrap();
    let busy = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Busy Ltd"))
        .await
        .unwrap();
    fx.engine
        .record_credit_sale(&fx.owner, CreditSaleCmd::new(busy, Money::new(1_00), at(9)))
        .await
        .unwrap();

    let err = fx
        .engine
        .delete_credit_customer(&fx.owner, busy)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    fx.engine
        .delete_credit_customer(&fx.owner, idle)
        .await
        .unwrap();
    let err = fx
        .engine
        .credit_customer(&fx.owner, idle)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("credit customer not exists".to_string())
    );
}

#[tokio::test]
async fn amounts_must_be_positive() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Silva"))
        .await
        .unwrap();
    let err = fx
        .engine
        .record_credit_sale(&fx.owner, CreditSaleCmd::new(customer, Money::ZERO, at(9)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = fx
        .engine
        .record_credit_payment(
            &fx.owner,
            CreditPaymentCmd::new(customer, Money::new(-5), PaymentMethod::Cash, at(9)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn balances_must_fit_in_i64() {
    let fx = fixture().await;
    let customer = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Jayasuriya Haulage"))
        .await
        .unwrap();
    fx.engine
        .record_credit_sale(&fx.owner, CreditSaleCmd::new(customer, Money::new(i64::MAX), at(9)))
        .await
        .unwrap();
    let err = fx
        .engine
        .record_credit_sale(&fx.owner, CreditSaleCmd::new(customer, Money::new(1), at(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let other = fx
        .engine
        .new_credit_customer(&fx.owner, NewCustomerCmd::new("Gunawardena"))
        .await
        .unwrap();
    let pay = |minor| CreditPaymentCmd::new(other, Money::new(minor), PaymentMethod::Cheque, at(9));
    fx.engine
        .record_credit_payment(&fx.owner, pay(i64::MAX))
        .await
        .unwrap();
    let err = fx
        .engine
        .record_credit_payment(&fx.owner, pay(2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let account = fx.engine.credit_customer(&fx.owner, customer).await.unwrap();
    assert_eq!(account.balance_minor, Money::new(i64::MAX));
    let account = fx.engine.credit_customer(&fx.owner, other).await.unwrap();
    assert_eq!(account.balance_minor, Money::new(-i64::MAX));
}
