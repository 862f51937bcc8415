mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{at, fixture};
use engine::{
    EngineError, Money, NewProductCmd, PurchaseCmd, Quantity, ShiftStatus, WastageCmd,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

fn units(value: i64) -> Quantity {
    Quantity::from_whole(value)
}

/// `(batch_id, quantity_milli, cost_price_minor)` of every sale row, cheapest first.
async fn sale_rows(fx: &common::Fixture) -> Vec<(Option<String>, i64, i64)> {
    let backend = fx.db.get_database_backend();
    fx.db
        .query_all(Statement::from_string(
            backend,
            "SELECT batch_id, quantity_milli, cost_price_minor FROM shop_sales \
             ORDER BY cost_price_minor DESC"
                .to_string(),
        ))
        .await
        .unwrap()
        .into_iter()
        .map(|row| {
            (
                row.try_get::<Option<String>>("", "batch_id").unwrap(),
                row.try_get::<i64>("", "quantity_milli").unwrap(),
                row.try_get::<i64>("", "cost_price_minor").unwrap(),
            )
        })
        .collect()
}

async fn batch_quantity(fx: &common::Fixture, batch_id: Uuid) -> i64 {
    let backend = fx.db.get_database_backend();
    fx.db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT current_quantity_milli FROM shop_batches WHERE id = ?",
            vec![batch_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap()
        .try_get::<i64>("", "current_quantity_milli")
        .unwrap()
}

/// A product with two batches: 10 @ Rs 100 bought first, 10 @ Rs 120 later.
async fn stocked_product(fx: &common::Fixture) -> (Uuid, Uuid, Uuid) {
    let product_id = fx
        .engine
        .new_product(
            &fx.owner,
            NewProductCmd::new("Engine Oil 1L", Money::new(150_00)).unit("bottle"),
        )
        .await
        .unwrap();
    let jan = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    let older = fx
        .engine
        .record_purchase(
            &fx.owner,
            PurchaseCmd::new(product_id, units(10), Money::new(100_00), jan).supplier("Caltex"),
        )
        .await
        .unwrap();
    let newer = fx
        .engine
        .record_purchase(
            &fx.owner,
            PurchaseCmd::new(product_id, units(10), Money::new(120_00), jan + Duration::days(20)),
        )
        .await
        .unwrap();
    (product_id, older, newer)
}

#[tokio::test]
async fn closing_draws_oldest_batches_first() {
    let fx = fixture().await;
    let (product_id, older, newer) = stocked_product(&fx).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let opened = fx
        .engine
        .open_shop_assignment(&fx.owner, shift.id, fx.pumper_id, &[])
        .await
        .unwrap();
    assert_eq!(opened.items.len(), 1);
    assert_eq!(opened.items[0].opening_stock_milli, units(20));

    let closed = fx
        .engine
        .close_shop_assignment(&fx.owner, opened.id, &[(product_id, units(5))])
        .await
        .unwrap();
    assert_eq!(closed.status, ShiftStatus::Closed);
    assert_eq!(closed.items[0].sold_quantity_milli, Some(units(15)));
    assert_eq!(closed.total_revenue_minor, Money::new(15 * 150_00));

    let rows = sale_rows(&fx).await;
    assert_eq!(
        rows,
        vec![
            (Some(newer.to_string()), units(5).milli(), 120_00),
            (Some(older.to_string()), units(10).milli(), 100_00),
        ]
    );
    assert_eq!(batch_quantity(&fx, older).await, 0);
    assert_eq!(batch_quantity(&fx, newer).await, units(5).milli());
}

#[tokio::test]
async fn stock_beyond_batches_is_sold_untracked() {
    let fx = fixture().await;
    let (product_id, _, _) = stocked_product(&fx).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let opened = fx
        .engine
        .open_shop_assignment(&fx.owner, shift.id, fx.pumper_id, &[product_id])
        .await
        .unwrap();
    let item = fx
        .engine
        .add_shop_stock(&fx.owner, opened.id, product_id, units(5))
        .await
        .unwrap();
    assert_eq!(item.added_stock_milli, units(5));

    fx.engine
        .close_shop_assignment(&fx.owner, opened.id, &[(product_id, Quantity::ZERO)])
        .await
        .unwrap();
    let rows = sale_rows(&fx).await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], (None, units(5).milli(), 0));
}

#[tokio::test]
async fn closing_stock_must_be_consistent() {
    let fx = fixture().await;
    let (product_id, _, _) = stocked_product(&fx).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let opened = fx
        .engine
        .open_shop_assignment(&fx.owner, shift.id, fx.pumper_id, &[])
        .await
        .unwrap();

    let err = fx
        .engine
        .close_shop_assignment(&fx.owner, opened.id, &[(product_id, units(25))])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .close_shop_assignment(&fx.owner, opened.id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .close_shop_assignment(&fx.owner, opened.id, &[(Uuid::new_v4(), units(1))])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // nothing was drawn by the failed attempts
    assert!(sale_rows(&fx).await.is_empty());
}

#[tokio::test]
async fn one_open_counter_per_pumper() {
    let fx = fixture().await;
    stocked_product(&fx).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    fx.engine
        .open_shop_assignment(&fx.owner, shift.id, fx.pumper_id, &[])
        .await
        .unwrap();
    let err = fx
        .engine
        .open_shop_assignment(&fx.owner, shift.id, fx.pumper_id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn wastage_draws_fifo_and_reports_shortfall() {
    let fx = fixture().await;
    let (product_id, older, newer) = stocked_product(&fx).await;

    let outcome = fx
        .engine
        .record_wastage(
            &fx.owner,
            WastageCmd::new(product_id, units(12)).reason("leaking bottles"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.drawn, units(12));
    assert_eq!(outcome.untracked, Quantity::ZERO);
    assert_eq!(batch_quantity(&fx, older).await, 0);
    assert_eq!(batch_quantity(&fx, newer).await, units(8).milli());

    let outcome = fx
        .engine
        .record_wastage(&fx.owner, WastageCmd::new(product_id, units(10)))
        .await
        .unwrap();
    assert_eq!(outcome.drawn, units(8));
    assert_eq!(outcome.untracked, units(2));
}

#[tokio::test]
async fn product_names_are_unique_per_organization() {
    let fx = fixture().await;
    stocked_product(&fx).await;
    let err = fx
        .engine
        .new_product(&fx.owner, NewProductCmd::new("engine oil 1l", Money::new(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = fx
        .engine
        .record_purchase(
            &fx.owner,
            PurchaseCmd::new(Uuid::new_v4(), units(1), Money::new(1), at(0)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
