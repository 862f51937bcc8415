mod common;

use chrono::{TimeZone, Utc};
use common::{at, fixture, litres};
use engine::{
    AssignPumperCmd, AssignmentStatus, CloseShiftCmd, EngineError, Money, PriceSource, Quantity,
    ShiftStatus, Tender, TestPourCmd, VarianceStatus,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

async fn tank_level(fx: &common::Fixture) -> i64 {
    let backend = fx.db.get_database_backend();
    let row = fx
        .db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT current_level_milli FROM tanks WHERE id = ?",
            vec![fx.tank_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "current_level_milli").unwrap()
}

fn cash(minor: i64) -> Tender {
    Tender {
        cash: Money::new(minor),
        ..Tender::default()
    }
}

#[tokio::test]
async fn close_shift_prices_meter_delta() {
    let fx = fixture().await;
    fx.set_price(350_00).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();

    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(1000)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, shift.id, assignment.id, litres(1100))
        .await
        .unwrap();

    let closed = fx
        .engine
        .close_shift(
            &fx.owner,
            CloseShiftCmd::new(shift.id, cash(35_000_00), at(14)),
        )
        .await
        .unwrap();

    assert_eq!(closed.status, ShiftStatus::Closed);
    let stats = closed.statistics.unwrap();
    assert_eq!(stats.total_litres_milli, litres(100));
    assert_eq!(stats.total_sales_minor, Money::new(35_000_00));
    assert_eq!(stats.average_price_minor, Money::new(350_00));
    assert_eq!(stats.duration_minutes, 8 * 60);
    assert_eq!(stats.fuels[0].price_source, PriceSource::Station);
    assert_eq!(stats.pumpers[0].pumper_name, "Kamal");
    let variance = stats.variance.unwrap();
    assert_eq!(variance.variance, Money::ZERO);
    assert_eq!(variance.status, VarianceStatus::Normal);
    assert_eq!(closed.declared_amounts.unwrap().cash, Money::new(35_000_00));

    assert_eq!(tank_level(&fx).await, litres(9_900).milli());
}

#[tokio::test]
async fn short_cash_beyond_tolerance_is_suspicious() {
    let fx = fixture().await;
    fx.set_price(350_00).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(1000)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, shift.id, assignment.id, litres(1100))
        .await
        .unwrap();

    let closed = fx
        .engine
        .close_shift(
            &fx.owner,
            CloseShiftCmd::new(shift.id, cash(34_700_00), at(14)),
        )
        .await
        .unwrap();
    let variance = closed.statistics.unwrap().variance.unwrap();
    assert_eq!(variance.variance, Money::new(300_00));
    assert_eq!(variance.tolerance, Money::new(200_00));
    assert_eq!(variance.status, VarianceStatus::Suspicious);
}

#[tokio::test]
async fn rollover_reading_counts_wrapped_litres() {
    let fx = fixture().await;
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
                .start_meter(litres(99_950)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, shift.id, assignment.id, litres(50))
        .await
        .unwrap();

    let stats = fx
        .engine
        .shift_statistics(&fx.owner, shift.id)
        .await
        .unwrap();
    assert_eq!(stats.total_litres_milli, litres(99));
    // no price row at all
    assert_eq!(stats.fuels[0].price_source, PriceSource::Fallback);
    assert_eq!(stats.total_sales_minor, Money::new(99 * 470_00));
}

#[tokio::test]
async fn backwards_reading_is_rejected() {
    let fx = fixture().await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(5000)),
        )
        .await
        .unwrap();

    let err = fx
        .engine
        .close_assignment(&fx.owner, shift.id, assignment.id, litres(4000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));
}

#[tokio::test]
async fn start_meter_defaults_to_last_closed_reading() {
    let fx = fixture().await;
    let first = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(first.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(1000)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, first.id, assignment.id, litres(1250))
        .await
        .unwrap();
    assert_eq!(
        fx.engine
            .nozzle_last_reading(&fx.owner, fx.nozzle_id)
            .await
            .unwrap(),
        Some(litres(1250))
    );

    let second = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(14))
        .await
        .unwrap();
    let next = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(second.id, fx.nozzle_id, fx.pumper_id),
        )
        .await
        .unwrap();
    assert_eq!(next.start_meter_milli, litres(1250));
}

#[tokio::test]
async fn nozzle_cannot_be_assigned_twice() {
    let fx = fixture().await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let cmd = AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id);
    fx.engine.assign_pumper(&fx.owner, cmd.clone()).await.unwrap();
    let err = fx.engine.assign_pumper(&fx.owner, cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn returned_test_pours_are_not_sales() {
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
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(0)),
        )
        .await
        .unwrap();
    fx.engine
        .record_test_pour(
            &fx.owner,
            TestPourCmd::new(shift.id, fx.nozzle_id, litres(5)).note("calibration"),
        )
        .await
        .unwrap();
    fx.engine
        .record_test_pour(
            &fx.owner,
            TestPourCmd::new(shift.id, fx.nozzle_id, litres(2)).returned(false),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, shift.id, assignment.id, litres(50))
        .await
        .unwrap();

    let stats = fx
        .engine
        .shift_statistics(&fx.owner, shift.id)
        .await
        .unwrap();
    assert_eq!(stats.total_litres_milli, litres(45));
    assert_eq!(stats.total_sales_minor, Money::new(4_500_00));
}

#[tokio::test]
async fn closing_auto_closes_active_assignments_and_only_once() {
    let fx = fixture().await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    fx.engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(shift.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(700)),
        )
        .await
        .unwrap();

    let closed = fx
        .engine
        .close_shift(
            &fx.owner,
            CloseShiftCmd::new(shift.id, Tender::default(), at(12)),
        )
        .await
        .unwrap();
    let assignment = &closed.assignments[0];
    assert_eq!(assignment.status, AssignmentStatus::Closed);
    assert_eq!(assignment.end_meter_milli, Some(litres(700)));
    assert_eq!(closed.statistics.unwrap().total_litres_milli, Quantity::ZERO);

    let err = fx
        .engine
        .close_shift(
            &fx.owner,
            CloseShiftCmd::new(shift.id, Tender::default(), at(13)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn bulk_close_reports_each_shift() {
    let fx = fixture().await;
    let a = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let b = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(7))
        .await
        .unwrap();

    let report = fx
        .engine
        .bulk_close_shifts(&fx.owner, None, at(20))
        .await
        .unwrap();
    assert_eq!(report.closed, 2);
    assert_eq!(report.failed, 0);
    let ids: Vec<_> = report.outcomes.iter().map(|o| o.shift_id).collect();
    assert!(ids.contains(&a.id) && ids.contains(&b.id));

    let open = fx
        .engine
        .shifts(&fx.owner, Some(fx.station_id), Some(ShiftStatus::Open))
        .await
        .unwrap();
    assert!(open.is_empty());
    let closed = fx.engine.shift(&fx.owner, a.id).await.unwrap();
    assert_eq!(closed.declared_amounts, Some(Tender::default()));
}

#[tokio::test]
async fn viewers_and_other_tenants_are_kept_out() {
    let fx = fixture().await;
    let err = fx
        .engine
        .open_shift(&fx.viewer, fx.station_id, at(6))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    // viewers can still read
    fx.engine.shift(&fx.viewer, shift.id).await.unwrap();

    let outsider = fx.outsider().await;
    let err = fx.engine.shift(&outsider, shift.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("shift not exists".to_string()));
}

#[tokio::test]
async fn declared_tender_must_fit_in_i64() {
    let fx = fixture().await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();

    let tender = Tender {
        cash: Money::new(i64::MAX),
        card: Money::new(1),
        ..Tender::default()
    };
    let err = fx
        .engine
        .close_shift(&fx.owner, CloseShiftCmd::new(shift.id, tender, at(14)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let still_open = fx.engine.shift(&fx.owner, shift.id).await.unwrap();
    assert_eq!(still_open.status, ShiftStatus::Open);
}

#[tokio::test]
async fn reversed_reading_is_discarded_at_close() {
    let fx = fixture().await;
    fx.set_price(350_00).await;
    let shift = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();

    // 5000 L -> 4000 L is neither forward nor a rollover
    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO shift_assignments \
             (id, shift_id, nozzle_id, pumper_id, start_meter_milli, end_meter_milli, status, created_at, closed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                shift.id.to_string().into(),
                fx.nozzle_id.to_string().into(),
                fx.pumper_id.to_string().into(),
                litres(5000).milli().into(),
                litres(4000).milli().into(),
                AssignmentStatus::Closed.as_str().into(),
                at(7).into(),
                at(9).into(),
            ],
        ))
        .await
        .unwrap();
    let level = tank_level(&fx).await;

    let closed = fx
        .engine
        .close_shift(
            &fx.owner,
            CloseShiftCmd::new(shift.id, Tender::default(), at(14)),
        )
        .await
        .unwrap();
    let stats = closed.statistics.unwrap();
    assert_eq!(stats.closed_assignments, 1);
    assert_eq!(stats.discarded_readings, 1);
    assert_eq!(stats.total_litres_milli, Quantity::ZERO);
    assert_eq!(stats.total_sales_minor, Money::ZERO);
    assert_eq!(stats.variance.unwrap().status, VarianceStatus::Normal);
    assert_eq!(tank_level(&fx).await, level);
}

#[tokio::test]
async fn last_reading_follows_the_newest_assignment() {
    let fx = fixture().await;
    // a shift dated far ahead gets its active assignment auto-closed with a
    // late timestamp
    let ahead = fx
        .engine
        .open_shift(
            &fx.owner,
            fx.station_id,
            Utc.with_ymd_and_hms(2099, 1, 1, 6, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    fx.engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(ahead.id, fx.nozzle_id, fx.pumper_id).start_meter(litres(1000)),
        )
        .await
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));

    let current = fx
        .engine
        .open_shift(&fx.owner, fx.station_id, at(6))
        .await
        .unwrap();
    let assignment = fx
        .engine
        .assign_pumper(
            &fx.owner,
            AssignPumperCmd::new(current.id, fx.nozzle_id, fx.pumper_id)
                .start_meter(litres(1000)),
        )
        .await
        .unwrap();
    fx.engine
        .close_assignment(&fx.owner, current.id, assignment.id, litres(1200))
        .await
        .unwrap();

    let report = fx
        .engine
        .bulk_close_shifts(&fx.owner, Some(fx.station_id), at(20))
        .await
        .unwrap();
    assert_eq!(report.closed, 2);

    assert_eq!(
        fx.engine
            .nozzle_last_reading(&fx.owner, fx.nozzle_id)
            .await
            .unwrap(),
        Some(litres(1200))
    );
}
