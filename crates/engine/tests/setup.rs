mod common;

use common::{at, engine_with_db, fixture, litres};
use engine::{
    EngineError, FALLBACK_PRICE, Money, NewNozzleCmd, NewPriceCmd, NewTankCmd, PriceSource, Role,
    Tolerance,
};

#[tokio::test]
async fn authenticate_checks_bcrypt_hash() {
    let (engine, _db) = engine_with_db().await;
    let org = engine.new_organization("Lanka Fuels").await.unwrap();
    engine
        .new_user("alice", "s3cret", org, Role::Manager)
        .await
        .unwrap();

    let principal = engine.authenticate("alice", "s3cret").await.unwrap();
    assert_eq!(principal.organization_id, org);
    assert_eq!(principal.role, Role::Manager);

    let wrong = engine.authenticate("alice", "nope").await.unwrap_err();
    let unknown = engine.authenticate("bob", "s3cret").await.unwrap_err();
    assert_eq!(wrong, unknown);

    let err = engine
        .new_user("alice", "other", org, Role::Viewer)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
}

#[tokio::test]
async fn names_are_unique_ignoring_case() {
    let fx = fixture().await;
    let err = fx
        .engine
        .new_station(&fx.owner, "  colombo 07 ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = fx.engine.new_fuel(&fx.owner, "DIESEL").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    // another tenant may reuse the name
    let outsider = fx.outsider().await;
    fx.engine
        .new_station(&outsider, "Colombo 07", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn tanks_and_nozzles_are_validated() {
    let fx = fixture().await;
    let err = fx
        .engine
        .new_tank(
            &fx.owner,
            NewTankCmd::new(fx.station_id, fx.fuel_id, "T2", litres(100))
                .current_level(litres(101)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .new_nozzle(&fx.owner, NewNozzleCmd::new(fx.station_id, fx.tank_id, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let other_station = fx
        .engine
        .new_station(&fx.owner, "Kandy", None)
        .await
        .unwrap();
    let err = fx
        .engine
        .new_nozzle(&fx.owner, NewNozzleCmd::new(other_station, fx.tank_id, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    fx.engine
        .new_nozzle(&fx.owner, NewNozzleCmd::new(fx.station_id, fx.tank_id, 1, 2))
        .await
        .unwrap();
}

#[tokio::test]
async fn price_resolution_prefers_station_rule() {
    let fx = fixture().await;
    let fallback = fx
        .engine
        .effective_price(&fx.owner, fx.fuel_id, fx.station_id, at(8))
        .await
        .unwrap();
    assert_eq!(fallback.price, FALLBACK_PRICE);
    assert_eq!(fallback.source, PriceSource::Fallback);
    assert_eq!(fallback.price_id, None);

    let org_wide = fx
        .engine
        .new_price(
            &fx.owner,
            NewPriceCmd::new(fx.fuel_id, Money::new(330_00), at(0)),
        )
        .await
        .unwrap();
    let latest = fx
        .engine
        .effective_price(&fx.owner, fx.fuel_id, fx.station_id, at(8))
        .await
        .unwrap();
    assert_eq!(latest.source, PriceSource::Latest);
    assert_eq!(latest.price_id, Some(org_wide));

    fx.engine
        .new_price(
            &fx.owner,
            NewPriceCmd::new(fx.fuel_id, Money::new(340_00), at(1)).station_id(fx.station_id),
        )
        .await
        .unwrap();
    fx.engine
        .new_price(
            &fx.owner,
            NewPriceCmd::new(fx.fuel_id, Money::new(360_00), at(12)).station_id(fx.station_id),
        )
        .await
        .unwrap();

    let morning = fx
        .engine
        .effective_price(&fx.owner, fx.fuel_id, fx.station_id, at(8))
        .await
        .unwrap();
    assert_eq!(morning.price, Money::new(340_00));
    assert_eq!(morning.source, PriceSource::Station);
    let evening = fx
        .engine
        .effective_price(&fx.owner, fx.fuel_id, fx.station_id, at(18))
        .await
        .unwrap();
    assert_eq!(evening.price, Money::new(360_00));

    let err = fx
        .engine
        .new_price(&fx.owner, NewPriceCmd::new(fx.fuel_id, Money::ZERO, at(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn only_owners_change_tolerance() {
    let fx = fixture().await;
    assert_eq!(
        fx.engine.tolerance(&fx.viewer).await.unwrap(),
        Tolerance::default()
    );

    let org = fx.owner.organization_id;
    fx.engine
        .new_user("mark", "secret", org, Role::Manager)
        .await
        .unwrap();
    let manager = fx.engine.principal("mark").await.unwrap();
    let stricter = Tolerance::new(10, Money::new(50_00)).unwrap();
    let err = fx
        .engine
        .set_tolerance(&manager, stricter)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    fx.engine.set_tolerance(&fx.owner, stricter).await.unwrap();
    assert_eq!(fx.engine.tolerance(&fx.viewer).await.unwrap(), stricter);
}
