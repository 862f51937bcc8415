mod common;

use common::{at, fixture, litres};
use engine::{DeliveryStatus, EngineError, NewDeliveryCmd, VerifyDeliveryCmd};
use sea_orm::{ConnectionTrait, Statement};

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

fn lorry(fx: &common::Fixture) -> NewDeliveryCmd {
    // fixture tank: 20000 L capacity, 10000 L in it
    NewDeliveryCmd::new(fx.tank_id, "Ceylon Petroleum", litres(6_000), litres(10_000), at(8))
        .invoice_number("INV-2024-031")
}

#[tokio::test]
async fn verified_delivery_sets_tank_to_after_dip() {
    let fx = fixture().await;
    let delivery = fx.engine.record_delivery(&fx.owner, lorry(&fx)).await.unwrap();
    assert_eq!(delivery.status, DeliveryStatus::PendingVerification);
    assert_eq!(delivery.station_id, fx.station_id);
    // recording alone does not move the tank
    assert_eq!(tank_level(&fx).await, litres(10_000).milli());

    let verified = fx
        .engine
        .verify_delivery(
            &fx.owner,
            VerifyDeliveryCmd::new(delivery.id, litres(15_980), at(9))
                .sold_during(litres(15))
                .notes("dipped twice"),
        )
        .await
        .unwrap();
    assert_eq!(verified.status, DeliveryStatus::Verified);
    assert_eq!(verified.received_milli, Some(litres(5_995)));
    assert_eq!(verified.invoice_variance(), Some(litres(-5)));
    assert_eq!(verified.verified_by.as_deref(), Some("alice"));
    assert_eq!(verified.notes.as_deref(), Some("Verification: dipped twice"));
    assert_eq!(tank_level(&fx).await, litres(15_980).milli());

    let err = fx
        .engine
        .verify_delivery(
            &fx.owner,
            VerifyDeliveryCmd::new(delivery.id, litres(15_980), at(10)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn short_delivery_is_flagged() {
    let fx = fixture().await;
    let delivery = fx.engine.record_delivery(&fx.owner, lorry(&fx)).await.unwrap();

    // 100 L short on 6000 L is well past half a percent
    let verified = fx
        .engine
        .verify_delivery(
            &fx.owner,
            VerifyDeliveryCmd::new(delivery.id, litres(15_900), at(9)),
        )
        .await
        .unwrap();
    assert_eq!(verified.status, DeliveryStatus::Discrepancy);
    assert_eq!(verified.invoice_variance(), Some(litres(-100)));
    // the dip is still the truth for the tank
    assert_eq!(tank_level(&fx).await, litres(15_900).milli());

    let listed = fx
        .engine
        .deliveries(&fx.owner, None, Some(fx.tank_id))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, DeliveryStatus::Discrepancy);
}

#[tokio::test]
async fn after_dip_above_capacity_is_rejected() {
    let fx = fixture().await;
    let delivery = fx.engine.record_delivery(&fx.owner, lorry(&fx)).await.unwrap();

    let err = fx
        .engine
        .verify_delivery(
            &fx.owner,
            VerifyDeliveryCmd::new(delivery.id, litres(20_001), at(9)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReading(_)));

    let pending = fx.engine.delivery(&fx.owner, delivery.id).await.unwrap();
    assert_eq!(pending.status, DeliveryStatus::PendingVerification);
    assert_eq!(tank_level(&fx).await, litres(10_000).milli());
}

#[tokio::test]
async fn deliveries_are_validated_and_scoped() {
    let fx = fixture().await;
    let err = fx
        .engine
        .record_delivery(
            &fx.owner,
            NewDeliveryCmd::new(fx.tank_id, "Ceylon Petroleum", litres(0), litres(10_000), at(8)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .record_delivery(&fx.viewer, lorry(&fx))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let delivery = fx.engine.record_delivery(&fx.owner, lorry(&fx)).await.unwrap();
    let outsider = fx.outsider().await;
    let err = fx
        .engine
        .delivery(&outsider, delivery.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("delivery not exists".to_string()));
    assert!(
        fx.engine
            .deliveries(&outsider, None, None)
            .await
            .unwrap()
            .is_empty()
    );
}
