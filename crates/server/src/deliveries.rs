use api_types::delivery::{
    Delivery, DeliveryList, DeliveryListQuery, DeliveryNew, DeliveryStatus, DeliveryVerify,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewDeliveryCmd, Principal, Quantity, VerifyDeliveryCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, utc_or_now};

fn map_status(status: engine::DeliveryStatus) -> DeliveryStatus {
    match status {
        engine::DeliveryStatus::PendingVerification => DeliveryStatus::PendingVerification,
        engine::DeliveryStatus::Verified => DeliveryStatus::Verified,
        engine::DeliveryStatus::Discrepancy => DeliveryStatus::Discrepancy,
    }
}

fn map_delivery(delivery: engine::Delivery) -> Delivery {
    Delivery {
        id: delivery.id,
        station_id: delivery.station_id,
        tank_id: delivery.tank_id,
        invoice_variance_milli: delivery.invoice_variance().map(Quantity::milli),
        supplier: delivery.supplier,
        invoice_number: delivery.invoice_number,
        invoice_quantity_milli: delivery.invoice_quantity_milli.milli(),
        before_dip_milli: delivery.before_dip_milli.milli(),
        after_dip_milli: delivery.after_dip_milli.map(Quantity::milli),
        sold_during_milli: delivery.sold_during_milli.milli(),
        received_milli: delivery.received_milli.map(Quantity::milli),
        status: map_status(delivery.status),
        delivered_at: delivery.delivered_at,
        recorded_by: delivery.recorded_by,
        verified_by: delivery.verified_by,
        verified_at: delivery.verified_at,
        notes: delivery.notes,
    }
}

pub async fn delivery_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<DeliveryNew>,
) -> Result<(StatusCode, Json<Delivery>), ServerError> {
    let mut cmd = NewDeliveryCmd::new(
        payload.tank_id,
        payload.supplier,
        Quantity::from_milli(payload.invoice_quantity_milli),
        Quantity::from_milli(payload.before_dip_milli),
        utc_or_now(payload.delivered_at),
    );
    if let Some(number) = payload.invoice_number {
        cmd = cmd.invoice_number(number);
    }
    if let Some(sold) = payload.sold_before_drop_milli {
        cmd = cmd.sold_before_drop(Quantity::from_milli(sold));
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let delivery = state.engine.record_delivery(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_delivery(delivery))))
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<DeliveryListQuery>,
) -> Result<Json<DeliveryList>, ServerError> {
    let deliveries = state
        .engine
        .deliveries(&principal, query.station_id, query.tank_id)
        .await?;
    Ok(Json(DeliveryList {
        deliveries: deliveries.into_iter().map(map_delivery).collect(),
    }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<Delivery>, ServerError> {
    let delivery = state.engine.delivery(&principal, delivery_id).await?;
    Ok(Json(map_delivery(delivery)))
}

pub async fn verify(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(delivery_id): Path<Uuid>,
    Json(payload): Json<DeliveryVerify>,
) -> Result<Json<Delivery>, ServerError> {
    let mut cmd = VerifyDeliveryCmd::new(
        delivery_id,
        Quantity::from_milli(payload.after_dip_milli),
        utc_or_now(payload.verified_at),
    );
    if let Some(sold) = payload.sold_during_milli {
        cmd = cmd.sold_during(Quantity::from_milli(sold));
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    let delivery = state.engine.verify_delivery(&principal, cmd).await?;
    Ok(Json(map_delivery(delivery)))
}
