use api_types::{
    Created,
    shop::{
        ProductNew, PurchaseNew, ShopAssignment, ShopAssignmentNew, ShopClose, ShopItem,
        StockAdd, Wastage, WastageNew,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Money, NewProductCmd, Principal, PurchaseCmd, Quantity, WastageCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, shifts::map_shift_status, utc_or_now};

fn map_item(item: engine::ShopItem) -> ShopItem {
    ShopItem {
        id: item.id,
        product_id: item.product_id,
        opening_stock_milli: item.opening_stock_milli.milli(),
        added_stock_milli: item.added_stock_milli.milli(),
        closing_stock_milli: item.closing_stock_milli.map(Quantity::milli),
        sold_quantity_milli: item.sold_quantity_milli.map(Quantity::milli),
        revenue_minor: item.revenue_minor.map(Money::minor),
    }
}

fn map_assignment(assignment: engine::ShopAssignment) -> ShopAssignment {
    ShopAssignment {
        id: assignment.id,
        shift_id: assignment.shift_id,
        pumper_id: assignment.pumper_id,
        status: map_shift_status(assignment.status),
        total_revenue_minor: assignment.total_revenue_minor.minor(),
        opened_at: assignment.opened_at,
        closed_at: assignment.closed_at,
        items: assignment.items.into_iter().map(map_item).collect(),
    }
}

pub async fn product_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<ProductNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = NewProductCmd::new(payload.name, Money::new(payload.selling_price_minor));
    if let Some(unit) = payload.unit {
        cmd = cmd.unit(unit);
    }
    let id = state.engine.new_product(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn purchase_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = PurchaseCmd::new(
        payload.product_id,
        Quantity::from_milli(payload.quantity_milli),
        Money::new(payload.cost_price_minor),
        utc_or_now(payload.purchase_date),
    );
    if let Some(supplier) = payload.supplier {
        cmd = cmd.supplier(supplier);
    }
    let id = state.engine.record_purchase(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn assignment_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<ShopAssignmentNew>,
) -> Result<(StatusCode, Json<ShopAssignment>), ServerError> {
    let assignment = state
        .engine
        .open_shop_assignment(
            &principal,
            payload.shift_id,
            payload.pumper_id,
            &payload.product_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_assignment(assignment))))
}

pub async fn stock_add(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<StockAdd>,
) -> Result<Json<ShopItem>, ServerError> {
    let item = state
        .engine
        .add_shop_stock(
            &principal,
            assignment_id,
            payload.product_id,
            Quantity::from_milli(payload.quantity_milli),
        )
        .await?;
    Ok(Json(map_item(item)))
}

pub async fn assignment_close(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<ShopClose>,
) -> Result<Json<ShopAssignment>, ServerError> {
    let closing: Vec<(Uuid, Quantity)> = payload
        .items
        .iter()
        .map(|item| (item.product_id, Quantity::from_milli(item.closing_stock_milli)))
        .collect();
    let assignment = state
        .engine
        .close_shop_assignment(&principal, assignment_id, &closing)
        .await?;
    Ok(Json(map_assignment(assignment)))
}

pub async fn wastage_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<WastageNew>,
) -> Result<(StatusCode, Json<Wastage>), ServerError> {
    let mut cmd = WastageCmd::new(payload.product_id, Quantity::from_milli(payload.quantity_milli));
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }
    let outcome = state.engine.record_wastage(&principal, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(Wastage {
            id: outcome.wastage_id,
            drawn_milli: outcome.drawn.milli(),
            untracked_milli: outcome.untracked.milli(),
        }),
    ))
}
