use api_types::{
    Created,
    price::{EffectivePrice, EffectivePriceQuery, PriceNew, PriceSource},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Money, NewPriceCmd, Principal};

use crate::{ServerError, server::ServerState, utc_or_now};

pub(crate) fn map_price_source(source: engine::PriceSource) -> PriceSource {
    match source {
        engine::PriceSource::Station => PriceSource::Station,
        engine::PriceSource::Latest => PriceSource::Latest,
        engine::PriceSource::Fallback => PriceSource::Fallback,
    }
}

pub async fn price_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<PriceNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = NewPriceCmd::new(
        payload.fuel_id,
        Money::new(payload.price_minor),
        payload.effective_date.with_timezone(&Utc),
    );
    if let Some(station_id) = payload.station_id {
        cmd = cmd.station_id(station_id);
    }
    let id = state.engine.new_price(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn effective(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<EffectivePriceQuery>,
) -> Result<Json<EffectivePrice>, ServerError> {
    let price = state
        .engine
        .effective_price(
            &principal,
            query.fuel_id,
            query.station_id,
            utc_or_now(query.at),
        )
        .await?;
    Ok(Json(EffectivePrice {
        price_minor: price.price.minor(),
        source: map_price_source(price.source),
        price_id: price.price_id,
    }))
}
