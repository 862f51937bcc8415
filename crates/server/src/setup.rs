use api_types::{
    Created,
    setup::{FuelNew, LastReading, NozzleNew, PumperNew, StationNew, TankNew},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewNozzleCmd, NewPumperCmd, NewTankCmd, Principal, Quantity};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn station_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<StationNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let id = state
        .engine
        .new_station(&principal, &payload.name, payload.location.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn fuel_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<FuelNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let id = state.engine.new_fuel(&principal, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn tank_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<TankNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = NewTankCmd::new(
        payload.station_id,
        payload.fuel_id,
        payload.name,
        Quantity::from_milli(payload.capacity_milli),
    );
    if let Some(level) = payload.current_level_milli {
        cmd = cmd.current_level(Quantity::from_milli(level));
    }
    let id = state.engine.new_tank(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn nozzle_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<NozzleNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let cmd = NewNozzleCmd::new(
        payload.station_id,
        payload.tank_id,
        payload.pump_number,
        payload.nozzle_number,
    );
    let id = state.engine.new_nozzle(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn pumper_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<PumperNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = NewPumperCmd::new(payload.name);
    if let Some(station_id) = payload.station_id {
        cmd = cmd.station_id(station_id);
    }
    if let Some(code) = payload.employee_code {
        cmd = cmd.employee_code(code);
    }
    let id = state.engine.new_pumper(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn last_reading(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(nozzle_id): Path<Uuid>,
) -> Result<Json<LastReading>, ServerError> {
    let reading = state
        .engine
        .nozzle_last_reading(&principal, nozzle_id)
        .await?;
    Ok(Json(LastReading {
        nozzle_id,
        end_meter_milli: reading.map(Quantity::milli),
    }))
}
