use api_types::settings::Tolerance;
use axum::{Extension, Json, extract::State};
use engine::{Money, Principal};

use crate::{ServerError, server::ServerState};

fn map_tolerance(tolerance: engine::Tolerance) -> Tolerance {
    Tolerance {
        basis_points: tolerance.basis_points,
        flat_minor: tolerance.flat.minor(),
    }
}

pub async fn get_tolerance(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
) -> Result<Json<Tolerance>, ServerError> {
    let tolerance = state.engine.tolerance(&principal).await?;
    Ok(Json(map_tolerance(tolerance)))
}

pub async fn set_tolerance(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<Tolerance>,
) -> Result<Json<Tolerance>, ServerError> {
    let tolerance = engine::Tolerance::new(payload.basis_points, Money::new(payload.flat_minor))?;
    let saved = state.engine.set_tolerance(&principal, tolerance).await?;
    Ok(Json(map_tolerance(saved)))
}
