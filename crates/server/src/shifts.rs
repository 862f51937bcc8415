use api_types::shift::{
    Assignment, AssignmentClose, AssignmentNew, AssignmentStatus, BulkClose, BulkCloseOutcome,
    BulkCloseReport, FuelBreakdown, PumperBreakdown, Shift, ShiftClose, ShiftList,
    ShiftListQuery, ShiftNew, ShiftStatus, Statistics, Tender, TestPourNew, Variance,
    VarianceStatus,
};
use api_types::Created;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    AssignPumperCmd, CloseShiftCmd, Money, Principal, Quantity, ShiftAssignment,
    ShiftStatistics, TestPourCmd,
};
use uuid::Uuid;

use crate::{ServerError, prices::map_price_source, server::ServerState, utc_or_now};

pub(crate) fn map_shift_status(status: engine::ShiftStatus) -> ShiftStatus {
    match status {
        engine::ShiftStatus::Open => ShiftStatus::Open,
        engine::ShiftStatus::Closed => ShiftStatus::Closed,
    }
}

fn map_assignment(assignment: ShiftAssignment) -> Assignment {
    Assignment {
        id: assignment.id,
        nozzle_id: assignment.nozzle_id,
        pumper_id: assignment.pumper_id,
        start_meter_milli: assignment.start_meter_milli.milli(),
        end_meter_milli: assignment.end_meter_milli.map(Quantity::milli),
        status: match assignment.status {
            engine::AssignmentStatus::Active => AssignmentStatus::Active,
            engine::AssignmentStatus::Closed => AssignmentStatus::Closed,
        },
    }
}

fn map_variance(variance: engine::Variance) -> Variance {
    Variance {
        calculated_minor: variance.calculated.minor(),
        declared_minor: variance.declared.minor(),
        variance_minor: variance.variance.minor(),
        tolerance_minor: variance.tolerance.minor(),
        status: match variance.status {
            engine::VarianceStatus::Normal => VarianceStatus::Normal,
            engine::VarianceStatus::Suspicious => VarianceStatus::Suspicious,
        },
    }
}

fn map_statistics(stats: ShiftStatistics) -> Statistics {
    Statistics {
        duration_minutes: stats.duration_minutes,
        total_litres_milli: stats.total_litres_milli.milli(),
        total_sales_minor: stats.total_sales_minor.minor(),
        average_price_minor: stats.average_price_minor.minor(),
        total_assignments: stats.total_assignments,
        closed_assignments: stats.closed_assignments,
        discarded_readings: stats.discarded_readings,
        pumpers: stats
            .pumpers
            .into_iter()
            .map(|p| PumperBreakdown {
                pumper_id: p.pumper_id,
                pumper_name: p.pumper_name,
                assignments: p.assignments,
                litres_milli: p.litres_milli.milli(),
                sales_minor: p.sales_minor.minor(),
            })
            .collect(),
        fuels: stats
            .fuels
            .into_iter()
            .map(|f| FuelBreakdown {
                fuel_id: f.fuel_id,
                fuel_name: f.fuel_name,
                price_minor: f.price_minor.minor(),
                price_source: map_price_source(f.price_source),
                litres_milli: f.litres_milli.milli(),
                sales_minor: f.sales_minor.minor(),
            })
            .collect(),
        variance: stats.variance.map(map_variance),
    }
}

fn map_tender(tender: engine::Tender) -> Tender {
    Tender {
        cash_minor: tender.cash.minor(),
        card_minor: tender.card.minor(),
        credit_minor: tender.credit.minor(),
        cheque_minor: tender.cheque.minor(),
    }
}

fn map_shift(shift: engine::Shift) -> Shift {
    Shift {
        id: shift.id,
        station_id: shift.station_id,
        start_time: shift.start_time,
        end_time: shift.end_time,
        status: map_shift_status(shift.status),
        opened_by: shift.opened_by,
        closed_by: shift.closed_by,
        statistics: shift.statistics.map(map_statistics),
        declared: shift.declared_amounts.map(map_tender),
        assignments: shift.assignments.into_iter().map(map_assignment).collect(),
    }
}

pub async fn open(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<ShiftNew>,
) -> Result<(StatusCode, Json<Shift>), ServerError> {
    let shift = state
        .engine
        .open_shift(&principal, payload.station_id, utc_or_now(payload.start_time))
        .await?;
    Ok((StatusCode::CREATED, Json(map_shift(shift))))
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<ShiftListQuery>,
) -> Result<Json<ShiftList>, ServerError> {
    let status = query.status.map(|status| match status {
        ShiftStatus::Open => engine::ShiftStatus::Open,
        ShiftStatus::Closed => engine::ShiftStatus::Closed,
    });
    let shifts = state
        .engine
        .shifts(&principal, query.station_id, status)
        .await?;
    Ok(Json(ShiftList {
        shifts: shifts.into_iter().map(map_shift).collect(),
    }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<Shift>, ServerError> {
    let shift = state.engine.shift(&principal, shift_id).await?;
    Ok(Json(map_shift(shift)))
}

pub async fn assign(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<AssignmentNew>,
) -> Result<(StatusCode, Json<Assignment>), ServerError> {
    let mut cmd = AssignPumperCmd::new(shift_id, payload.nozzle_id, payload.pumper_id);
    if let Some(start) = payload.start_meter_milli {
        cmd = cmd.start_meter(Quantity::from_milli(start));
    }
    let assignment = state.engine.assign_pumper(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_assignment(assignment))))
}

pub async fn close_assignment(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path((shift_id, assignment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AssignmentClose>,
) -> Result<Json<Assignment>, ServerError> {
    let assignment = state
        .engine
        .close_assignment(
            &principal,
            shift_id,
            assignment_id,
            Quantity::from_milli(payload.end_meter_milli),
        )
        .await?;
    Ok(Json(map_assignment(assignment)))
}

pub async fn test_pour(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<TestPourNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = TestPourCmd::new(
        shift_id,
        payload.nozzle_id,
        Quantity::from_milli(payload.litres_milli),
    );
    if let Some(returned) = payload.returned {
        cmd = cmd.returned(returned);
    }
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    let id = state.engine.record_test_pour(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn statistics(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<Statistics>, ServerError> {
    let stats = state.engine.shift_statistics(&principal, shift_id).await?;
    Ok(Json(map_statistics(stats)))
}

pub async fn close(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<ShiftClose>,
) -> Result<Json<Shift>, ServerError> {
    let declared = payload.declared;
    let tender = engine::Tender::new(
        Money::new(declared.cash_minor),
        Money::new(declared.card_minor),
        Money::new(declared.credit_minor),
        Money::new(declared.cheque_minor),
    )?;
    let cmd = CloseShiftCmd::new(shift_id, tender, utc_or_now(payload.end_time));
    let shift = state.engine.close_shift(&principal, cmd).await?;
    Ok(Json(map_shift(shift)))
}

pub async fn bulk_close(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<BulkClose>,
) -> Result<Json<BulkCloseReport>, ServerError> {
    let report = state
        .engine
        .bulk_close_shifts(&principal, payload.station_id, utc_or_now(payload.end_time))
        .await?;
    Ok(Json(BulkCloseReport {
        closed: report.closed,
        failed: report.failed,
        outcomes: report
            .outcomes
            .into_iter()
            .map(|outcome| BulkCloseOutcome {
                shift_id: outcome.shift_id,
                statistics: outcome.statistics.map(map_statistics),
                error: outcome.error,
            })
            .collect(),
    }))
}
