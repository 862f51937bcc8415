use api_types::{
    StationQuery,
    safe::{
        OpeningBalanceNew, PendingDeposit, PendingDeposits, Recompute, Reconciliation, Safe,
        SafeTransaction, SafeTransactionList, SafeTransactionListQuery, SafeTransactionNew,
    },
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{Money, Principal, SafeTransactionCmd, SafeTransactionFilter, SafeTransactionKind};

use crate::{ServerError, server::ServerState, utc_or_now};

fn parse_kind(kind: &str) -> Result<SafeTransactionKind, ServerError> {
    SafeTransactionKind::try_from(kind)
        .map_err(|_| ServerError::Generic(format!("unknown transaction kind: {kind}")))
}

fn map_transaction(tx: engine::SafeTransaction) -> SafeTransaction {
    SafeTransaction {
        id: tx.id,
        kind: tx.kind.as_str().to_string(),
        amount_minor: tx.amount_minor.minor(),
        balance_before_minor: tx.balance_before_minor.minor(),
        balance_after_minor: tx.balance_after_minor.minor(),
        timestamp: tx.timestamp,
        shift_id: tx.shift_id,
        reference: tx.reference,
        description: tx.description,
        performed_by: tx.performed_by,
    }
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<Safe>, ServerError> {
    let safe = state.engine.safe(&principal, query.station_id).await?;
    Ok(Json(Safe {
        id: safe.id,
        station_id: safe.station_id,
        opening_balance_minor: safe.opening_balance_minor.minor(),
        current_balance_minor: safe.current_balance_minor.minor(),
        updated_at: safe.updated_at,
        recent_transactions: safe
            .recent_transactions
            .into_iter()
            .map(map_transaction)
            .collect(),
    }))
}

pub async fn opening_balance(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<OpeningBalanceNew>,
) -> Result<(StatusCode, Json<SafeTransaction>), ServerError> {
    let tx = state
        .engine
        .set_opening_balance(
            &principal,
            payload.station_id,
            Money::new(payload.amount_minor),
            utc_or_now(payload.timestamp),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn transaction_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<SafeTransactionNew>,
) -> Result<(StatusCode, Json<SafeTransaction>), ServerError> {
    let kind = parse_kind(&payload.kind)?;
    let mut cmd = SafeTransactionCmd::new(
        payload.station_id,
        kind,
        Money::new(payload.amount_minor),
        utc_or_now(payload.timestamp),
    );
    if let Some(shift_id) = payload.shift_id {
        cmd = cmd.shift_id(shift_id);
    }
    if let Some(reference) = payload.reference {
        cmd = cmd.reference(reference);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let tx = state.engine.record_safe_transaction(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_transaction(tx))))
}

pub async fn list_transactions(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<SafeTransactionListQuery>,
) -> Result<Json<SafeTransactionList>, ServerError> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;
    let filter = SafeTransactionFilter {
        kind,
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
        limit: query.limit,
    };
    let transactions = state
        .engine
        .safe_transactions(&principal, query.station_id, filter)
        .await?;
    Ok(Json(SafeTransactionList {
        transactions: transactions.into_iter().map(map_transaction).collect(),
    }))
}

pub async fn reconcile(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<Reconciliation>, ServerError> {
    let report = state
        .engine
        .reconcile_safe(&principal, query.station_id)
        .await?;
    Ok(Json(Reconciliation {
        safe_id: report.safe_id,
        station_id: report.station_id,
        stored_balance_minor: report.stored_balance.minor(),
        calculated_balance_minor: report.calculated_balance.minor(),
        discrepancy_minor: report.discrepancy.minor(),
        is_balanced: report.is_balanced,
        last_opening_balance_minor: report.last_opening_balance.minor(),
        total_income_minor: report.total_income.minor(),
        total_outflow_minor: report.total_outflow.minor(),
        income_count: report.income_count,
        outflow_count: report.outflow_count,
        transaction_count: report.transaction_count,
        formula: report.formula,
    }))
}

pub async fn recompute(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<StationQuery>,
) -> Result<Json<Recompute>, ServerError> {
    let outcome = state
        .engine
        .recompute_safe(&principal, payload.station_id)
        .await?;
    Ok(Json(Recompute {
        safe_id: outcome.safe_id,
        rows_repaired: outcome.rows_repaired,
        previous_balance_minor: outcome.previous_balance.minor(),
        balance_minor: outcome.balance.minor(),
    }))
}

pub async fn pending_deposits(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<PendingDeposits>, ServerError> {
    let pending = state
        .engine
        .pending_deposits(&principal, query.station_id)
        .await?;
    Ok(Json(PendingDeposits {
        shifts: pending
            .into_iter()
            .map(|p| PendingDeposit {
                shift_id: p.shift_id,
                start_time: p.start_time,
                end_time: p.end_time,
                declared_cash_minor: p.declared_cash.minor(),
                deposited_minor: p.deposited.minor(),
                pending_minor: p.pending.minor(),
            })
            .collect(),
    }))
}
