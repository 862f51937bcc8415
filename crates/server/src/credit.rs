use api_types::{
    Created,
    credit::{
        CreditPayment, CreditPaymentNew, CreditSale, CreditSaleNew, Customer, CustomerNew,
        PaymentMethod,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    CreditPaymentCmd, CreditSaleCmd, Money, NewCustomerCmd, Principal, Quantity,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, utc_or_now};

fn map_method(method: engine::PaymentMethod) -> PaymentMethod {
    match method {
        engine::PaymentMethod::Cash => PaymentMethod::Cash,
        engine::PaymentMethod::Cheque => PaymentMethod::Cheque,
        engine::PaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
    }
}

fn map_sale(sale: engine::CreditSale) -> CreditSale {
    CreditSale {
        id: sale.id,
        customer_id: sale.customer_id,
        station_id: sale.station_id,
        shift_id: sale.shift_id,
        fuel_id: sale.fuel_id,
        amount_minor: sale.amount_minor.minor(),
        litres_milli: sale.litres_milli.map(Quantity::milli),
        timestamp: sale.timestamp,
        recorded_by: sale.recorded_by,
    }
}

fn map_payment(payment: engine::CreditPayment) -> CreditPayment {
    CreditPayment {
        id: payment.id,
        customer_id: payment.customer_id,
        station_id: payment.station_id,
        amount_minor: payment.amount_minor.minor(),
        method: map_method(payment.method),
        reference: payment.reference,
        timestamp: payment.timestamp,
        recorded_by: payment.recorded_by,
    }
}

pub async fn customer_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<CustomerNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let mut cmd = NewCustomerCmd::new(payload.name);
    if let Some(phone) = payload.phone {
        cmd = cmd.phone(phone);
    }
    if let Some(limit) = payload.credit_limit_minor {
        cmd = cmd.credit_limit(Money::new(limit));
    }
    let id = state.engine.new_credit_customer(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn customer_get(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Customer>, ServerError> {
    let customer = state
        .engine
        .credit_customer(&principal, customer_id)
        .await?;
    Ok(Json(Customer {
        id: customer.id,
        name: customer.name,
        phone: customer.phone,
        credit_limit_minor: customer.credit_limit_minor.minor(),
        balance_minor: customer.balance_minor.minor(),
        created_at: customer.created_at,
        recent_sales: customer.recent_sales.into_iter().map(map_sale).collect(),
        recent_payments: customer
            .recent_payments
            .into_iter()
            .map(map_payment)
            .collect(),
    }))
}

pub async fn customer_delete(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Path(customer_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_credit_customer(&principal, customer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sale_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<CreditSaleNew>,
) -> Result<(StatusCode, Json<CreditSale>), ServerError> {
    let mut cmd = CreditSaleCmd::new(
        payload.customer_id,
        Money::new(payload.amount_minor),
        utc_or_now(payload.timestamp),
    );
    if let Some(station_id) = payload.station_id {
        cmd = cmd.station_id(station_id);
    }
    if let Some(shift_id) = payload.shift_id {
        cmd = cmd.shift_id(shift_id);
    }
    match (payload.fuel_id, payload.litres_milli) {
        (Some(fuel_id), Some(litres)) => {
            cmd = cmd.fuel(fuel_id, Quantity::from_milli(litres));
        }
        (None, None) => {}
        _ => {
            return Err(ServerError::Generic(
                "fuel_id and litres_milli go together".to_string(),
            ));
        }
    }
    let sale = state.engine.record_credit_sale(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_sale(sale))))
}

pub async fn payment_new(
    Extension(principal): Extension<Principal>,
    State(state): State<ServerState>,
    Json(payload): Json<CreditPaymentNew>,
) -> Result<(StatusCode, Json<CreditPayment>), ServerError> {
    let method = match payload.method {
        PaymentMethod::Cash => engine::PaymentMethod::Cash,
        PaymentMethod::Cheque => engine::PaymentMethod::Cheque,
        PaymentMethod::BankTransfer => engine::PaymentMethod::BankTransfer,
    };
    let mut cmd = CreditPaymentCmd::new(
        payload.customer_id,
        Money::new(payload.amount_minor),
        method,
        utc_or_now(payload.timestamp),
    );
    if let Some(station_id) = payload.station_id {
        cmd = cmd.station_id(station_id);
    }
    if let Some(reference) = payload.reference {
        cmd = cmd.reference(reference);
    }
    let payment = state.engine.record_credit_payment(&principal, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_payment(payment))))
}
