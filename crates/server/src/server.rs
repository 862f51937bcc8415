use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use tower_http::trace::TraceLayer;

use std::{net::SocketAddr, sync::Arc};

use crate::{credit, deliveries, prices, safe, settings, setup, shifts, shop};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let principal = match state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
    {
        Ok(principal) => principal,
        Err(EngineError::KeyNotFound(_)) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!("authentication failed: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    let api = Router::new()
        .route("/stations", post(setup::station_new))
        .route("/fuels", post(setup::fuel_new))
        .route("/tanks", post(setup::tank_new))
        .route("/nozzles", post(setup::nozzle_new))
        .route("/nozzles/{id}/last-reading", get(setup::last_reading))
        .route("/pumpers", post(setup::pumper_new))
        .route(
            "/deliveries",
            get(deliveries::list).post(deliveries::delivery_new),
        )
        .route("/deliveries/{id}", get(deliveries::get))
        .route("/deliveries/{id}/verify", post(deliveries::verify))
        .route("/prices", post(prices::price_new))
        .route("/prices/effective", get(prices::effective))
        .route(
            "/settings/tolerance",
            get(settings::get_tolerance).put(settings::set_tolerance),
        )
        .route("/shifts", get(shifts::list).post(shifts::open))
        .route("/shifts/bulk-close", post(shifts::bulk_close))
        .route("/shifts/{id}", get(shifts::get))
        .route("/shifts/{id}/assignments", post(shifts::assign))
        .route(
            "/shifts/{id}/assignments/{assignment_id}/close",
            post(shifts::close_assignment),
        )
        .route("/shifts/{id}/test-pours", post(shifts::test_pour))
        .route("/shifts/{id}/stats", get(shifts::statistics))
        .route("/shifts/{id}/close", post(shifts::close))
        .route("/safe", get(safe::get))
        .route("/safe/balance", post(safe::opening_balance))
        .route(
            "/safe/transactions",
            get(safe::list_transactions).post(safe::transaction_new),
        )
        .route("/safe/reconcile", get(safe::reconcile))
        .route("/safe/recompute", post(safe::recompute))
        .route("/safe/pending", get(safe::pending_deposits))
        .route("/shop/products", post(shop::product_new))
        .route("/shop/purchases", post(shop::purchase_new))
        .route("/shop/assignments", post(shop::assignment_new))
        .route("/shop/assignments/{id}/stock", post(shop::stock_add))
        .route("/shop/assignments/{id}", post(shop::assignment_close))
        .route("/shop/wastage", post(shop::wastage_new))
        .route("/credit/customers", post(credit::customer_new))
        .route(
            "/credit/customers/{id}",
            get(credit::customer_get).delete(credit::customer_delete),
        )
        .route("/credit/sales", post(credit::sale_new))
        .route("/credit/payments", post(credit::payment_new))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
