use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, charts, devices, logs, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/devices", get(devices::list).post(devices::attach))
        .route("/api/v1/devices/{device_id}", delete(devices::detach))
        .route("/api/v1/devices/{device_id}/name", put(devices::rename))
        .route("/api/v1/devices/{device_id}/limit", put(devices::set_limit))
        .route("/api/v1/devices/{device_id}/power", put(devices::set_power))
        .route("/api/v1/devices/{device_id}/chart", get(charts::chart))
        .route("/api/v1/devices/{device_id}/stats", get(charts::stats))
        .route("/api/v1/devices/{device_id}/logs", get(logs::list))
        .route("/api/v1/summary", get(charts::summary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
