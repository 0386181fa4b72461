pub mod charts;
pub mod devices;
pub mod logs;

use axum::{http::StatusCode, response::Json};

use crate::services::{ChartService, DeviceService, LogService, SummaryService};

#[derive(Clone)]
pub struct AppState {
    pub devices: DeviceService,
    pub charts: ChartService,
    pub summary: SummaryService,
    pub logs: LogService,
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}
