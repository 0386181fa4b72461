use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::error::Result;
use crate::handlers::AppState;
use crate::models::{LogsQuery, LogsResponse};

pub async fn list(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>> {
    let logs = state.logs.logs(&device_id, &query).await?;
    Ok(Json(LogsResponse { device_id, logs }))
}
