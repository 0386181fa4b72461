use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::error::Result;
use crate::handlers::AppState;
use crate::models::{ChartQuery, ChartResponse, StatsResponse, SummaryResponse, UserQuery};

pub async fn chart(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>> {
    let points = state
        .charts
        .chart(&device_id, query.range, query.metric)
        .await?;
    Ok(Json(ChartResponse {
        device_id,
        range: query.range,
        metric: query.metric,
        points,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<StatsResponse>> {
    let stats = state.charts.stats(&device_id).await?;
    Ok(Json(StatsResponse { device_id, stats }))
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<SummaryResponse>> {
    let response = state.summary.summary(&query.user_id).await?;
    Ok(Json(response))
}
