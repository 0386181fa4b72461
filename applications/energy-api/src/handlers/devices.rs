use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::error::Result;
use crate::handlers::AppState;
use crate::models::{
    AttachDeviceRequest, DeviceListResponse, EnergyLimitRequest, MessageResponse,
    PowerStateRequest, RenameDeviceRequest, UserQuery,
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DeviceListResponse>> {
    let data = state.devices.list(&query.user_id).await?;
    Ok(Json(DeviceListResponse { data }))
}

pub async fn attach(
    State(state): State<AppState>,
    Json(request): Json<AttachDeviceRequest>,
) -> Result<Json<MessageResponse>> {
    state.devices.attach(&request).await?;
    Ok(Json(MessageResponse {
        message: format!("Device {} attached", request.device_id),
    }))
}

pub async fn rename(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<RenameDeviceRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .devices
        .rename(&request.user_id, &device_id, &request.name)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Device {device_id} renamed"),
    }))
}

pub async fn detach(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<MessageResponse>> {
    state.devices.detach(&query.user_id, &device_id).await?;
    Ok(Json(MessageResponse {
        message: format!("Device {device_id} detached"),
    }))
}

pub async fn set_limit(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<EnergyLimitRequest>,
) -> Result<Json<MessageResponse>> {
    state.devices.set_limit(&device_id, request.limit).await?;
    Ok(Json(MessageResponse {
        message: format!("Energy limit set to {}", request.limit),
    }))
}

pub async fn set_power(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<PowerStateRequest>,
) -> Result<Json<MessageResponse>> {
    state.devices.set_power(&device_id, request.on).await?;
    Ok(Json(MessageResponse {
        message: format!(
            "Device {device_id} switched {}",
            if request.on { "on" } else { "off" }
        ),
    }))
}
