use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AttachDeviceRequest, Device};
use crate::store::StoreClient;

/// Device attachment and control operations.
#[derive(Clone)]
pub struct DeviceService {
    store: Arc<StoreClient>,
}

impl DeviceService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Device>> {
        require_id("user_id", user_id)?;
        self.store.fetch_user_devices(user_id).await
    }

    pub async fn attach(&self, request: &AttachDeviceRequest) -> Result<()> {
        require_id("user_id", &request.user_id)?;
        require_id("device_id", &request.device_id)?;
        require_name(&request.name)?;
        self.store
            .attach_device(&request.user_id, &request.device_id, request.name.trim())
            .await
    }

    pub async fn rename(&self, user_id: &str, device_id: &str, name: &str) -> Result<()> {
        require_id("user_id", user_id)?;
        require_id("device_id", device_id)?;
        require_name(name)?;
        self.store.rename_device(user_id, device_id, name.trim()).await
    }

    pub async fn detach(&self, user_id: &str, device_id: &str) -> Result<()> {
        require_id("user_id", user_id)?;
        require_id("device_id", device_id)?;
        self.store.detach_device(user_id, device_id).await
    }

    pub async fn set_limit(&self, device_id: &str, limit: f64) -> Result<()> {
        require_id("device_id", device_id)?;
        if !limit.is_finite() || limit < 0.0 {
            return Err(AppError::Validation(format!(
                "Energy limit must be a non-negative number, got: {limit}"
            )));
        }
        self.store.set_energy_limit(device_id, limit).await
    }

    pub async fn set_power(&self, device_id: &str, on: bool) -> Result<()> {
        require_id("device_id", device_id)?;
        self.store.set_power_state(device_id, on).await
    }
}

fn require_id(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "Device name cannot be empty".to_string(),
        ));
    }
    Ok(())
}
