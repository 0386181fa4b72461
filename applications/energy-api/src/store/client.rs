use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use energy_core::{parse_instant, Reading};

use crate::config::StoreConfig;
use crate::error::{AppError, Result};
use crate::models::{Device, LogEntry};
use crate::store::records::{validate_reading, RawDeviceRecord, RawLogRecord, RawReadingRecord};
use crate::store::Feed;

/// Thin typed client over the store's REST tree. One instance is shared
/// across the whole application; `reqwest::Client` already pools
/// connections internally.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?;

        // The store answers `null` for absent paths rather than 404.
        Ok(response.json().await?)
    }

    async fn put_json<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<()> {
        self.http
            .put(self.url(path))
            .json(value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.http
            .delete(self.url(path))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch up to `limit` trailing readings of one feed for one device.
    /// Records failing validation are dropped here and never reach the
    /// aggregation core.
    pub async fn fetch_readings(
        &self,
        device_id: &str,
        feed: Feed,
        limit: usize,
    ) -> Result<Vec<Reading>> {
        let response = self
            .http
            .get(self.url(&format!("{}/{}", feed.path(), device_id)))
            .query(&[
                ("orderBy", "\"$key\"".to_string()),
                ("limitToLast", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        // BTreeMap keeps records in key order, which is timestamp order.
        let records: Option<BTreeMap<String, RawReadingRecord>> = response.json().await?;
        let records = records.unwrap_or_default();

        let total = records.len();
        let readings: Vec<Reading> = records
            .iter()
            .filter_map(|(id, raw)| validate_reading(id, raw))
            .collect();

        let skipped = total - readings.len();
        if skipped > 0 {
            warn!(
                device_id,
                feed = feed.path(),
                skipped,
                "dropped incomplete reading records"
            );
        }
        debug!(device_id, feed = feed.path(), count = readings.len(), "fetched readings");

        Ok(readings)
    }

    pub async fn fetch_device(&self, device_id: &str) -> Result<Device> {
        let record: Option<RawDeviceRecord> =
            self.get_json(&format!("devices/{device_id}")).await?;

        let record = record
            .ok_or_else(|| AppError::NotFound(format!("Device not found: {device_id}")))?;

        Ok(Device {
            id: device_id.to_string(),
            name: record.name.unwrap_or_else(|| device_id.to_string()),
            is_on: record.is_on,
            energy_limit: record.energy_limit,
        })
    }

    /// All devices attached to a user, with the per-user display name.
    /// A device whose metadata fails to load is skipped with a warning
    /// so one broken record cannot blank the whole dashboard.
    pub async fn fetch_user_devices(&self, user_id: &str) -> Result<Vec<Device>> {
        let attachments: Option<BTreeMap<String, String>> =
            self.get_json(&format!("users/{user_id}/devices")).await?;

        let mut devices = Vec::new();
        for (device_id, name) in attachments.unwrap_or_default() {
            match self.fetch_device(&device_id).await {
                Ok(mut device) => {
                    device.name = name;
                    devices.push(device);
                }
                Err(e) => {
                    warn!(user_id, device_id = %device_id, "skipping device with unreadable metadata: {e}");
                }
            }
        }

        Ok(devices)
    }

    pub async fn attach_device(
        &self,
        user_id: &str,
        device_id: &str,
        name: &str,
    ) -> Result<()> {
        // Refuse to attach ids the plugs have never reported under.
        self.fetch_device(device_id).await?;

        self.put_json(&format!("users/{user_id}/devices/{device_id}"), name)
            .await?;
        self.put_json(&format!("devices/{device_id}/user_ids/{user_id}"), &true)
            .await?;
        Ok(())
    }

    pub async fn rename_device(&self, user_id: &str, device_id: &str, name: &str) -> Result<()> {
        let current: Option<String> = self
            .get_json(&format!("users/{user_id}/devices/{device_id}"))
            .await?;
        if current.is_none() {
            return Err(AppError::NotFound(format!(
                "Device not attached to user: {device_id}"
            )));
        }

        self.put_json(&format!("users/{user_id}/devices/{device_id}"), name)
            .await
    }

    pub async fn detach_device(&self, user_id: &str, device_id: &str) -> Result<()> {
        self.delete(&format!("users/{user_id}/devices/{device_id}"))
            .await?;
        self.delete(&format!("devices/{device_id}/user_ids/{user_id}"))
            .await
    }

    pub async fn set_energy_limit(&self, device_id: &str, limit: f64) -> Result<()> {
        self.fetch_device(device_id).await?;
        self.put_json(&format!("devices/{device_id}/energyLimit"), &limit)
            .await
    }

    pub async fn set_power_state(&self, device_id: &str, on: bool) -> Result<()> {
        self.fetch_device(device_id).await?;
        self.put_json(&format!("devices/{device_id}/isOn"), &on).await
    }

    /// Event log entries for one device, newest last. Record ids double
    /// as timestamps; a malformed id is corrupt data and surfaces as an
    /// error rather than being silently skipped.
    pub async fn fetch_device_logs(&self, device_id: &str, limit: usize) -> Result<Vec<LogEntry>> {
        let response = self
            .http
            .get(self.url(&format!("logs/{device_id}")))
            .query(&[
                ("orderBy", "\"$key\"".to_string()),
                ("limitToLast", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let records: Option<BTreeMap<String, RawLogRecord>> = response.json().await?;

        records
            .unwrap_or_default()
            .into_iter()
            .map(|(id, raw)| {
                let timestamp = parse_instant(&id)?;
                Ok(LogEntry {
                    id,
                    title: raw.title.unwrap_or_default(),
                    content: raw.content.unwrap_or_default(),
                    timestamp,
                })
            })
            .collect()
    }
}
