use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use energy_core::Reading;

/// Store client for the alert worker: the device table, the trailing
/// daily-feed readings per device, and the Telegram chat registry under
/// `telegram_chats/`. Only complete reading records reach the threshold
/// check; partial uploads are skipped.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub name: Option<String>,
    #[serde(rename = "energyLimit", default)]
    pub energy_limit: f64,
}

/// One registered Telegram chat. `first_seen` is written once at
/// registration; `/stop` only flips `active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    #[serde(default)]
    pub username: Option<String>,
    pub first_seen: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RawReading {
    power: Option<f64>,
    voltage: Option<f64>,
    frequency: Option<f64>,
    current: Option<f64>,
    #[serde(rename = "powerFactor")]
    power_factor: Option<f64>,
    energy: Option<f64>,
}

impl StoreClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let value = self
            .http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
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

    /// All known devices keyed by id.
    pub async fn fetch_devices(&self) -> Result<BTreeMap<String, DeviceRecord>> {
        let devices: Option<BTreeMap<String, DeviceRecord>> = self.get_json("devices").await?;
        Ok(devices.unwrap_or_default())
    }

    /// Chat ids that should receive alerts. Chats survive worker restarts
    /// because registration lives here, not in process memory.
    pub async fn fetch_active_chats(&self) -> Result<Vec<i64>> {
        let chats: Option<BTreeMap<String, ChatRecord>> =
            self.get_json("telegram_chats").await?;
        Ok(active_chat_ids(&chats.unwrap_or_default()))
    }

    /// Register a chat, or reactivate it if it already exists. The
    /// original `first_seen` is kept on re-registration.
    pub async fn register_chat(
        &self,
        chat_id: i64,
        username: Option<&str>,
        first_seen: &str,
    ) -> Result<()> {
        let path = format!("telegram_chats/{chat_id}");
        let existing: Option<ChatRecord> = self.get_json(&path).await?;
        match existing {
            Some(_) => self.put_json(&format!("{path}/active"), &true).await,
            None => {
                self.put_json(
                    &path,
                    &ChatRecord {
                        username: username.map(str::to_string),
                        first_seen: first_seen.to_string(),
                        active: true,
                    },
                )
                .await
            }
        }
    }

    pub async fn deactivate_chat(&self, chat_id: i64) -> Result<()> {
        self.put_json(&format!("telegram_chats/{chat_id}/active"), &false)
            .await
    }

    /// Last acknowledged `getUpdates` offset, persisted so a restart does
    /// not replay or lose already-handled commands.
    pub async fn fetch_updates_offset(&self) -> Result<Option<i64>> {
        self.get_json("telegram_state/updates_offset").await
    }

    pub async fn store_updates_offset(&self, offset: i64) -> Result<()> {
        self.put_json("telegram_state/updates_offset", &offset).await
    }

    /// Trailing daily-feed readings for one device, oldest first.
    pub async fn fetch_daily_readings(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>> {
        let records: Option<BTreeMap<String, RawReading>> = self
            .http
            .get(self.url(&format!("readings_daily/{device_id}")))
            .query(&[
                ("orderBy", "\"$key\"".to_string()),
                ("limitToLast", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let readings = records
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(id, raw)| {
                let complete = [
                    raw.power,
                    raw.voltage,
                    raw.frequency,
                    raw.current,
                    raw.power_factor,
                    raw.energy,
                ]
                .iter()
                .all(|v| v.is_some_and(f64::is_finite));

                if !complete {
                    warn!(device_id = %device_id, record_id = %id, "skipping incomplete reading record");
                    return None;
                }

                Some(Reading {
                    id,
                    power: raw.power.unwrap_or_default(),
                    voltage: raw.voltage.unwrap_or_default(),
                    frequency: raw.frequency.unwrap_or_default(),
                    current: raw.current.unwrap_or_default(),
                    power_factor: raw.power_factor.unwrap_or_default().clamp(0.0, 1.0),
                    energy: raw.energy.unwrap_or_default(),
                })
            })
            .collect();

        Ok(readings)
    }
}

pub(crate) fn active_chat_ids(chats: &BTreeMap<String, ChatRecord>) -> Vec<i64> {
    chats
        .iter()
        .filter(|(_, record)| record.active)
        .filter_map(|(id, _)| id.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chat(username: &str, active: bool) -> ChatRecord {
        ChatRecord {
            username: Some(username.to_string()),
            first_seen: "2025-06-15T12:00:00+00:00".to_string(),
            active,
        }
    }

    #[test]
    fn only_active_chats_receive_alerts() {
        let mut chats = BTreeMap::new();
        chats.insert("100".to_string(), chat("alice", true));
        chats.insert("200".to_string(), chat("bob", false));
        chats.insert("300".to_string(), chat("carol", true));

        assert_eq!(active_chat_ids(&chats), vec![100, 300]);
    }

    #[test]
    fn unparsable_chat_keys_are_skipped() {
        let mut chats = BTreeMap::new();
        chats.insert("not-a-number".to_string(), chat("x", true));
        chats.insert("42".to_string(), chat("y", true));

        assert_eq!(active_chat_ids(&chats), vec![42]);
    }

    #[test]
    fn chat_record_round_trips_store_field_names() {
        let json = r#"{"username":"alice","firstSeen":"2025-06-15T12:00:00+00:00","active":true}"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.username.as_deref(), Some("alice"));
        assert!(record.active);
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }
}

