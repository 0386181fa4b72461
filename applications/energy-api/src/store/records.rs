use serde::Deserialize;
use tracing::warn;

use energy_core::Reading;

/// Raw reading record as it sits in the store. Devices occasionally
/// upload partial records, so every field is optional here and checked
/// by `validate_reading` before anything downstream sees it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReadingRecord {
    pub power: Option<f64>,
    pub voltage: Option<f64>,
    pub frequency: Option<f64>,
    pub current: Option<f64>,
    #[serde(rename = "powerFactor")]
    pub power_factor: Option<f64>,
    pub energy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeviceRecord {
    pub name: Option<String>,
    #[serde(rename = "isOn", default)]
    pub is_on: bool,
    #[serde(rename = "energyLimit", default)]
    pub energy_limit: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLogRecord {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Quarantine gate between the store and the aggregation core.
///
/// A record with any metric missing or non-finite is dropped as a whole;
/// power factor is the one field that gets repaired instead, clamped into
/// [0, 1], since plugs are known to report transient values slightly
/// above 1 during load spikes.
pub fn validate_reading(id: &str, raw: &RawReadingRecord) -> Option<Reading> {
    let fields = [
        ("power", raw.power),
        ("voltage", raw.voltage),
        ("frequency", raw.frequency),
        ("current", raw.current),
        ("powerFactor", raw.power_factor),
        ("energy", raw.energy),
    ];

    for (name, value) in fields {
        match value {
            Some(v) if v.is_finite() => {}
            _ => {
                warn!(record_id = id, field = name, "skipping incomplete reading record");
                return None;
            }
        }
    }

    Some(Reading {
        id: id.to_string(),
        power: raw.power.unwrap_or_default(),
        voltage: raw.voltage.unwrap_or_default(),
        frequency: raw.frequency.unwrap_or_default(),
        current: raw.current.unwrap_or_default(),
        power_factor: raw.power_factor.unwrap_or_default().clamp(0.0, 1.0),
        energy: raw.energy.unwrap_or_default(),
    })
}
