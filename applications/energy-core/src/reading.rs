use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timestamp::parse_instant;

/// One immutable sample as consumed from the store.
///
/// The identifier is the sole temporal key: its digits encode the capture
/// instant (see `timestamp::parse_instant`). `energy` is the device's
/// lifetime kWh counter, monotonically non-decreasing; consumption over an
/// interval is the difference between two counter values, never the counter
/// itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub power: f64,
    pub voltage: f64,
    pub frequency: f64,
    pub current: f64,
    pub power_factor: f64,
    pub energy: f64,
}

impl Reading {
    /// Capture instant decoded from the identifier.
    pub fn instant(&self) -> Result<NaiveDateTime> {
        parse_instant(&self.id)
    }
}

/// Per-group output of the metric averager. All fields except `energy` are
/// arithmetic means; `energy` is a consumption delta in kWh, clamped to be
/// non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub power: f64,
    pub voltage: f64,
    pub frequency: f64,
    pub current: f64,
    pub power_factor: f64,
    pub energy: f64,
}
