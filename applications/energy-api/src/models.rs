use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use energy_core::{ChartPoint, EnergyStats, PieSlice, RankingItem, Resolution};

use crate::store::Feed;

/// Chart window selected by the dashboard.
///
/// Each range pins down three things at once: which store feed to read,
/// how many trailing samples to ask for, and the bucket resolution used
/// for bar charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "1y")]
    Y1,
}

impl TimeRange {
    pub fn feed(self) -> Feed {
        match self {
            TimeRange::H24 => Feed::Daily,
            TimeRange::D7 | TimeRange::M1 => Feed::Weekly,
            TimeRange::Y1 => Feed::Yearly,
        }
    }

    /// Trailing sample budget requested from the store.
    ///
    /// 288 = one day of 5-minute samples, 2016 = one week, 8640 = thirty
    /// days, 365 = one year of daily samples.
    pub fn sample_budget(self) -> usize {
        match self {
            TimeRange::H24 => 288,
            TimeRange::D7 => 2016,
            TimeRange::M1 => 8640,
            TimeRange::Y1 => 365,
        }
    }

    pub fn resolution(self) -> Resolution {
        match self {
            TimeRange::H24 => Resolution::Rolling24h,
            TimeRange::D7 => Resolution::Week,
            TimeRange::M1 => Resolution::Month,
            TimeRange::Y1 => Resolution::Year,
        }
    }
}

/// Metric plotted on line charts. Energy is special-cased by the chart
/// service: it is served as bucketed consumption rather than raw counter
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ChartMetric {
    Power,
    Voltage,
    Frequency,
    Current,
    PowerFactor,
    #[default]
    Energy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub is_on: bool,
    pub energy_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

// Request payloads

#[derive(Debug, Deserialize)]
pub struct AttachDeviceRequest {
    pub user_id: String,
    pub device_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameDeviceRequest {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EnergyLimitRequest {
    pub limit: f64,
}

#[derive(Debug, Deserialize)]
pub struct PowerStateRequest {
    pub on: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub range: TimeRange,
    #[serde(default)]
    pub metric: ChartMetric,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<usize>,
}

// Response payloads

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub data: Vec<Device>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub device_id: String,
    pub range: TimeRange,
    pub metric: ChartMetric,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub device_id: String,
    pub stats: EnergyStats,
}

#[derive(Debug, Serialize)]
pub struct RankingList {
    pub title: String,
    pub unit: String,
    pub items: Vec<RankingItem>,
}

#[derive(Debug, Serialize)]
pub struct PieCard {
    pub title: String,
    pub unit: String,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub rankings: Vec<RankingList>,
    pub distributions: Vec<PieCard>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub device_id: String,
    pub logs: Vec<LogEntry>,
}
