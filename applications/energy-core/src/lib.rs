//! Pure aggregation core for the energy-monitoring dashboard.
//!
//! Everything in this crate is synchronous and side-effect free: it takes
//! an in-memory snapshot of device readings, never mutates its input, and
//! returns fresh output sequences. Fetching, caching and serving the data
//! belong to the surrounding applications.

pub mod average;
pub mod bucket;
pub mod chart;
pub mod error;
pub mod reading;
pub mod rollup;
pub mod timestamp;

pub use average::{average, downsample_daily, downsample_hourly};
pub use bucket::{bucketize, Bucket, Resolution};
pub use chart::{buckets_to_points, readings_to_points, ChartPoint};
pub use error::{CoreError, Result};
pub use reading::{AveragedMetrics, Reading};
pub use rollup::{
    energy_stats, pie_distribution, rank_devices, DeviceSeries, EnergyStats, PieSlice,
    RankingItem, RankingMetric,
};
pub use timestamp::{encode_instant, format_full_datetime, format_label, parse_instant, Precision};
