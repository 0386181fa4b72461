use chrono::{NaiveDateTime, Utc};

use energy_core::{
    bucketize, buckets_to_points, downsample_daily, downsample_hourly, energy_stats,
    readings_to_points, ChartPoint, EnergyStats, Reading,
};

use crate::error::Result;
use crate::models::{ChartMetric, TimeRange};
use crate::subscription::SubscriptionCache;

/// Serves chart series and per-device stats from live feed snapshots.
#[derive(Clone)]
pub struct ChartService {
    cache: SubscriptionCache,
}

impl ChartService {
    pub fn new(cache: SubscriptionCache) -> Self {
        Self { cache }
    }

    pub async fn chart(
        &self,
        device_id: &str,
        range: TimeRange,
        metric: ChartMetric,
    ) -> Result<Vec<ChartPoint>> {
        let snapshot = self
            .cache
            .snapshot((device_id.to_string(), range))
            .await?;
        let points = build_points(&snapshot, range, metric, Utc::now().naive_utc())?;
        Ok(points)
    }

    /// Month-level consumption rollup. Reads the yearly feed, which holds
    /// one sample per day and therefore spans whole months.
    pub async fn stats(&self, device_id: &str) -> Result<EnergyStats> {
        let snapshot = self
            .cache
            .snapshot((device_id.to_string(), TimeRange::Y1))
            .await?;
        let stats = energy_stats(&snapshot, Utc::now().naive_utc())?;
        Ok(stats)
    }
}

/// Pure series assembly, split out so it can be tested without a store.
///
/// Energy is consumption per bucket and is always served as a bucketed
/// bar series. Every other metric is an instantaneous line series: raw
/// samples for the 24h and 1y windows, downsampled to hourly or daily
/// means for the wider windows so the payload stays bounded.
pub(crate) fn build_points(
    readings: &[Reading],
    range: TimeRange,
    metric: ChartMetric,
    as_of: NaiveDateTime,
) -> energy_core::Result<Vec<ChartPoint>> {
    let resolution = range.resolution();

    if metric == ChartMetric::Energy {
        let buckets = bucketize(readings, resolution, as_of)?;
        return Ok(buckets_to_points(&buckets, resolution));
    }

    match range {
        TimeRange::H24 | TimeRange::Y1 => readings_to_points(readings, resolution),
        TimeRange::D7 => readings_to_points(&downsample_hourly(readings)?, resolution),
        TimeRange::M1 => readings_to_points(&downsample_daily(readings)?, resolution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use energy_core::{encode_instant, Precision};
    use pretty_assertions::assert_eq;

    fn readings(start: NaiveDateTime, count: usize, step_minutes: i64) -> Vec<Reading> {
        (0..count)
            .map(|i| {
                let t = start + Duration::minutes(step_minutes * i as i64);
                Reading {
                    id: encode_instant(t, Precision::Second),
                    power: 42.0,
                    voltage: 230.0,
                    frequency: 50.0,
                    current: 0.18,
                    power_factor: 0.9,
                    energy: 100.0 + i as f64 * 0.01,
                }
            })
            .collect()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn energy_series_has_fixed_bucket_cardinality() {
        let input = readings(at(2025, 6, 14, 12), 288, 5);
        let points =
            build_points(&input, TimeRange::H24, ChartMetric::Energy, at(2025, 6, 16, 0)).unwrap();
        assert_eq!(points.len(), 24);
    }

    #[test]
    fn week_lines_are_downsampled_to_hours() {
        // Two days at 5-minute spacing: 576 samples become 48 hourly means.
        let input = readings(at(2025, 6, 10, 0), 576, 5);
        let points =
            build_points(&input, TimeRange::D7, ChartMetric::Power, at(2025, 6, 12, 0)).unwrap();
        assert_eq!(points.len(), 48);
        assert_eq!(points[0].power, 42.0);
    }

    #[test]
    fn month_lines_are_downsampled_to_days() {
        let input = readings(at(2025, 6, 10, 0), 576, 5);
        let points =
            build_points(&input, TimeRange::M1, ChartMetric::Voltage, at(2025, 6, 12, 0))
                .unwrap();
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn day_lines_keep_raw_samples() {
        let input = readings(at(2025, 6, 15, 0), 96, 15);
        let points =
            build_points(&input, TimeRange::H24, ChartMetric::Current, at(2025, 6, 16, 0))
                .unwrap();
        assert_eq!(points.len(), 96);
    }
}
