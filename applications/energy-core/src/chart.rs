use chrono::NaiveDateTime;
use serde::Serialize;

use crate::bucket::{Bucket, Resolution};
use crate::error::Result;
use crate::reading::Reading;
use crate::timestamp::label_for;

/// A labeled point ready for a charting surface. Pure reshaping: no numeric
/// transformation happens here. `source_id` is the identifier of the sample
/// the point came from and is empty for gap-filled buckets, which tells the
/// presentation layer to suppress tooltips on estimated data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub power: f64,
    pub voltage: f64,
    pub frequency: f64,
    pub current: f64,
    pub power_factor: f64,
    pub energy: f64,
    pub source_id: String,
}

/// Relabel a bucketed series for bar charts. Labels come from the bucket
/// start: clock time for the rolling view, weekday name for the week view,
/// month+day for the month view, month name for the year view.
pub fn buckets_to_points(buckets: &[Bucket], resolution: Resolution) -> Vec<ChartPoint> {
    buckets
        .iter()
        .map(|bucket| ChartPoint {
            label: bucket_label(bucket.start, resolution),
            power: bucket.metrics.power,
            voltage: bucket.metrics.voltage,
            frequency: bucket.metrics.frequency,
            current: bucket.metrics.current,
            power_factor: bucket.metrics.power_factor,
            energy: bucket.metrics.energy,
            source_id: bucket.source_id.clone().unwrap_or_default(),
        })
        .collect()
}

/// Relabel raw (or downsampled) readings for line charts.
pub fn readings_to_points(readings: &[Reading], resolution: Resolution) -> Result<Vec<ChartPoint>> {
    readings
        .iter()
        .map(|reading| {
            let instant = reading.instant()?;
            Ok(ChartPoint {
                label: label_for(instant, resolution),
                power: reading.power,
                voltage: reading.voltage,
                frequency: reading.frequency,
                current: reading.current,
                power_factor: reading.power_factor,
                energy: reading.energy,
                source_id: reading.id.clone(),
            })
        })
        .collect()
}

fn bucket_label(start: NaiveDateTime, resolution: Resolution) -> String {
    let fmt = match resolution {
        Resolution::Rolling24h => "%H:%M",
        Resolution::Week => "%a",
        Resolution::Month => "%b %-d",
        Resolution::Year => "%b",
    };
    start.format(fmt).to_string()
}
