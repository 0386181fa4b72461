use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::average::{average_sorted, parse_samples, Sample};
use crate::error::Result;
use crate::reading::{AveragedMetrics, Reading};

/// Charting granularity. Governs both the fixed bucket count and the
/// anchoring rule: `Rolling24h` anchors to the latest sample, the calendar
/// resolutions anchor to the `as_of` instant passed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Rolling24h,
    Week,
    Month,
    Year,
}

impl Resolution {
    /// Output cardinality is fixed per resolution, independent of the input.
    pub fn bucket_count(self) -> usize {
        match self {
            Resolution::Rolling24h => 24,
            Resolution::Week => 7,
            Resolution::Month => 30,
            Resolution::Year => 12,
        }
    }
}

/// A fixed half-open time span `[start, end)` with the derived metrics of
/// the readings that fell inside it. `source_id` carries the first member's
/// identifier; gap-filled buckets have none, which downstream uses to
/// suppress tooltips on estimated data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub metrics: AveragedMetrics,
    pub sample_count: usize,
    pub source_id: Option<String>,
    pub estimated: bool,
}

/// Partition a reading stream into the resolution's fixed bucket sequence,
/// chronologically ascending.
///
/// Readings whose instant falls outside the covered span are ignored; every
/// reading inside lands in exactly one bucket. Buckets with no members keep
/// their span and position: instantaneous metrics are zeroed and the energy
/// value is the stream-wide per-day consumption baseline, so charts show an
/// estimate instead of a hard zero for missing telemetry.
pub fn bucketize(
    readings: &[Reading],
    resolution: Resolution,
    as_of: NaiveDateTime,
) -> Result<Vec<Bucket>> {
    let samples = parse_samples(readings)?;
    let spans = spans_for(resolution, &samples, as_of);
    let fallback = daily_consumption_baseline(&samples);

    let mut buckets = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        let lo = samples.partition_point(|(t, _)| *t < start);
        let hi = samples.partition_point(|(t, _)| *t < end);
        let members = &samples[lo..hi];

        if let Some(mut metrics) = average_sorted(members) {
            if resolution == Resolution::Year {
                // Yearly input is one sample per day; a single first/last
                // delta would hide intra-month counter rollbacks. Sum the
                // per-day deltas, each clamped, instead.
                metrics.energy = summed_daily_deltas(members);
            }
            buckets.push(Bucket {
                start,
                end,
                metrics,
                sample_count: members.len(),
                source_id: Some(members[0].1.id.clone()),
                estimated: false,
            });
        } else {
            buckets.push(Bucket {
                start,
                end,
                metrics: AveragedMetrics {
                    energy: fallback,
                    ..AveragedMetrics::default()
                },
                sample_count: 0,
                source_id: None,
                estimated: true,
            });
        }
    }
    Ok(buckets)
}

fn spans_for(
    resolution: Resolution,
    samples: &[Sample<'_>],
    as_of: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    match resolution {
        Resolution::Rolling24h => {
            // Rolling window: backward from the latest sample's hour, not
            // from wall-clock now. Empty input falls back to `as_of`.
            let latest = samples.last().map(|(t, _)| *t).unwrap_or(as_of);
            let end = truncate_to_hour(latest) + Duration::hours(1);
            (0..24i64)
                .rev()
                .map(|i| (end - Duration::hours(i + 1), end - Duration::hours(i)))
                .collect()
        }
        Resolution::Week => day_spans(as_of.date(), 7),
        Resolution::Month => day_spans(as_of.date(), 30),
        Resolution::Year => month_spans(as_of.date(), 12),
    }
}

fn day_spans(end_day: NaiveDate, count: i64) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    (0..count)
        .rev()
        .map(|i| {
            let day = end_day - Duration::days(i);
            (
                day.and_time(NaiveTime::MIN),
                (day + Duration::days(1)).and_time(NaiveTime::MIN),
            )
        })
        .collect()
}

fn month_spans(end_day: NaiveDate, count: i32) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let end_index = end_day.year() * 12 + end_day.month0() as i32;
    (0..count)
        .rev()
        .map(|i| {
            let index = end_index - i;
            (
                month_start(index).and_time(NaiveTime::MIN),
                month_start(index + 1).and_time(NaiveTime::MIN),
            )
        })
        .collect()
}

/// First day of the month at absolute month index `year * 12 + month0`.
fn month_start(index: i32) -> NaiveDate {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn truncate_to_hour(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .date()
        .and_hms_opt(instant.hour(), 0, 0)
        .unwrap_or(instant)
}

/// Last counter value per calendar day, in date order.
fn day_last_counters(samples: &[Sample<'_>]) -> BTreeMap<NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for (instant, reading) in samples {
        // Samples are sorted ascending, so the last write per day wins.
        days.insert(instant.date(), reading.energy);
    }
    days
}

/// Sum of day-over-day counter deltas within a bucket, each clamped
/// non-negative.
fn summed_daily_deltas(members: &[Sample<'_>]) -> f64 {
    let counters: Vec<f64> = day_last_counters(members).into_values().collect();
    counters
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .sum()
}

/// Gap-fill estimate: the mean of the positive per-day consumption deltas
/// (last minus first counter within each day) across every day present in
/// the input. Zero when no day shows positive consumption.
fn daily_consumption_baseline(samples: &[Sample<'_>]) -> f64 {
    let mut day_bounds: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for (instant, reading) in samples {
        day_bounds
            .entry(instant.date())
            .and_modify(|(_, last)| *last = reading.energy)
            .or_insert((reading.energy, reading.energy));
    }

    let mut sum = 0.0;
    let mut count = 0u32;
    for (first, last) in day_bounds.values() {
        let delta = last - first;
        if delta > 0.0 {
            sum += delta;
            count += 1;
        }
    }
    if count > 0 {
        sum / f64::from(count)
    } else {
        0.0
    }
}
