use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};

use crate::error::Result;
use crate::reading::{AveragedMetrics, Reading};
use crate::timestamp::parse_instant;

/// A reading paired with its decoded capture instant.
pub(crate) type Sample<'a> = (NaiveDateTime, &'a Reading);

/// Decode every identifier and return the samples sorted chronologically.
/// A single malformed identifier fails the whole batch; corruption must
/// surface, not be skipped.
pub(crate) fn parse_samples(readings: &[Reading]) -> Result<Vec<Sample<'_>>> {
    let mut samples = Vec::with_capacity(readings.len());
    for reading in readings {
        samples.push((parse_instant(&reading.id)?, reading));
    }
    samples.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
    Ok(samples)
}

/// Averages over a chronologically sorted, non-empty group.
pub(crate) fn average_sorted(samples: &[Sample<'_>]) -> Option<AveragedMetrics> {
    let (_, first) = samples.first()?;
    let (_, last) = samples.last()?;
    let count = samples.len() as f64;

    let mut sums = AveragedMetrics::default();
    for (_, r) in samples {
        sums.power += r.power;
        sums.voltage += r.voltage;
        sums.frequency += r.frequency;
        sums.current += r.current;
        sums.power_factor += r.power_factor;
    }

    Some(AveragedMetrics {
        power: sums.power / count,
        voltage: sums.voltage / count,
        frequency: sums.frequency / count,
        current: sums.current / count,
        power_factor: sums.power_factor / count,
        // The counter only ever grows; a negative delta means a rollback or
        // device reset and is clamped to zero, never reported.
        energy: (last.energy - first.energy).max(0.0),
    })
}

/// Arithmetic means of the instantaneous metrics plus the clamped
/// consumption delta for the group. `None` on an empty group; callers are
/// expected to take the gap-fill path instead.
pub fn average(readings: &[Reading]) -> Result<Option<AveragedMetrics>> {
    let samples = parse_samples(readings)?;
    Ok(average_sorted(&samples))
}

/// Collapse a 15-minute stream to one averaged reading per calendar hour.
/// Instantaneous metrics are hour-local means; `energy` keeps the last
/// counter value of the hour and `id` the first member's identifier.
pub fn downsample_hourly(readings: &[Reading]) -> Result<Vec<Reading>> {
    downsample_by(readings, |instant| {
        instant
            .date()
            .and_hms_opt(instant.hour(), 0, 0)
            .unwrap_or(instant)
    })
}

/// Same as `downsample_hourly` but per calendar day.
pub fn downsample_daily(readings: &[Reading]) -> Result<Vec<Reading>> {
    downsample_by(readings, |instant| {
        instant.date().and_hms_opt(0, 0, 0).unwrap_or(instant)
    })
}

fn downsample_by(
    readings: &[Reading],
    key: impl Fn(NaiveDateTime) -> NaiveDateTime,
) -> Result<Vec<Reading>> {
    let samples = parse_samples(readings)?;

    let mut groups: BTreeMap<NaiveDateTime, Vec<Sample<'_>>> = BTreeMap::new();
    for sample in samples {
        groups.entry(key(sample.0)).or_default().push(sample);
    }

    let mut out = Vec::with_capacity(groups.len());
    for group in groups.values() {
        let Some(metrics) = average_sorted(group) else {
            continue;
        };
        let (_, first) = group[0];
        let (_, last) = group[group.len() - 1];
        out.push(Reading {
            id: first.id.clone(),
            power: metrics.power,
            voltage: metrics.voltage,
            frequency: metrics.frequency,
            current: metrics.current,
            power_factor: metrics.power_factor,
            energy: last.energy,
        });
    }
    Ok(out)
}
