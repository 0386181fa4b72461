use std::cmp::Ordering;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::average::{parse_samples, Sample};
use crate::error::Result;
use crate::reading::Reading;

/// Home-dashboard scalars for one device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyStats {
    pub current_month: f64,
    pub last_month: f64,
    pub total: f64,
    pub average_power_factor: f64,
    pub latest_power: f64,
    pub latest_voltage: f64,
    pub latest_current: f64,
}

/// Which scalar a ranking or pie view orders devices by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    CurrentMonth,
    LastMonth,
    Total,
    PowerFactor,
}

/// One device's raw daily series, as handed over by the data-access layer.
#[derive(Debug, Clone)]
pub struct DeviceSeries {
    pub device_id: String,
    pub device_name: String,
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingItem {
    pub device_id: String,
    pub device_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// Compute the per-device rollup scalars against an explicit `as_of`
/// instant. Month boundaries are calendar months of `as_of`; "last month"
/// wraps January back to December of the previous year.
pub fn energy_stats(readings: &[Reading], as_of: NaiveDateTime) -> Result<EnergyStats> {
    let samples = parse_samples(readings)?;

    let current_index = month_index(as_of);
    let current_month = month_consumption(&samples, current_index);
    let last_month = month_consumption(&samples, current_index - 1);

    let (total, average_power_factor, latest) = match samples.last() {
        Some((_, latest)) => {
            let pf_sum: f64 = samples.iter().map(|(_, r)| r.power_factor).sum();
            (
                latest.energy,
                pf_sum / samples.len() as f64,
                Some(*latest),
            )
        }
        None => (0.0, 0.0, None),
    };

    Ok(EnergyStats {
        current_month,
        last_month,
        total,
        average_power_factor,
        latest_power: latest.map(|r| r.power).unwrap_or(0.0),
        latest_voltage: latest.map(|r| r.voltage).unwrap_or(0.0),
        latest_current: latest.map(|r| r.current).unwrap_or(0.0),
    })
}

/// Rank devices descending by the chosen metric. Devices with a
/// non-positive value are excluded; ties keep input order.
pub fn rank_devices(
    devices: &[DeviceSeries],
    metric: RankingMetric,
    as_of: NaiveDateTime,
) -> Result<Vec<RankingItem>> {
    let mut items = Vec::with_capacity(devices.len());
    for device in devices {
        let stats = energy_stats(&device.readings, as_of)?;
        let value = match metric {
            RankingMetric::CurrentMonth => stats.current_month,
            RankingMetric::LastMonth => stats.last_month,
            RankingMetric::Total => stats.total,
            RankingMetric::PowerFactor => stats.average_power_factor,
        };
        if value > 0.0 {
            items.push(RankingItem {
                device_id: device.device_id.clone(),
                device_name: device.device_name.clone(),
                value,
            });
        }
    }
    items.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    Ok(items)
}

/// Pie-chart distribution from a ranked list: at most 5 named slices, the
/// 6th and beyond collapsed into a synthetic "Others" slice carrying the
/// sum of the excess.
pub fn pie_distribution(items: &[RankingItem]) -> Vec<PieSlice> {
    if items.len() <= 5 {
        return items
            .iter()
            .map(|i| PieSlice {
                name: i.device_name.clone(),
                value: i.value,
            })
            .collect();
    }

    let mut slices: Vec<PieSlice> = items[..5]
        .iter()
        .map(|i| PieSlice {
            name: i.device_name.clone(),
            value: i.value,
        })
        .collect();
    slices.push(PieSlice {
        name: "Others".to_string(),
        value: items[5..].iter().map(|i| i.value).sum(),
    });
    slices
}

/// Clamped first-to-last counter delta over the readings captured in the
/// calendar month at the given absolute month index; zero if none fall in
/// the month.
fn month_consumption(samples: &[Sample<'_>], index: i32) -> f64 {
    let mut energies = samples
        .iter()
        .filter(|(instant, _)| month_index(*instant) == index)
        .map(|(_, r)| r.energy);

    let Some(first) = energies.next() else {
        return 0.0;
    };
    let last = energies.last().unwrap_or(first);
    (last - first).max(0.0)
}

fn month_index(instant: NaiveDateTime) -> i32 {
    instant.year() * 12 + instant.month0() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn reading(id: &str, power_factor: f64, energy: f64) -> Reading {
        Reading {
            id: id.to_string(),
            power: 75.0,
            voltage: 231.0,
            frequency: 50.0,
            current: 0.33,
            power_factor,
            energy,
        }
    }

    fn as_of() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn stats_on_empty_series_are_all_zero() {
        let stats = energy_stats(&[], as_of()).unwrap();
        assert_eq!(stats, EnergyStats::default());
    }

    #[test]
    fn month_split_wraps_january_to_previous_december() {
        let readings = vec![
            reading("20241205", 0.9, 100.0),
            reading("20241228", 0.9, 130.0),
            reading("20250102", 0.9, 131.0),
            reading("20250114", 0.9, 140.0),
        ];
        let stats = energy_stats(&readings, as_of()).unwrap();
        assert_eq!(stats.current_month, 9.0);
        assert_eq!(stats.last_month, 30.0);
        assert_eq!(stats.total, 140.0);
    }

    #[test]
    fn total_is_latest_counter_even_when_input_is_unsorted() {
        let readings = vec![
            reading("20250114", 0.8, 140.0),
            reading("20250102", 1.0, 131.0),
        ];
        let stats = energy_stats(&readings, as_of()).unwrap();
        assert_eq!(stats.total, 140.0);
        assert_eq!(stats.average_power_factor, 0.9);
        assert_eq!(stats.latest_power, 75.0);
    }

    fn series(name: &str, counters: &[(u32, f64)]) -> DeviceSeries {
        DeviceSeries {
            device_id: format!("dev-{name}"),
            device_name: name.to_string(),
            readings: counters
                .iter()
                .map(|(day, energy)| reading(&format!("202501{day:02}"), 0.9, *energy))
                .collect(),
        }
    }

    #[test]
    fn ranking_sorts_descending_and_drops_non_positive() {
        let devices = vec![
            series("idle", &[(1, 5.0), (14, 5.0)]), // zero consumption
            series("small", &[(1, 0.0), (14, 2.0)]),
            series("big", &[(1, 0.0), (14, 9.0)]),
        ];
        let ranked = rank_devices(&devices, RankingMetric::CurrentMonth, as_of()).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].device_name, "big");
        assert_eq!(ranked[1].device_name, "small");
    }

    #[test]
    fn pie_groups_sixth_and_beyond_into_others() {
        let items: Vec<RankingItem> = [50.0, 40.0, 30.0, 20.0, 10.0, 5.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, v)| RankingItem {
                device_id: format!("d{i}"),
                device_name: format!("device {i}"),
                value: *v,
            })
            .collect();
        let slices = pie_distribution(&items);
        assert_eq!(slices.len(), 6);
        assert_eq!(slices[5].name, "Others");
        assert_eq!(slices[5].value, 6.0);
    }

    #[test]
    fn pie_with_five_or_fewer_has_no_others() {
        let items = vec![RankingItem {
            device_id: "d0".into(),
            device_name: "only".into(),
            value: 3.0,
        }];
        let slices = pie_distribution(&items);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, "only");
    }
}
