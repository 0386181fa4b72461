use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use futures::future::join_all;
use tracing::warn;

use energy_core::{pie_distribution, rank_devices, DeviceSeries, RankingMetric};

use crate::error::Result;
use crate::models::{PieCard, RankingList, SummaryResponse, TimeRange};
use crate::store::StoreClient;

/// Cross-device rankings and distribution pies for the home dashboard.
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<StoreClient>,
}

impl SummaryService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    pub async fn summary(&self, user_id: &str) -> Result<SummaryResponse> {
        let devices = self.store.fetch_user_devices(user_id).await?;

        let range = TimeRange::Y1;
        let fetches = devices.iter().map(|device| {
            self.store
                .fetch_readings(&device.id, range.feed(), range.sample_budget())
        });

        let mut series = Vec::with_capacity(devices.len());
        for (device, result) in devices.iter().zip(join_all(fetches).await) {
            match result {
                Ok(readings) => series.push(DeviceSeries {
                    device_id: device.id.clone(),
                    device_name: device.name.clone(),
                    readings,
                }),
                // One unreachable feed must not blank the whole summary.
                Err(e) => warn!(device_id = %device.id, "skipping device feed: {e}"),
            }
        }

        let response = build_summary(&series, Utc::now().naive_utc())?;
        Ok(response)
    }
}

pub(crate) fn build_summary(
    series: &[DeviceSeries],
    as_of: NaiveDateTime,
) -> energy_core::Result<SummaryResponse> {
    let metrics = [
        (RankingMetric::CurrentMonth, "Current Month", "kWh"),
        (RankingMetric::LastMonth, "Last Month", "kWh"),
        (RankingMetric::Total, "Total Energy", "kWh"),
        (RankingMetric::PowerFactor, "Power Factor", ""),
    ];

    let mut rankings = Vec::with_capacity(metrics.len());
    let mut distributions = Vec::new();

    for (metric, title, unit) in metrics {
        let items = rank_devices(series, metric, as_of)?;

        // Power factor is an average, not a share of anything; it gets a
        // ranking card but no pie.
        if metric != RankingMetric::PowerFactor {
            distributions.push(PieCard {
                title: title.to_string(),
                unit: unit.to_string(),
                slices: pie_distribution(&items),
            });
        }

        rankings.push(RankingList {
            title: title.to_string(),
            unit: unit.to_string(),
            items,
        });
    }

    Ok(SummaryResponse {
        rankings,
        distributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use energy_core::Reading;
    use pretty_assertions::assert_eq;

    fn series(name: &str, start: f64, end: f64) -> DeviceSeries {
        let reading = |id: &str, energy: f64| Reading {
            id: id.to_string(),
            power: 40.0,
            voltage: 230.0,
            frequency: 50.0,
            current: 0.17,
            power_factor: 0.9,
            energy,
        };
        DeviceSeries {
            device_id: format!("id-{name}"),
            device_name: name.to_string(),
            readings: vec![reading("20250601", start), reading("20250614", end)],
        }
    }

    #[test]
    fn summary_has_four_rankings_and_three_pies() {
        let devices = vec![
            series("heater", 10.0, 60.0),
            series("fridge", 5.0, 45.0),
            series("lamp", 1.0, 3.0),
        ];
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let summary = build_summary(&devices, as_of).unwrap();

        assert_eq!(summary.rankings.len(), 4);
        assert_eq!(summary.distributions.len(), 3);
        assert_eq!(summary.rankings[0].title, "Current Month");
        assert_eq!(summary.rankings[0].items[0].device_name, "heater");
        assert_eq!(summary.rankings[0].items[0].value, 50.0);
        assert_eq!(summary.rankings[3].title, "Power Factor");
        assert_eq!(summary.distributions[0].slices.len(), 3);
    }

    #[test]
    fn empty_device_list_yields_empty_cards() {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let summary = build_summary(&[], as_of).unwrap();
        assert!(summary.rankings.iter().all(|r| r.items.is_empty()));
        assert!(summary.distributions.iter().all(|p| p.slices.is_empty()));
    }
}
