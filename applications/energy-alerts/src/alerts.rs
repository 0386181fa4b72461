use std::collections::HashSet;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use energy_core::Reading;

use crate::store::StoreClient;
use crate::telegram::TelegramClient;

/// Trailing daily-feed records to inspect per device; more than one in
/// case the newest upload was quarantined.
const LATEST_SAMPLE_WINDOW: usize = 12;

/// Lifetime energy counter of the most recent reading by capture instant,
/// or None when the feed is empty.
pub fn latest_energy(readings: &[Reading]) -> Result<Option<f64>> {
    let mut latest: Option<(NaiveDateTime, f64)> = None;
    for reading in readings {
        let instant = reading.instant()?;
        if latest.map_or(true, |(t, _)| instant >= t) {
            latest = Some((instant, reading.energy));
        }
    }
    Ok(latest.map(|(_, energy)| energy))
}

/// The counter is trusted as-is; no aggregation happens here.
pub fn exceeds_limit(limit: f64, energy: f64) -> bool {
    limit > 0.0 && energy > limit
}

/// One pass over every device with a configured limit: compare the latest
/// reading's lifetime counter against it. Per-device failures are logged
/// and skipped; one silent plug must not stop the other alerts. Returns
/// the number of alerts sent.
///
/// `alerted` remembers (device, day) pairs so a breached limit fires
/// once per day rather than on every sweep.
pub async fn run_sweep(
    store: &StoreClient,
    telegram: &TelegramClient,
    subscribers: &[i64],
    alerted: &mut HashSet<(String, NaiveDate)>,
    today: NaiveDate,
) -> Result<usize> {
    alerted.retain(|(_, day)| *day == today);

    let devices = store.fetch_devices().await?;
    let mut checked = 0;
    let mut sent = 0;
    let mut errors = 0;

    for (device_id, device) in devices {
        if device.energy_limit <= 0.0 {
            continue;
        }
        checked += 1;

        let readings = match store.fetch_daily_readings(&device_id, LATEST_SAMPLE_WINDOW).await {
            Ok(readings) => readings,
            Err(e) => {
                warn!(device_id = %device_id, "skipping device, feed unreachable: {e}");
                errors += 1;
                continue;
            }
        };

        let energy = match latest_energy(&readings) {
            Ok(Some(energy)) => energy,
            Ok(None) => continue,
            Err(e) => {
                warn!(device_id = %device_id, "skipping device, corrupt readings: {e}");
                errors += 1;
                continue;
            }
        };

        if !exceeds_limit(device.energy_limit, energy) {
            continue;
        }
        if !alerted.insert((device_id.clone(), today)) {
            continue;
        }

        let name = device.name.as_deref().unwrap_or(&device_id);
        let text = format!(
            "Energy alert: {name} is at {energy:.2} kWh, above its {:.2} kWh limit.",
            device.energy_limit
        );
        info!(device_id = %device_id, energy, limit = device.energy_limit, "limit exceeded");

        for chat_id in subscribers {
            if let Err(e) = telegram.send_message(*chat_id, &text).await {
                warn!(chat_id, "failed to deliver alert: {e}");
            }
        }
        sent += 1;
    }

    info!(checked, alerted = sent, errors, "sweep complete");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reading(id: &str, energy: f64) -> Reading {
        Reading {
            id: id.to_string(),
            power: 50.0,
            voltage: 230.0,
            frequency: 50.0,
            current: 0.2,
            power_factor: 0.95,
            energy,
        }
    }

    #[test]
    fn latest_lifetime_counter_above_limit_fires() {
        // Counter ends at 1000.0 even though today's growth is tiny; it is
        // the counter, not a consumption delta, that the limit bounds.
        let readings = vec![
            reading("20250615T000500", 998.0),
            reading("20250615T120000", 999.5),
            reading("20250615T180000", 1000.0),
        ];
        let energy = latest_energy(&readings).unwrap().unwrap();
        assert_eq!(energy, 1000.0);
        assert!(exceeds_limit(500.0, energy));
        assert!(!exceeds_limit(2000.0, energy));
    }

    #[test]
    fn latest_energy_picks_newest_even_when_unsorted() {
        let readings = vec![
            reading("20250615T180000", 103.0),
            reading("20250614T090000", 101.0),
            reading("20250615T060000", 102.0),
        ];
        assert_eq!(latest_energy(&readings).unwrap(), Some(103.0));
    }

    #[test]
    fn latest_energy_of_empty_feed_is_none() {
        assert_eq!(latest_energy(&[]).unwrap(), None);
    }

    #[test]
    fn malformed_identifier_surfaces() {
        let readings = vec![reading("garbage", 1.0)];
        assert!(latest_energy(&readings).is_err());
    }

    #[test]
    fn limit_check_ignores_unset_limits() {
        assert!(!exceeds_limit(0.0, 5.0));
        assert!(!exceeds_limit(-1.0, 5.0));
        assert!(!exceeds_limit(3.0, 3.0));
        assert!(exceeds_limit(3.0, 3.1));
    }
}
