//! REST client for the document store that the power plugs report into.
//!
//! The store is a plain JSON-over-HTTP document tree. Reading feeds live
//! under `readings_daily/`, `readings_weekly/` and `readings_yearly/`,
//! keyed by device id and then by timestamp-encoded record id. Device
//! metadata lives under `devices/` and per-user attachments under
//! `users/{user_id}/devices/`.

mod client;
mod records;

pub use client::StoreClient;
pub use records::{validate_reading, RawDeviceRecord, RawLogRecord, RawReadingRecord};

use serde::{Deserialize, Serialize};

/// The three reading feeds the store keeps per device, at decreasing
/// sample density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Daily,
    Weekly,
    Yearly,
}

impl Feed {
    pub fn path(self) -> &'static str {
        match self {
            Feed::Daily => "readings_daily",
            Feed::Weekly => "readings_weekly",
            Feed::Yearly => "readings_yearly",
        }
    }
}
