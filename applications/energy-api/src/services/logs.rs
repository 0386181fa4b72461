use std::sync::Arc;

use crate::error::Result;
use crate::models::{LogEntry, LogsQuery};
use crate::store::StoreClient;

const DEFAULT_LOG_LIMIT: usize = 100;

/// How many trailing records to pull from the store before filtering.
/// Filters are applied here, so fetching only `limit` records would
/// starve a filtered query.
const FETCH_WINDOW: usize = 500;

#[derive(Clone)]
pub struct LogService {
    store: Arc<StoreClient>,
}

impl LogService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    pub async fn logs(&self, device_id: &str, query: &LogsQuery) -> Result<Vec<LogEntry>> {
        let entries = self.store.fetch_device_logs(device_id, FETCH_WINDOW).await?;
        Ok(filter_logs(entries, query))
    }
}

/// Apply date bounds and text search, newest first, capped at the
/// requested limit. Date bounds are inclusive on both ends; the text
/// query matches title or content case-insensitively.
pub(crate) fn filter_logs(mut entries: Vec<LogEntry>, query: &LogsQuery) -> Vec<LogEntry> {
    let needle = query
        .q
        .as_deref()
        .map(str::to_lowercase)
        .filter(|q| !q.is_empty());

    entries.retain(|entry| {
        let day = entry.timestamp.date();
        if query.start.is_some_and(|start| day < start) {
            return false;
        }
        if query.end.is_some_and(|end| day > end) {
            return false;
        }
        if let Some(needle) = &needle {
            return entry.title.to_lowercase().contains(needle)
                || entry.content.to_lowercase().contains(needle);
        }
        true
    });

    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
    entries.truncate(query.limit.unwrap_or(DEFAULT_LOG_LIMIT));
    entries
}
