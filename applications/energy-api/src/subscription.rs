use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use energy_core::Reading;

use crate::error::{AppError, Result};
use crate::models::TimeRange;
use crate::store::StoreClient;

/// One live feed is identified by device and window; different windows
/// read different store feeds, so they poll independently.
pub type SubscriptionKey = (String, TimeRange);

/// Immutable snapshot of one feed's trailing readings, shared between
/// every subscriber without copying.
pub type Snapshot = Arc<Vec<Reading>>;

/// Outcome of one poll as fanned out to subscribers. Failed polls travel
/// too, carrying the error text; a waiting request must get an answer
/// when the store is down, not block until it recovers. The error is a
/// display string so the payload stays `Clone` across the channel.
pub type PollUpdate = std::result::Result<Snapshot, String>;

struct Entry {
    sender: broadcast::Sender<PollUpdate>,
    latest: Arc<RwLock<Option<PollUpdate>>>,
    refcount: usize,
    task: JoinHandle<()>,
}

/// Reference-counted poller cache.
///
/// The first `acquire` for a key spawns a background task that polls the
/// store and broadcasts snapshots; further acquires for the same key share
/// that task. When the last handle is dropped the task is aborted and the
/// entry removed, so an idle dashboard costs the store nothing.
#[derive(Clone)]
pub struct SubscriptionCache {
    inner: Arc<Mutex<HashMap<SubscriptionKey, Entry>>>,
    store: Arc<StoreClient>,
    poll_interval: Duration,
}

impl SubscriptionCache {
    pub fn new(store: Arc<StoreClient>, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            store,
            poll_interval,
        }
    }

    pub fn acquire(&self, key: SubscriptionKey) -> SubscriptionHandle {
        let mut map = self.inner.lock().unwrap();

        let entry = map.entry(key.clone()).or_insert_with(|| {
            let (sender, _) = broadcast::channel(16);
            let latest = Arc::new(RwLock::new(None));
            let task = spawn_poller(
                self.store.clone(),
                key.clone(),
                self.poll_interval,
                sender.clone(),
                latest.clone(),
            );
            debug!(device_id = %key.0, range = ?key.1, "started feed poller");
            Entry {
                sender,
                latest,
                refcount: 0,
                task,
            }
        });
        entry.refcount += 1;

        SubscriptionHandle {
            key,
            cache: self.clone(),
            receiver: entry.sender.subscribe(),
            latest: entry.latest.clone(),
        }
    }

    fn release(&self, key: &SubscriptionKey) {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get_mut(key) {
            entry.refcount -= 1;
            if entry.refcount == 0 {
                entry.task.abort();
                map.remove(key);
                debug!(device_id = %key.0, range = ?key.1, "stopped feed poller");
            }
        }
    }

    /// One-shot read: acquire, take the freshest poll outcome, release.
    /// Concurrent callers for the same key still share a single poller.
    /// A cached failed poll is returned as an error immediately rather
    /// than waiting out the poll interval.
    pub async fn snapshot(&self, key: SubscriptionKey) -> Result<Snapshot> {
        let mut handle = self.acquire(key);
        match handle.latest() {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(AppError::Unavailable(message)),
            None => handle.recv().await,
        }
    }

    /// Number of feeds currently being polled.
    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Live handle to one feed. Dropping it releases the reference; the
/// poller stops when the last handle goes away.
pub struct SubscriptionHandle {
    key: SubscriptionKey,
    cache: SubscriptionCache,
    receiver: broadcast::Receiver<PollUpdate>,
    latest: Arc<RwLock<Option<PollUpdate>>>,
}

impl SubscriptionHandle {
    /// The most recent poll outcome, if the poller has completed a fetch.
    pub fn latest(&self) -> Option<PollUpdate> {
        self.latest.read().unwrap().clone()
    }

    /// Wait for the next poll to complete, successful or not.
    pub async fn recv(&mut self) -> Result<Snapshot> {
        loop {
            match self.receiver.recv().await {
                Ok(Ok(snapshot)) => return Ok(snapshot),
                Ok(Err(message)) => return Err(AppError::Unavailable(message)),
                // A slow consumer only misses intermediate snapshots;
                // the next one is still authoritative.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AppError::Other(anyhow!("subscription feed closed")))
                }
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cache.release(&self.key);
    }
}

fn spawn_poller(
    store: Arc<StoreClient>,
    key: SubscriptionKey,
    poll_interval: Duration,
    sender: broadcast::Sender<PollUpdate>,
    latest: Arc<RwLock<Option<PollUpdate>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (device_id, range) = key;
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            let update: PollUpdate = match store
                .fetch_readings(&device_id, range.feed(), range.sample_budget())
                .await
            {
                Ok(readings) => Ok(Arc::new(readings)),
                Err(e) => {
                    warn!(device_id = %device_id, range = ?range, "feed poll failed: {e}");
                    Err(e.to_string())
                }
            };
            *latest.write().unwrap() = Some(update.clone());
            // Send fails only when nobody is listening right now;
            // `latest` still serves the next subscriber.
            let _ = sender.send(update);
        }
    })
}
