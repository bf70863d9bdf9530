//! The sync agent: best-effort mirroring of local buckets to the remote
//! per-device record store.
//!
//! Saves made while offline (or that fail in flight) land on an in-memory
//! FIFO queue and are replayed when connectivity returns. Remote failures
//! never propagate to bucket callers; they degrade to "use local data" or
//! "retry later".

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::Rng;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use webuni_core::{Bucket, Error, Result, SyncQueueItem, SyncRecord};

use crate::connectivity::Connectivity;
use crate::local::LocalStore;
use crate::store::RecordStore;

/// Local storage key holding the persistent device identifier.
pub const DEVICE_ID_KEY: &str = "webuni_device_id";

const DEVICE_SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const DEVICE_SUFFIX_LEN: usize = 9;

/// Outcome of a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record reached the remote store.
    Synced,
    /// The save was deferred to the queue (offline, or the push failed).
    Queued,
}

impl SaveOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SaveOutcome::Synced)
    }
}

/// Result of one queue flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Items popped and replayed.
    pub attempted: usize,
    /// Items that reached the remote store.
    pub flushed: usize,
}

/// Browser-resident-style sync agent over injected collaborators.
pub struct SyncAgent {
    device_id: Mutex<String>,
    local: Arc<dyn LocalStore>,
    store: Arc<dyn RecordStore>,
    connectivity: Arc<dyn Connectivity>,
    queue: Mutex<VecDeque<SyncQueueItem>>,
}

impl SyncAgent {
    /// Create an agent, loading or generating the device identifier.
    pub fn new(
        local: Arc<dyn LocalStore>,
        store: Arc<dyn RecordStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self> {
        let device_id = match local.get(DEVICE_ID_KEY) {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = generate_device_id();
                local.set(DEVICE_ID_KEY, &id)?;
                info!(device_id = %id, "Generated new device identifier");
                id
            }
        };

        Ok(Self {
            device_id: Mutex::new(device_id),
            local,
            store,
            connectivity,
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// The device identifier, shareable as a cross-device restore code.
    pub fn device_code(&self) -> String {
        self.device_id.lock().unwrap().clone()
    }

    /// Current connectivity state.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Number of pending queued saves.
    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    fn enqueue(&self, bucket: Bucket, data: JsonValue) {
        debug!(bucket = %bucket, "Queued save for later sync");
        self.queue
            .lock()
            .unwrap()
            .push_back(SyncQueueItem { bucket, data });
    }

    /// Push one bucket's state to the remote store.
    ///
    /// Offline saves are queued without touching the network. A failed push
    /// is queued too, so delivery is at-least-once: a replayed save can race
    /// a newer save of the same bucket, and the later completed write wins.
    pub async fn save(&self, bucket: Bucket, data: JsonValue) -> SaveOutcome {
        if !self.is_online() {
            self.enqueue(bucket, data);
            return SaveOutcome::Queued;
        }

        let record = SyncRecord::new(self.device_code(), bucket, data.clone());
        match self.store.upsert(&record).await {
            Ok(()) => {
                debug!(bucket = %bucket, "Synced bucket to remote store");
                SaveOutcome::Synced
            }
            Err(e) => {
                warn!(bucket = %bucket, error = %e, "Sync failed, queued for retry");
                self.enqueue(bucket, data);
                SaveOutcome::Queued
            }
        }
    }

    /// Read one bucket's remote state, or `None` offline / absent / failed.
    pub async fn load(&self, bucket: Bucket) -> Option<JsonValue> {
        if !self.is_online() {
            debug!(bucket = %bucket, "Offline, using local data");
            return None;
        }

        match self.store.fetch(&self.device_code(), bucket).await {
            Ok(Some(record)) => Some(record.data),
            Ok(None) => None,
            Err(e) => {
                warn!(bucket = %bucket, error = %e, "Remote load failed, using local data");
                None
            }
        }
    }

    /// Replay queued saves, oldest first, while online.
    ///
    /// A failed replay re-enqueues the item through save's own failure path
    /// and stops the pass, so a dead link cannot make this loop spin; the
    /// next reconnect or explicit sync picks the queue up again.
    pub async fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();

        while self.is_online() {
            let item = self.queue.lock().unwrap().pop_front();
            let Some(item) = item else { break };

            report.attempted += 1;
            match self.save(item.bucket, item.data).await {
                SaveOutcome::Synced => report.flushed += 1,
                SaveOutcome::Queued => break,
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                flushed = report.flushed,
                "Queue flush pass complete"
            );
        }
        report
    }

    /// Push every present local bucket to the remote store.
    ///
    /// Returns the number of buckets that reached the remote store.
    /// Unparsable local state is skipped, never fatal.
    pub async fn sync_all(&self) -> usize {
        let mut synced = 0;
        for bucket in Bucket::ALL {
            let Some(raw) = self.local.get(bucket.local_key()) else {
                continue;
            };
            match serde_json::from_str::<JsonValue>(&raw) {
                Ok(data) => {
                    if self.save(bucket, data).await.is_synced() {
                        synced += 1;
                    }
                }
                Err(e) => {
                    warn!(bucket = %bucket, error = %e, "Skipping unparsable local bucket");
                }
            }
        }
        info!(synced, "Sync of all buckets complete");
        synced
    }

    /// Overwrite local buckets with whatever the remote store holds.
    ///
    /// Returns the number of buckets restored. Buckets with no remote data
    /// are left alone.
    pub async fn restore_all(&self) -> usize {
        let mut restored = 0;
        for bucket in Bucket::ALL {
            if let Some(data) = self.load(bucket).await {
                match serde_json::to_string(&data) {
                    Ok(raw) => {
                        if self.local.set(bucket.local_key(), &raw).is_ok() {
                            debug!(bucket = %bucket, "Restored bucket from remote store");
                            restored += 1;
                        }
                    }
                    Err(e) => warn!(bucket = %bucket, error = %e, "Failed to encode remote data"),
                }
            }
        }
        info!(restored, "Restore of all buckets complete");
        restored
    }

    /// Adopt another device's identity and state.
    ///
    /// All-or-nothing: every bucket is fetched against `code` and staged
    /// first, then the buckets and the new device identifier are written as
    /// one batched local operation. A failure at any point leaves both the
    /// identity and the local buckets exactly as they were.
    pub async fn restore_from_code(&self, code: &str) -> Result<usize> {
        if !self.is_online() {
            return Err(Error::Offline("cannot restore while offline".to_string()));
        }

        let mut staged = Vec::new();
        for bucket in Bucket::ALL {
            if let Some(record) = self.store.fetch(code, bucket).await? {
                let raw = serde_json::to_string(&record.data)?;
                staged.push((bucket.local_key().to_string(), raw));
            }
        }
        let restored = staged.len();
        staged.push((DEVICE_ID_KEY.to_string(), code.to_string()));

        self.local.set_many(&staged)?;
        *self.device_id.lock().unwrap() = code.to_string();
        info!(device_id = %code, restored, "Adopted device identity");
        Ok(restored)
    }

    /// React to connectivity transitions until the signal's sender drops.
    ///
    /// Going online triggers a queue flush; going offline changes nothing
    /// beyond the flag the agent already observes through the signal.
    pub async fn run(self: Arc<Self>) {
        let mut rx = self.connectivity.subscribe();
        let mut was_online = *rx.borrow();

        while rx.changed().await.is_ok() {
            let online = *rx.borrow();
            if online && !was_online {
                info!("Network restored, flushing sync queue");
                self.flush().await;
            } else if !online && was_online {
                info!("Network lost, entering offline mode");
            }
            was_online = online;
        }
    }
}

/// Generate a device identifier: `device_<unix-millis>_<9 chars>`.
fn generate_device_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..DEVICE_SUFFIX_LEN)
        .map(|_| DEVICE_SUFFIX_CHARS[rng.gen_range(0..DEVICE_SUFFIX_CHARS.len())] as char)
        .collect();
    format!("device_{}_{}", millis, suffix)
}
