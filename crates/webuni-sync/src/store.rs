//! Remote record store backends.
//!
//! [`RestStore`] talks to a hosted PostgREST-style table holding one row per
//! (device_id, data_type) pair. [`MockStore`] is an in-memory double with
//! failure injection and a call log for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use webuni_core::{Bucket, Error, Result, SyncRecord};

/// Remote store keyed by (device_id, data_type).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record for one device and bucket, if present.
    async fn fetch(&self, device_id: &str, bucket: Bucket) -> Result<Option<SyncRecord>>;

    /// Insert or update the record for (record.device_id, record.data_type)
    /// in a single remote call.
    async fn upsert(&self, record: &SyncRecord) -> Result<()>;
}

// =============================================================================
// REST STORE
// =============================================================================

/// Default table holding sync records.
pub const DEFAULT_TABLE: &str = "user_data";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the hosted record store.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL (the `/rest/v1/` prefix is appended).
    pub base_url: String,
    /// Static project-level credential. Not a secret; access control rests
    /// entirely on the unguessable device identifier.
    pub api_key: String,
    /// Table name.
    pub table: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl RestConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SUPABASE_URL` | (required) | Project base URL |
    /// | `SUPABASE_ANON_KEY` | (required) | Project credential |
    /// | `SYNC_TABLE` | `user_data` | Table name |
    /// | `SYNC_TIMEOUT` | `30` | Request timeout in seconds |
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::Config("SUPABASE_URL is not set".to_string()))?;
        let api_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            table: std::env::var("SYNC_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
            timeout_seconds: std::env::var("SYNC_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// PostgREST-backed record store.
pub struct RestStore {
    client: Client,
    config: RestConfig,
}

impl RestStore {
    /// Create a new store with the given configuration.
    pub fn new(config: RestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch(&self, device_id: &str, bucket: Bucket) -> Result<Option<SyncRecord>> {
        debug!(device_id, bucket = %bucket, "Fetching sync record");

        let response = self
            .authed(self.client.get(self.endpoint()))
            .header("Prefer", "return=minimal")
            .query(&[
                ("device_id", format!("eq.{}", device_id)),
                ("data_type", format!("eq.{}", bucket.data_type())),
                ("select", "*".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Store(format!("fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!(
                "fetch {} returned {}",
                bucket, status
            )));
        }

        let mut rows: Vec<SyncRecord> = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("failed to parse fetch response: {}", e)))?;

        // Uniqueness means at most one row; take the first either way.
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn upsert(&self, record: &SyncRecord) -> Result<()> {
        debug!(
            device_id = %record.device_id,
            data_type = %record.data_type,
            "Upserting sync record"
        );

        // One atomic insert-or-update; the conflict target is the
        // (device_id, data_type) uniqueness constraint.
        let response = self
            .authed(self.client.post(self.endpoint()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", "device_id,data_type")])
            .json(record)
            .send()
            .await
            .map_err(|e| Error::Store(format!("upsert failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!(
                "upsert {} returned {}",
                record.data_type, status
            )));
        }

        Ok(())
    }
}

// =============================================================================
// MOCK STORE
// =============================================================================

/// One logged call against the mock store.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub op: String,
    pub device_id: String,
    pub data_type: String,
}

/// In-memory record store for deterministic testing.
///
/// Records live in a shared map; `set_failing(true)` makes every call fail
/// until cleared. All calls are logged for assertion.
#[derive(Clone, Default)]
pub struct MockStore {
    records: Arc<Mutex<HashMap<(String, String), SyncRecord>>>,
    failing: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls with the given op ("fetch" or "upsert").
    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.op == op).count()
    }

    /// Seed a record directly, bypassing the call log.
    pub fn seed(&self, record: SyncRecord) {
        self.records.lock().unwrap().insert(
            (record.device_id.clone(), record.data_type.clone()),
            record,
        );
    }

    /// Read a stored record directly, bypassing the call log.
    pub fn stored(&self, device_id: &str, bucket: Bucket) -> Option<SyncRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(device_id.to_string(), bucket.data_type().to_string()))
            .cloned()
    }

    fn log(&self, op: &str, device_id: &str, data_type: &str) {
        self.calls.lock().unwrap().push(MockCall {
            op: op.to_string(),
            device_id: device_id.to_string(),
            data_type: data_type.to_string(),
        });
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn fetch(&self, device_id: &str, bucket: Bucket) -> Result<Option<SyncRecord>> {
        self.log("fetch", device_id, bucket.data_type());
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("simulated fetch failure".to_string()));
        }
        Ok(self.stored(device_id, bucket))
    }

    async fn upsert(&self, record: &SyncRecord) -> Result<()> {
        self.log("upsert", &record.device_id, &record.data_type);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("simulated upsert failure".to_string()));
        }

        let key = (record.device_id.clone(), record.data_type.clone());
        // The upsert carries a full row, so an update replaces every column.
        self.records.lock().unwrap().insert(key, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_upsert_then_fetch() {
        let store = MockStore::new();
        let record = SyncRecord::new("device_1", Bucket::Notes, serde_json::json!([1, 2, 3]));
        store.upsert(&record).await.unwrap();

        let fetched = store.fetch("device_1", Bucket::Notes).await.unwrap().unwrap();
        assert_eq!(fetched.data, serde_json::json!([1, 2, 3]));
        assert_eq!(store.call_count("upsert"), 1);
        assert_eq!(store.call_count("fetch"), 1);
    }

    #[tokio::test]
    async fn test_mock_store_update_replaces_row() {
        let store = MockStore::new();
        let first = SyncRecord::new("device_1", Bucket::Focus, serde_json::json!({"m": 25}));
        store.upsert(&first).await.unwrap();

        let second = SyncRecord::new("device_1", Bucket::Focus, serde_json::json!({"m": 50}));
        store.upsert(&second).await.unwrap();

        let fetched = store.fetch("device_1", Bucket::Focus).await.unwrap().unwrap();
        assert_eq!(fetched.data["m"], 50);
        assert_eq!(fetched.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_mock_store_failure_injection() {
        let store = MockStore::new();
        store.set_failing(true);

        let record = SyncRecord::new("device_1", Bucket::Notes, serde_json::json!(null));
        assert!(store.upsert(&record).await.is_err());
        assert!(store.fetch("device_1", Bucket::Notes).await.is_err());

        store.set_failing(false);
        assert!(store.upsert(&record).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_store_isolates_devices() {
        let store = MockStore::new();
        let record = SyncRecord::new("device_a", Bucket::Books, serde_json::json!(1));
        store.upsert(&record).await.unwrap();

        assert!(store.fetch("device_b", Bucket::Books).await.unwrap().is_none());
    }

    #[test]
    fn test_rest_config_defaults() {
        let config = RestConfig {
            base_url: "https://example.supabase.co".to_string(),
            api_key: "anon".to_string(),
            table: DEFAULT_TABLE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        };
        let store = RestStore::new(config).unwrap();
        assert_eq!(
            store.endpoint(),
            "https://example.supabase.co/rest/v1/user_data"
        );
    }
}
