//! Sync record and bucket model.
//!
//! The sync agent mirrors a fixed set of local data buckets to a remote
//! per-device record store. Each bucket maps to a stable wire name
//! (`data_type`) and a local storage key; the remote store holds at most one
//! record per (device_id, data_type) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One named category of local application state, mirrored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    User,
    Notes,
    Tasks,
    Feed,
    Projects,
    Courses,
    Books,
    Focus,
    Chat,
    TeacherSettings,
}

impl Bucket {
    /// All buckets, in the order they are synced and restored.
    pub const ALL: [Bucket; 10] = [
        Bucket::User,
        Bucket::Notes,
        Bucket::Tasks,
        Bucket::Feed,
        Bucket::Projects,
        Bucket::Courses,
        Bucket::Books,
        Bucket::Focus,
        Bucket::Chat,
        Bucket::TeacherSettings,
    ];

    /// Wire name used as the remote `data_type` column.
    pub fn data_type(&self) -> &'static str {
        match self {
            Bucket::User => "user",
            Bucket::Notes => "notes",
            Bucket::Tasks => "tasks",
            Bucket::Feed => "feed",
            Bucket::Projects => "projects",
            Bucket::Courses => "courses",
            Bucket::Books => "books",
            Bucket::Focus => "focus",
            Bucket::Chat => "chat",
            Bucket::TeacherSettings => "teacher_settings",
        }
    }

    /// Local storage key holding this bucket's state.
    pub fn local_key(&self) -> &'static str {
        match self {
            Bucket::User => "webuni_user",
            Bucket::Notes => "webuni_notes",
            Bucket::Tasks => "webuni_tasks",
            Bucket::Feed => "webuni_feed",
            Bucket::Projects => "webuni_projects",
            Bucket::Courses => "webuni_courses",
            Bucket::Books => "webuni_books",
            Bucket::Focus => "webuni_focus",
            Bucket::Chat => "webuni_teacher_chat",
            Bucket::TeacherSettings => "webuni_teacher_settings",
        }
    }

    /// Look up a bucket by its wire name.
    pub fn from_data_type(name: &str) -> Option<Bucket> {
        Bucket::ALL.iter().copied().find(|b| b.data_type() == name)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.data_type())
    }
}

/// Remote row mirroring one local bucket for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    pub device_id: String,
    pub data_type: String,
    pub data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncRecord {
    /// Build a fresh record with both timestamps set to now.
    pub fn new(device_id: impl Into<String>, bucket: Bucket, data: JsonValue) -> Self {
        let now = Utc::now();
        Self {
            device_id: device_id.into(),
            data_type: bucket.data_type().to_string(),
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pending save held in process memory while offline or after a failed push.
///
/// Lost on process exit if not flushed; replayed oldest-first on reconnect.
#[derive(Debug, Clone)]
pub struct SyncQueueItem {
    pub bucket: Bucket,
    pub data: JsonValue,
}
