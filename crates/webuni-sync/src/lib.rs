//! # webuni-sync
//!
//! Cloud sync agent for webuni local state.
//!
//! Mirrors a fixed set of local data buckets to a remote per-device record
//! store, queuing writes made while offline and flushing them on reconnect.
//! The agent's collaborators (local storage, remote store, connectivity
//! signal) are injected traits, so every offline/failure scenario is
//! reachable in tests.

pub mod agent;
pub mod connectivity;
pub mod local;
pub mod store;

// Re-export commonly used types at crate root
pub use agent::{FlushReport, SaveOutcome, SyncAgent, DEVICE_ID_KEY};
pub use connectivity::{Connectivity, NetworkWatch};
pub use local::{FileStore, LocalStore, MemoryStore};
pub use store::{MockStore, RecordStore, RestConfig, RestStore};
