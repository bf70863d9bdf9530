//! Connectivity observation.
//!
//! The agent never probes the network itself; it observes a connectivity
//! signal injected as a collaborator, which keeps offline behavior fully
//! deterministic in tests.

use tokio::sync::watch;

/// Observable online/offline signal.
pub trait Connectivity: Send + Sync {
    /// Current state of the signal.
    fn is_online(&self) -> bool;

    /// Subscribe to state transitions.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Watch-channel backed connectivity signal.
///
/// Production wiring drives [`set_online`](NetworkWatch::set_online) from
/// whatever runtime network event source is available; tests toggle it
/// directly.
pub struct NetworkWatch {
    tx: watch::Sender<bool>,
}

impl NetworkWatch {
    /// Create a signal with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Flip the signal. Subscribers observe the transition.
    pub fn set_online(&self, online: bool) {
        // send_replace never fails even with no receivers
        self.tx.send_replace(online);
    }
}

impl Connectivity for NetworkWatch {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
