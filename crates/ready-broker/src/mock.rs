//! # Test Instrumentation
//!
//! Deterministic probes for testing readiness delivery without real
//! provisioning machinery.
//!
//! The pattern: hand a clone of a [`ReadyProbe`] to each handler under test,
//! fire the readiness signal, then assert on the recorded order and counts.
//! Because publish awaits every handler before returning, no sleeping or
//! polling is needed; by the time `notify_ready` resolves, every delivery
//! has been recorded.
//!
//! ```rust
//! use ready_broker::ReadyProbe;
//!
//! let probe = ReadyProbe::new();
//! probe.record("orders");
//! probe.record("notifications");
//! assert_eq!(probe.entries(), vec!["orders", "notifications"]);
//! assert_eq!(probe.count(), 2);
//! ```

use std::sync::{Arc, Mutex};

use crate::error::BoxError;

/// Records the order in which handlers observed readiness events.
///
/// Cheap to clone; all clones share one log.
#[derive(Clone, Debug, Default)]
pub struct ReadyProbe {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ReadyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observation.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// All observations so far, in recording order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// A boxed error for simulating handler failures.
pub fn boxed_failure(message: &str) -> BoxError {
    message.to_string().into()
}
