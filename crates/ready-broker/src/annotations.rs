//! # Annotation Store
//!
//! Per-node idempotency guard for factory registration.
//!
//! The store holds opaque kind tags and answers exactly one question: "has a
//! client factory already been attached to this node for this kind?" The
//! check and the insert happen under a single lock, so a race between N
//! concurrent registration calls still yields exactly one winner.

use std::collections::HashSet;
use std::sync::Mutex;

/// Set of kind tags attached to a resource node. Membership-tested only;
/// insertion order is irrelevant.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    markers: Mutex<HashSet<&'static str>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts `marker`, returning `true` only for the first
    /// caller. Subsequent (or concurrently racing) calls return `false`.
    pub fn mark(&self, marker: &'static str) -> bool {
        self.markers.lock().unwrap().insert(marker)
    }

    /// Whether `marker` has already been attached to this node.
    #[cfg(test)]
    fn is_marked(&self, marker: &'static str) -> bool {
        self.markers.lock().unwrap().contains(marker)
    }
}
