//! A small stand-in for the orchestration host.
//!
//! Drives the provision-then-signal sequence against a topology: populate a
//! root's descriptor, then fire readiness down the tree parent-first. Real
//! hosts do this off health checks; the emulation does it on demand.

use ready_broker::{EventBus, ReadyError, ResourceNode};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Owns the bus and the shutdown token shared by every registration.
#[derive(Clone)]
pub struct EmulatedHost {
    bus: EventBus,
    token: CancellationToken,
}

impl EmulatedHost {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Provisions a root resource and fires its readiness signal.
    pub async fn start_root(&self, node: &ResourceNode, connection_string: &str) -> Result<(), ReadyError> {
        node.set_connection_string(connection_string);
        self.signal_ready(node).await
    }

    /// Fires the readiness signal for one node, logging any listener errors.
    pub async fn signal_ready(&self, node: &ResourceNode) -> Result<(), ReadyError> {
        info!(resource = node.name(), "resource ready");
        let result = node.notify_ready(&self.token).await;
        if let Err(ref err) = result {
            error!(resource = node.name(), error = %err, "readiness listeners failed");
        }
        result
    }

    /// Cancels every in-flight factory and handler.
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

impl Default for EmulatedHost {
    fn default() -> Self {
        Self::new()
    }
}
