//! # Idempotent Registration
//!
//! The public surface consumers use to get a freshly constructed client
//! delivered when a resource becomes ready.
//!
//! # The Two-Step Contract
//! [`NodeBuilder::on_ready`] does two things, and their asymmetry is the
//! whole design:
//!
//! 1. **At most once per kind tag** (gated by the node's annotation store):
//!    attach a readiness listener that resolves connection information, runs
//!    the client factory, and publishes the typed event on the bus.
//! 2. **Every time**: subscribe the caller's handler to `(node, event type)`.
//!
//! Calling `on_ready` N times therefore attaches exactly one
//! factory-and-publish listener but N independent subscribers, and all N
//! handlers receive the single event produced by one readiness firing. The
//! check-and-set in step 1 is atomic, so the invariant holds even when the N
//! calls race from different tasks.
//!
//! # Lifecycle
//! A node moves through `declared` -> `listener attached` (first `on_ready`) ->
//! `constructing client` (each firing) -> `published`, or `failed` when
//! resolution or construction errors. There is no terminal state: repeat
//! firings re-enter `constructing client` for the life of the process.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, ReadyEvent};
use crate::error::{BoxError, ReadyError};
use crate::node::ResourceNode;

/// Chainable pairing of a [`ResourceNode`] with the [`EventBus`] handle.
///
/// This is the explicit context object threaded through registration calls;
/// the bus is never reached through ambient state.
#[derive(Clone)]
pub struct NodeBuilder {
    node: ResourceNode,
    bus: EventBus,
}

impl NodeBuilder {
    /// Declares a root resource bound to `bus`.
    pub fn root(name: impl Into<String>, bus: EventBus) -> Self {
        Self {
            node: ResourceNode::root(name),
            bus,
        }
    }

    /// Declares a child resource sharing this builder's bus.
    pub fn child(&self, name: impl Into<String>) -> NodeBuilder {
        Self {
            node: self.node.child(name),
            bus: self.bus.clone(),
        }
    }

    pub fn node(&self) -> &ResourceNode {
        &self.node
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Registers a kind-specific client factory and a consumer handler, per
    /// the two-step contract described at the module level.
    ///
    /// `marker` is the kind tag guarding listener attachment. `factory` runs
    /// on every readiness firing: it resolves connection information, builds
    /// the client (possibly via a remote create-if-missing round trip), and
    /// returns the typed event to publish. `handler` is subscribed
    /// unconditionally and receives each published event together with a
    /// cancellation token.
    pub fn on_ready<E, F, FFut, H, HFut>(&self, marker: &'static str, factory: F, handler: H) -> &Self
    where
        E: ReadyEvent,
        F: Fn(ResourceNode, CancellationToken) -> FFut + Send + Sync + 'static,
        FFut: Future<Output = Result<E, ReadyError>> + Send + 'static,
        H: Fn(Arc<E>, CancellationToken) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        if self.node.annotations().mark(marker) {
            let bus = self.bus.clone();
            let factory = Arc::new(factory);
            self.node.add_ready_listener(Arc::new(move |node, token| {
                let bus = bus.clone();
                let factory = Arc::clone(&factory);
                Box::pin(async move {
                    debug!(
                        resource = %node.name(),
                        event = E::event_name(),
                        "constructing client"
                    );
                    let event = match factory(node.clone(), token.clone()).await {
                        Ok(event) => event,
                        Err(error) => {
                            warn!(
                                resource = %node.name(),
                                event = E::event_name(),
                                error = %error,
                                "client construction failed"
                            );
                            return Err(error);
                        }
                    };
                    bus.publish(event, &token).await?;
                    info!(
                        resource = %node.name(),
                        event = E::event_name(),
                        "published"
                    );
                    Ok(())
                })
            }));
        }
        self.bus.subscribe::<E, H, HFut>(&self.node, handler);
        self
    }
}
