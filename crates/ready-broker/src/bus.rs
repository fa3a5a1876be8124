//! # Typed Event Bus
//!
//! Publish/subscribe primitive scoped to a resource node and an event type.
//!
//! # Architecture Note
//! The bus is an explicitly passed handle, not ambient state: registration
//! code receives a clone of it and threads it into the readiness listener it
//! attaches. Subscriptions are indexed by `(NodeId, TypeId)`, so a handler
//! for one node's event type never observes another node's events, and a
//! "queue ready" handler never observes a "topic ready" payload even on the
//! same node.
//!
//! # Delivery Contract
//! * Handlers attached to the same `(node, event type)` run in subscription
//!   order, one at a time; `publish` completes only after all of them have.
//! * A failing handler does not prevent its siblings from running; the
//!   failures are aggregated into the error `publish` returns.
//! * No replay: a handler subscribed after a publish has completed will never
//!   see that event. This is a deliberate simplicity trade-off, not a cache.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{BoxError, ReadyError};
use crate::node::{NodeId, ResourceNode};

/// Boxed future used for type-erased async callbacks.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A typed readiness event: the immutable payload delivered to subscribers
/// when a resource's client has been constructed.
pub trait ReadyEvent: Send + Sync + 'static {
    /// The node that became ready.
    fn resource(&self) -> &ResourceNode;

    /// Stable name used in logs and error reports.
    fn event_name() -> &'static str
    where
        Self: Sized;
}

type ErasedHandler = Arc<
    dyn Fn(Arc<dyn Any + Send + Sync>, CancellationToken) -> BoxFuture<Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Cheap-to-clone handle over a shared subscriber table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    subscribers: Mutex<HashMap<(NodeId, TypeId), Vec<ErasedHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of type `E` on `node`.
    ///
    /// Multiple handlers may be attached to the same pair; they will be
    /// invoked in the order they were added here.
    pub fn subscribe<E, H, Fut>(&self, node: &ResourceNode, handler: H)
    where
        E: ReadyEvent,
        H: Fn(Arc<E>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |event, token| {
            match event.downcast::<E>() {
                Ok(event) => Box::pin(handler(event, token)),
                // The table key includes the TypeId, so a mismatch cannot
                // reach a subscriber; swallow rather than panic.
                Err(_) => Box::pin(async { Ok(()) }),
            }
        });

        let key = (node.id(), TypeId::of::<E>());
        let mut table = self.inner.subscribers.lock().unwrap();
        let entry = table.entry(key).or_default();
        entry.push(erased);
        debug!(
            resource = %node.name(),
            event = E::event_name(),
            subscribers = entry.len(),
            "subscribed"
        );
    }

    /// Delivers `event` to every handler currently subscribed to
    /// `(event.resource(), E)`.
    ///
    /// The subscriber list is snapshotted up front: handlers added while the
    /// publish is in flight wait for the next event. Completes only after all
    /// snapshotted handlers have run (or failed); checks cancellation between
    /// handlers and hands each handler a clone of `token`.
    pub async fn publish<E: ReadyEvent>(
        &self,
        event: E,
        token: &CancellationToken,
    ) -> Result<(), ReadyError> {
        let resource = event.resource().clone();
        let key = (resource.id(), TypeId::of::<E>());
        let handlers: Vec<ErasedHandler> = self
            .inner
            .subscribers
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default();

        debug!(
            resource = %resource.name(),
            event = E::event_name(),
            handlers = handlers.len(),
            "publishing"
        );

        let payload: Arc<dyn Any + Send + Sync> = Arc::new(event);
        let total = handlers.len();
        let mut errors = Vec::new();
        for handler in handlers {
            if token.is_cancelled() {
                errors.push(ReadyError::Cancelled);
                break;
            }
            if let Err(source) = handler(Arc::clone(&payload), token.clone()).await {
                warn!(
                    resource = %resource.name(),
                    event = E::event_name(),
                    error = %source,
                    "subscriber failed"
                );
                errors.push(ReadyError::Subscriber {
                    resource: resource.name().to_string(),
                    event: E::event_name(),
                    source,
                });
            }
        }
        ReadyError::aggregate(resource.name(), "subscriber(s)", total, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ReadyProbe;

    #[derive(Clone)]
    struct PingReady {
        resource: ResourceNode,
    }

    impl ReadyEvent for PingReady {
        fn resource(&self) -> &ResourceNode {
            &self.resource
        }

        fn event_name() -> &'static str {
            "ping-ready"
        }
    }

    fn recording(probe: &ReadyProbe, label: &str) -> impl Fn(Arc<PingReady>, CancellationToken) -> BoxFuture<Result<(), BoxError>> {
        let probe = probe.clone();
        let label = label.to_string();
        move |_event, _token| {
            let probe = probe.clone();
            let label = label.clone();
            Box::pin(async move {
                probe.record(label);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = EventBus::new();
        let node = ResourceNode::root("ping");
        let token = CancellationToken::new();
        bus.publish(PingReady { resource: node }, &token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let node = ResourceNode::root("ping");
        let probe = ReadyProbe::new();
        bus.subscribe::<PingReady, _, _>(&node, recording(&probe, "first"));
        bus.subscribe::<PingReady, _, _>(&node, recording(&probe, "second"));
        bus.subscribe::<PingReady, _, _>(&node, recording(&probe, "third"));

        let token = CancellationToken::new();
        bus.publish(PingReady { resource: node }, &token)
            .await
            .unwrap();

        assert_eq!(probe.entries(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_siblings() {
        let bus = EventBus::new();
        let node = ResourceNode::root("ping");
        let probe = ReadyProbe::new();
        bus.subscribe::<PingReady, _, _>(&node, |_event, _token| async {
            Err::<(), BoxError>("boom".to_string().into())
        });
        bus.subscribe::<PingReady, _, _>(&node, recording(&probe, "survivor"));

        let token = CancellationToken::new();
        let err = bus
            .publish(PingReady { resource: node }, &token)
            .await
            .unwrap_err();

        assert_eq!(probe.entries(), vec!["survivor"]);
        match err {
            ReadyError::Aggregate { total, failed, .. } => {
                assert_eq!(total, 2);
                assert_eq!(failed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn late_subscriber_sees_nothing() {
        let bus = EventBus::new();
        let node = ResourceNode::root("ping");
        let probe = ReadyProbe::new();
        let token = CancellationToken::new();
        bus.publish(
            PingReady {
                resource: node.clone(),
            },
            &token,
        )
        .await
        .unwrap();

        bus.subscribe::<PingReady, _, _>(&node, recording(&probe, "late"));
        assert!(probe.entries().is_empty());
    }

    #[tokio::test]
    async fn events_are_scoped_to_their_node() {
        let bus = EventBus::new();
        let left = ResourceNode::root("left");
        let right = ResourceNode::root("right");
        let probe = ReadyProbe::new();
        bus.subscribe::<PingReady, _, _>(&right, recording(&probe, "right"));

        let token = CancellationToken::new();
        bus.publish(PingReady { resource: left }, &token)
            .await
            .unwrap();
        assert!(probe.entries().is_empty());
    }
}
