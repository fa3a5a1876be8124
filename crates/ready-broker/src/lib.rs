//! # Readiness Broker
//!
//! This crate augments a resource-orchestration model with a mechanism to
//! deliver a freshly constructed, ready-to-use client handle to interested
//! consumers exactly once per resource, at the moment the underlying
//! resource becomes usable.
//!
//! ## Architecture Overview
//!
//! The broker separates concerns into four pieces:
//!
//! 1. **Topology** ([`ResourceNode`]): a rooted forest of named resources
//!    (server -> database -> container), each with a lazily populated
//!    connection descriptor and a readiness signal fired by the host.
//! 2. **Resolution** ([`resolve_connection`]): one generalized walk that
//!    always starts from the deepest ancestor and descends by name, so a
//!    single network-facing client is constructed per resolution.
//! 3. **Dispatch** ([`EventBus`]): typed publish/subscribe scoped to
//!    `(node, event type)`; publish awaits all current subscribers and
//!    aggregates their failures instead of swallowing them.
//! 4. **Registration** ([`NodeBuilder::on_ready`]): the idempotent entry
//!    point: N calls attach exactly one client factory but N independent
//!    subscribers, all of which receive the single resulting event.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ready_broker::{
//!     resolve_connection, EventBus, NodeBuilder, ReadyError, ReadyEvent, ResourceNode,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! // A kind-specific event: the node that became ready plus its client.
//! #[derive(Clone)]
//! struct CacheClientReady {
//!     resource: ResourceNode,
//!     endpoint: String,
//! }
//!
//! impl ReadyEvent for CacheClientReady {
//!     fn resource(&self) -> &ResourceNode {
//!         &self.resource
//!     }
//!
//!     fn event_name() -> &'static str {
//!         "cache-client-ready"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ReadyError> {
//!     let bus = EventBus::new();
//!     let cache = NodeBuilder::root("cache", bus.clone());
//!
//!     cache.on_ready(
//!         "cache/client-ready",
//!         // Factory: runs once per readiness firing.
//!         |node, token| async move {
//!             let resolved = resolve_connection(&node, &token).await?;
//!             Ok(CacheClientReady {
//!                 resource: node,
//!                 endpoint: resolved.endpoint(),
//!             })
//!         },
//!         // Handler: receives the constructed client.
//!         |event: Arc<CacheClientReady>, _token| async move {
//!             assert_eq!(event.endpoint, "redis://localhost");
//!             Ok(())
//!         },
//!     );
//!
//!     // Host side: provision, then fire the readiness signal.
//!     let token = CancellationToken::new();
//!     cache.node().set_connection_string("redis://localhost");
//!     cache.node().notify_ready(&token).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery Semantics
//!
//! - Handlers for one `(node, event type)` run in registration order.
//! - No replay: subscribing after a publish completed delivers nothing.
//! - Repeat readiness firings re-run the factory and re-publish; the
//!   annotation guard only prevents attaching the listener twice, it is not
//!   a single-fire latch. Resources that flap between un-ready and ready
//!   therefore deliver more than one event, deliberately.
//! - No retries anywhere: a failed resolution or construction surfaces as
//!   the error returned by [`ResourceNode::notify_ready`] and that firing
//!   publishes nothing.
//!
//! ## Testing
//!
//! The [`mock`] module ships a [`ReadyProbe`] for asserting on delivery
//! order and counts without sleeping or polling; see the integration tests
//! of this crate for the patterns.

pub mod annotations;
pub mod bus;
pub mod error;
pub mod mock;
pub mod node;
pub mod registration;
pub mod resolver;
pub mod telemetry;

// Re-export core types for convenience
pub use annotations::AnnotationStore;
pub use bus::{BoxFuture, EventBus, ReadyEvent};
pub use error::{BoxError, ReadyError};
pub use mock::ReadyProbe;
pub use node::{NodeId, ResourceNode};
pub use registration::NodeBuilder;
pub use resolver::{resolve_connection, ResolvedConnection};
