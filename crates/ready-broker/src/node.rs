//! # Resource Node
//!
//! This module defines the `ResourceNode`, the broker's view of one entity in
//! the provisioning hierarchy (a server, a database, a queue, ...). Nodes form
//! a rooted forest: every node has a stable name, an optional parent, a
//! lazily populated connection descriptor, an [`AnnotationStore`], and a list
//! of readiness listeners.
//!
//! # Host Boundary
//! The orchestration host is an external collaborator. Its surface on a node
//! is exactly three methods: [`ResourceNode::set_connection_string`] /
//! [`ResourceNode::fail_provisioning`] (descriptor population) and
//! [`ResourceNode::notify_ready`] (the readiness signal). Everything else on
//! this type is consumed by the broker itself.
//!
//! # Concurrency Model
//! A node is a cheap-to-clone handle over shared state. The descriptor slot
//! is a `watch` channel so any number of resolutions can wait on it; the
//! listener list is snapshotted before firing so registration during a firing
//! never deadlocks or loses updates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::annotations::AnnotationStore;
use crate::bus::BoxFuture;
use crate::error::ReadyError;

/// Process-unique identity of a resource node. The event bus indexes
/// subscriptions by this id plus the event type; it never owns the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a node's connection descriptor, driven by the host.
#[derive(Debug, Clone)]
enum ConnectionState {
    Pending,
    Available(String),
    Failed(String),
}

/// Listener attached to a node's readiness signal. Runs once per firing.
pub(crate) type ReadyListener =
    Arc<dyn Fn(ResourceNode, CancellationToken) -> BoxFuture<Result<(), ReadyError>> + Send + Sync>;

/// A named entity in the provisioning hierarchy.
///
/// Created during topology declaration, before any readiness signal can fire;
/// never reparented; destroyed with the application.
#[derive(Clone)]
pub struct ResourceNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    id: NodeId,
    name: String,
    parent: Option<ResourceNode>,
    connection: watch::Sender<ConnectionState>,
    annotations: AnnotationStore,
    listeners: Mutex<Vec<ReadyListener>>,
}

impl ResourceNode {
    /// Declares a root node (no parent).
    pub fn root(name: impl Into<String>) -> Self {
        Self::new(name.into(), None)
    }

    /// Declares a child of this node. The child's name must be unique within
    /// this node's scope; the broker does not enforce that, the host does.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(name.into(), Some(self.clone()))
    }

    fn new(name: String, parent: Option<ResourceNode>) -> Self {
        let (connection, _) = watch::channel(ConnectionState::Pending);
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
                name,
                parent,
                connection,
                annotations: AnnotationStore::new(),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&ResourceNode> {
        self.inner.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// The node's idempotency guard.
    pub fn annotations(&self) -> &AnnotationStore {
        &self.inner.annotations
    }

    // --- Host-side provisioning surface ---

    /// Populates the connection descriptor. Called by the host once the
    /// underlying resource has an address.
    pub fn set_connection_string(&self, value: impl Into<String>) {
        let value = value.into();
        debug!(resource = %self.name(), "connection descriptor available");
        self.inner
            .connection
            .send_replace(ConnectionState::Available(value));
    }

    /// Marks provisioning of this node as failed. Every pending and future
    /// descriptor resolution fails immediately.
    pub fn fail_provisioning(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(resource = %self.name(), reason = %reason, "provisioning failed");
        self.inner
            .connection
            .send_replace(ConnectionState::Failed(reason));
    }

    /// Resolves this node's own connection descriptor.
    ///
    /// Waits until the host populates the slot (the host provisions ancestors
    /// before signalling descendants, so the wait is bounded under correct
    /// ordering), fails fast on a failed slot, and honors cancellation.
    pub async fn connection_string(
        &self,
        token: &CancellationToken,
    ) -> Result<String, ReadyError> {
        let mut rx = self.inner.connection.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                match &*state {
                    ConnectionState::Available(value) => return Ok(value.clone()),
                    ConnectionState::Failed(reason) => {
                        return Err(ReadyError::ProvisioningFailed {
                            resource: self.name().to_string(),
                            reason: reason.clone(),
                        })
                    }
                    ConnectionState::Pending => {}
                }
            }
            tokio::select! {
                _ = token.cancelled() => return Err(ReadyError::Cancelled),
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Err(ReadyError::DescriptorUnavailable {
                            resource: self.name().to_string(),
                        });
                    }
                }
            }
        }
    }

    // --- Readiness signal ---

    /// Attaches a listener that runs on every readiness firing. Gated by the
    /// annotation store, so at most one listener per kind tag is ever added.
    pub(crate) fn add_ready_listener(&self, listener: ReadyListener) {
        self.inner.listeners.lock().unwrap().push(listener);
        debug!(resource = %self.name(), "readiness listener attached");
    }

    /// Host boundary: fires the readiness signal for this node.
    ///
    /// Runs all currently attached listeners sequentially in attachment
    /// order. A failing listener does not prevent the others from running;
    /// failures are collected and returned as one aggregate error, which is
    /// the channel through which factory and handler failures surface to the
    /// host. Repeat firings re-run the listeners: a node that flaps between
    /// un-ready and ready publishes again each time.
    pub async fn notify_ready(&self, token: &CancellationToken) -> Result<(), ReadyError> {
        let listeners: Vec<ReadyListener> = self.inner.listeners.lock().unwrap().clone();
        info!(
            resource = %self.name(),
            listeners = listeners.len(),
            "resource ready"
        );

        let total = listeners.len();
        let mut errors = Vec::new();
        for listener in listeners {
            if token.is_cancelled() {
                errors.push(ReadyError::Cancelled);
                break;
            }
            if let Err(error) = listener(self.clone(), token.clone()).await {
                warn!(resource = %self.name(), error = %error, "readiness listener failed");
                errors.push(error);
            }
        }
        ReadyError::aggregate(self.name(), "readiness listener(s)", total, errors)
    }
}

impl fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceNode")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.inner.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl PartialEq for ResourceNode {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ResourceNode {}
