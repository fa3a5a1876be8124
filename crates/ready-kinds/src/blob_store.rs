//! # Blob Store Kind
//!
//! Account -> container, the one kind whose factory makes a remote call
//! before publishing: the container is created on the service if it does not
//! already exist, so subscribers receive a handle they can write to
//! immediately.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ready_broker::{resolve_connection, BoxError, EventBus, NodeBuilder, ReadyError, ResourceNode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{validate_connection_string, ClientError, RemoteInit};
use crate::events::ready_event;

const CONTAINER_READY: &str = "blob-store/container-ready";

/// Handle to one blob container, pre-created by the readiness factory.
#[derive(Clone, Debug, Serialize)]
pub struct BlobContainerClient {
    connection_string: String,
    container: String,
    #[serde(skip)]
    created: Arc<AtomicBool>,
}

impl BlobContainerClient {
    pub fn connect(connection_string: &str, container: &str) -> Result<Self, ClientError> {
        validate_connection_string(connection_string)?;
        Ok(Self {
            connection_string: connection_string.to_string(),
            container: container.to_string(),
            created: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.connection_string, self.container)
    }

    /// Whether the create-if-missing round trip has completed.
    pub fn was_created(&self) -> bool {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteInit for BlobContainerClient {
    async fn create_if_missing(&self, token: &CancellationToken) -> Result<(), ClientError> {
        if token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        // Emulated round trip; a real SDK would dial the account here.
        tokio::task::yield_now().await;
        self.created.store(true, Ordering::SeqCst);
        Ok(())
    }
}

ready_event!(
    /// The container exists on the service and its client is ready for use.
    BlobContainerReady { client: BlobContainerClient },
    "blob-container-ready"
);

/// Builder for the storage account (root) resource.
#[derive(Clone)]
pub struct BlobStoreBuilder {
    inner: NodeBuilder,
}

impl BlobStoreBuilder {
    pub fn new(name: &str, bus: EventBus) -> Self {
        Self {
            inner: NodeBuilder::root(name, bus),
        }
    }

    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_blob_container(&self, name: &str) -> BlobContainerBuilder {
        BlobContainerBuilder {
            inner: self.inner.child(name),
        }
    }
}

/// Builder for a blob container under an account.
#[derive(Clone)]
pub struct BlobContainerBuilder {
    inner: NodeBuilder,
}

impl BlobContainerBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    /// The container is created on the service before the event goes out, so
    /// handlers never race the first write against provisioning.
    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<BlobContainerReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            CONTAINER_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = match resolved.path.as_slice() {
                    [container] => {
                        BlobContainerClient::connect(&resolved.connection_string, container)
                            .map_err(|e| ReadyError::factory(node.name(), e))?
                    }
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!("expected account/container chain, got depth {}", other.len()),
                        ))
                    }
                };
                client
                    .create_if_missing(&token)
                    .await
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                Ok(BlobContainerReady::new(node, client))
            },
            handler,
        );
        self
    }
}
