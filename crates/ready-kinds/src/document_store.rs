//! # Document Store Kind
//!
//! Account -> database -> container, the deepest hierarchy in the set. The
//! container sits two levels below the account, so its factory demonstrates
//! the full "resolve root, descend by name" policy: one account client is
//! constructed from the *account's* descriptor, then navigated down by
//! database name and container name. The object graph mirrors the resource
//! hierarchy exactly.

use std::future::Future;
use std::sync::Arc;

use ready_broker::{resolve_connection, BoxError, EventBus, NodeBuilder, ReadyError, ResourceNode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{validate_connection_string, ClientError};
use crate::events::ready_event;

const CLIENT_READY: &str = "document-store/client-ready";
const DATABASE_READY: &str = "document-store/database-ready";
const CONTAINER_READY: &str = "document-store/container-ready";

/// Root client for a document-store account.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentStoreClient {
    connection_string: String,
}

impl DocumentStoreClient {
    pub fn connect(connection_string: &str) -> Result<Self, ClientError> {
        validate_connection_string(connection_string)?;
        Ok(Self {
            connection_string: connection_string.to_string(),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Navigates to a database by name. Purely local; the database is
    /// provisioned by the host, not by this client.
    pub fn database(&self, name: &str) -> DocumentDatabase {
        DocumentDatabase {
            connection_string: self.connection_string.clone(),
            name: name.to_string(),
        }
    }
}

/// Named database under an account.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentDatabase {
    connection_string: String,
    name: String,
}

impl DocumentDatabase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self, name: &str) -> DocumentContainer {
        DocumentContainer {
            connection_string: self.connection_string.clone(),
            database: self.name.clone(),
            name: name.to_string(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.connection_string, self.name)
    }
}

/// Named container under a database.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentContainer {
    connection_string: String,
    database: String,
    name: String,
}

impl DocumentContainer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.connection_string, self.database, self.name)
    }
}

ready_event!(
    /// The account's client is initialized and ready for use.
    DocumentStoreClientReady { client: DocumentStoreClient },
    "document-store-client-ready"
);

ready_event!(
    /// A database handle is initialized and ready for use.
    DocumentDatabaseReady { database: DocumentDatabase },
    "document-store-database-ready"
);

ready_event!(
    /// A container handle is initialized and ready for use.
    DocumentContainerReady { container: DocumentContainer },
    "document-store-container-ready"
);

/// Builder for the account (root) resource.
#[derive(Clone)]
pub struct DocumentStoreBuilder {
    inner: NodeBuilder,
}

impl DocumentStoreBuilder {
    pub fn new(name: &str, bus: EventBus) -> Self {
        Self {
            inner: NodeBuilder::root(name, bus),
        }
    }

    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_database(&self, name: &str) -> DocumentDatabaseBuilder {
        DocumentDatabaseBuilder {
            inner: self.inner.child(name),
        }
    }

    /// Registers `handler` for the account's client-ready event. Idempotent
    /// per node: the factory is attached once, the handler every time.
    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<DocumentStoreClientReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            CLIENT_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = DocumentStoreClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                Ok(DocumentStoreClientReady::new(node, client))
            },
            handler,
        );
        self
    }
}

/// Builder for a database under an account.
#[derive(Clone)]
pub struct DocumentDatabaseBuilder {
    inner: NodeBuilder,
}

impl DocumentDatabaseBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_container(&self, name: &str) -> DocumentContainerBuilder {
        DocumentContainerBuilder {
            inner: self.inner.child(name),
        }
    }

    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<DocumentDatabaseReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            DATABASE_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = DocumentStoreClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let database = match resolved.path.as_slice() {
                    [database] => client.database(database),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!("expected account/database chain, got depth {}", other.len()),
                        ))
                    }
                };
                Ok(DocumentDatabaseReady::new(node, database))
            },
            handler,
        );
        self
    }
}

/// Builder for a container under a database.
#[derive(Clone)]
pub struct DocumentContainerBuilder {
    inner: NodeBuilder,
}

impl DocumentContainerBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<DocumentContainerReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            CONTAINER_READY,
            |node, token| async move {
                // Resolution walks to the account, not the database: the
                // grandchild still gets exactly one root-facing client.
                let resolved = resolve_connection(&node, &token).await?;
                let client = DocumentStoreClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let container = match resolved.path.as_slice() {
                    [database, container] => client.database(database).container(container),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!(
                                "expected account/database/container chain, got depth {}",
                                other.len()
                            ),
                        ))
                    }
                };
                Ok(DocumentContainerReady::new(node, container))
            },
            handler,
        );
        self
    }
}
