//! # Document Database Kind
//!
//! Server -> database, one level of nesting. Unlike the document store, the
//! database handle here is the unit consumers care about; most applications
//! never touch the server client directly.

use std::future::Future;
use std::sync::Arc;

use ready_broker::{resolve_connection, BoxError, EventBus, NodeBuilder, ReadyError, ResourceNode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{validate_connection_string, ClientError};
use crate::events::ready_event;

const CLIENT_READY: &str = "document-db/client-ready";
const DATABASE_READY: &str = "document-db/database-ready";

/// Root client for a document-database server.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentDbClient {
    connection_string: String,
}

impl DocumentDbClient {
    pub fn connect(connection_string: &str) -> Result<Self, ClientError> {
        validate_connection_string(connection_string)?;
        Ok(Self {
            connection_string: connection_string.to_string(),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn database(&self, name: &str) -> DocumentDbDatabase {
        DocumentDbDatabase {
            connection_string: self.connection_string.clone(),
            name: name.to_string(),
        }
    }
}

/// Named database on a server.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentDbDatabase {
    connection_string: String,
    name: String,
}

impl DocumentDbDatabase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.connection_string, self.name)
    }
}

ready_event!(
    /// The server's client is initialized and ready for use.
    DocumentDbClientReady { client: DocumentDbClient },
    "document-db-client-ready"
);

ready_event!(
    /// A database handle is initialized and ready for use.
    DocumentDbDatabaseReady { database: DocumentDbDatabase },
    "document-db-database-ready"
);

/// Builder for the server (root) resource.
#[derive(Clone)]
pub struct DocumentDbBuilder {
    inner: NodeBuilder,
}

impl DocumentDbBuilder {
    pub fn new(name: &str, bus: EventBus) -> Self {
        Self {
            inner: NodeBuilder::root(name, bus),
        }
    }

    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_database(&self, name: &str) -> DocumentDbDatabaseBuilder {
        DocumentDbDatabaseBuilder {
            inner: self.inner.child(name),
        }
    }

    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<DocumentDbClientReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            CLIENT_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = DocumentDbClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                Ok(DocumentDbClientReady::new(node, client))
            },
            handler,
        );
        self
    }
}

/// Builder for a database under a server.
#[derive(Clone)]
pub struct DocumentDbDatabaseBuilder {
    inner: NodeBuilder,
}

impl DocumentDbDatabaseBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<DocumentDbDatabaseReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            DATABASE_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = DocumentDbClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let database = match resolved.path.as_slice() {
                    [database] => client.database(database),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!("expected server/database chain, got depth {}", other.len()),
                        ))
                    }
                };
                Ok(DocumentDbDatabaseReady::new(node, database))
            },
            handler,
        );
        self
    }
}
