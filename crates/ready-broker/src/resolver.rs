//! # Connection Resolver
//!
//! One generalized "resolve root, then descend by name" walk shared by every
//! resource kind, instead of ad hoc parent-chain hopping duplicated per kind.
//!
//! Resolution always starts from the deepest ancestor with no parent: even a
//! grandchild (container under database under account) yields the *account's*
//! connection descriptor plus the names needed to navigate down from there.
//! That guarantees a single network-facing client object per resolution and
//! an object graph that mirrors the resource hierarchy.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ReadyError;
use crate::node::ResourceNode;

/// Everything a client factory needs: the root ancestor's connection
/// descriptor and the descent path to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConnection {
    /// Connection descriptor of the node's root ancestor.
    pub connection_string: String,
    /// Names of the resources between the root (exclusive) and the node
    /// (inclusive), shallowest first. Empty for root nodes.
    pub path: Vec<String>,
}

impl ResolvedConnection {
    /// Renders `connection/child/grandchild`, the canonical form used in
    /// logs and in path-equivalence assertions.
    pub fn endpoint(&self) -> String {
        let mut out = self.connection_string.clone();
        for segment in &self.path {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

/// Resolves the connection information for `node`.
///
/// Walks up to the root, awaits the root's connection descriptor (waiting is
/// cancellable; a failed descriptor fails immediately), and returns the
/// descriptor together with the descent path. If resolution fails the caller
/// must not construct a client or publish an event for this firing.
pub async fn resolve_connection(
    node: &ResourceNode,
    token: &CancellationToken,
) -> Result<ResolvedConnection, ReadyError> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent().cloned() {
        path.push(current.name().to_string());
        current = parent;
    }
    path.reverse();

    let connection_string = current.connection_string(token).await?;
    debug!(
        resource = %node.name(),
        root = %current.name(),
        depth = path.len(),
        "connection resolved"
    );
    Ok(ResolvedConnection {
        connection_string,
        path,
    })
}
