//! Shared behavior for the emulated service clients.
//!
//! The real SDKs' wire protocols are opaque collaborators; the clients in
//! this crate capture exactly what a handler needs to talk to the service
//! (root connection string plus descent path) and model the one remote call
//! some factories make before publishing.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Errors raised by the kind-specific clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("remote call was cancelled")]
    Cancelled,
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
}

/// Clients whose construction involves a remote existence-check-and-create
/// round trip before they are handed to subscribers.
#[async_trait]
pub trait RemoteInit {
    /// Issues the create-if-missing call for the backing resource. Aborts
    /// (without retry) when the token is cancelled.
    async fn create_if_missing(&self, token: &CancellationToken) -> Result<(), ClientError>;
}

/// Rejects descriptors no client could dial.
pub(crate) fn validate_connection_string(value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidConnectionString(
            "descriptor is empty".to_string(),
        ));
    }
    Ok(())
}
