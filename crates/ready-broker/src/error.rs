//! # Broker Errors
//!
//! This module defines the common error types used throughout the readiness
//! broker. By centralizing error definitions, we ensure consistent error
//! handling across the resolver, the factories, and the event bus.
//!
//! Every failure here is single-attempt and fail-fast: the broker never
//! retries a resolution, a factory run, or a handler. Retried provisioning is
//! the orchestration host's responsibility.

/// Boxed error payload produced by consumer-supplied handlers and by the
/// kind-specific client factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while delivering a readiness event.
#[derive(Debug, thiserror::Error)]
pub enum ReadyError {
    /// An ancestor's connection descriptor was marked failed by the host.
    #[error("provisioning of '{resource}' failed: {reason}")]
    ProvisioningFailed { resource: String, reason: String },

    /// The connection descriptor slot was dropped before it was populated.
    #[error("connection descriptor for '{resource}' is unavailable")]
    DescriptorUnavailable { resource: String },

    /// The cancellation token fired while the operation was in flight.
    #[error("operation was cancelled")]
    Cancelled,

    /// The kind-specific client factory failed to construct a client.
    #[error("client factory for '{resource}' failed")]
    Factory {
        resource: String,
        #[source]
        source: BoxError,
    },

    /// A single subscriber's handler failed during publish.
    #[error("subscriber for '{event}' on '{resource}' failed")]
    Subscriber {
        resource: String,
        event: &'static str,
        #[source]
        source: BoxError,
    },

    /// One or more operations in a fan-out failed. Sibling operations still
    /// ran to completion; their failures are collected here.
    #[error("{failed} of {total} {operation} failed for '{resource}'")]
    Aggregate {
        resource: String,
        operation: &'static str,
        total: usize,
        failed: usize,
        errors: Vec<ReadyError>,
    },
}

impl ReadyError {
    /// Wraps a kind-specific construction failure.
    pub fn factory(resource: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ReadyError::Factory {
            resource: resource.into(),
            source: source.into(),
        }
    }

    /// Folds per-operation failures into a single aggregate error, or `Ok(())`
    /// when nothing failed.
    pub(crate) fn aggregate(
        resource: &str,
        operation: &'static str,
        total: usize,
        errors: Vec<ReadyError>,
    ) -> Result<(), ReadyError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ReadyError::Aggregate {
                resource: resource.to_string(),
                operation,
                total,
                failed: errors.len(),
                errors,
            })
        }
    }
}
