//! # Observability & Tracing
//!
//! Structured logging setup shared by the broker's consumers.
//!
//! The broker itself only emits `tracing` events; this module wires up a
//! subscriber for binaries that want to see them. The compact format hides
//! the crate/module prefix (`with_target(false)`) because the interesting
//! context is already carried by the structured `resource` and `event`
//! fields.
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle: ready / published
//! RUST_LOG=debug cargo run     # plus subscriptions, resolution, publishes
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
