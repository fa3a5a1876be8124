//! # Ready Kinds
//!
//! Four resource families built on the `ready-broker` crate, mirroring the
//! service shapes an orchestration host actually manages:
//!
//! - [`document_store`]: account -> database -> container, the deepest chain.
//! - [`document_db`]: server -> database.
//! - [`message_broker`]: namespace -> queues and topics -> subscriptions.
//! - [`blob_store`]: account -> container, with a create-if-missing call in
//!   the factory.
//!
//! Each family exposes builders whose `on_*_ready` methods register a client
//! factory (once per node) and a handler (every call), and an event type
//! carrying the constructed client. The [`lifecycle::EmulatedHost`] drives
//! provisioning and readiness for demos and tests.
//!
//! The binary in `main.rs` wires all four families into one topology and
//! runs the whole sequence end to end.

pub mod blob_store;
pub mod client;
pub mod document_db;
pub mod document_store;
pub mod lifecycle;
pub mod message_broker;

mod events;
