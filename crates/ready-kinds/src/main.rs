//! End-to-end demo: four resource families on one bus.
//!
//! Builds the topology, registers a handler at every level, then plays the
//! host's provision-and-signal sequence parent-first. Run with
//! `RUST_LOG=info` to watch the readiness events flow.

use std::sync::Arc;

use ready_broker::{telemetry, ReadyError};
use ready_kinds::blob_store::{BlobContainerReady, BlobStoreBuilder};
use ready_kinds::document_db::{DocumentDbBuilder, DocumentDbDatabaseReady};
use ready_kinds::document_store::{
    DocumentContainerReady, DocumentDatabaseReady, DocumentStoreBuilder, DocumentStoreClientReady,
};
use ready_kinds::lifecycle::EmulatedHost;
use ready_kinds::message_broker::{
    MessageBrokerBuilder, QueueSenderReady, SubscriptionReceiverReady, TopicSenderReady,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ReadyError> {
    telemetry::setup_tracing();

    let host = EmulatedHost::new();

    // --- Document store: account -> database -> container ---
    let cosmos = DocumentStoreBuilder::new("cosmos-db", host.bus());
    let database = cosmos.add_database("my-database");
    let container = database.add_container("my-container");

    cosmos.on_client_ready(|event: Arc<DocumentStoreClientReady>, _token| async move {
        info!(endpoint = event.client().connection_string(), "document store online");
        Ok(())
    });
    database.on_client_ready(|event: Arc<DocumentDatabaseReady>, _token| async move {
        info!(path = event.database().path(), "database online");
        Ok(())
    });
    container.on_client_ready(|event: Arc<DocumentContainerReady>, _token| async move {
        info!(path = event.container().path(), "container online");
        Ok(())
    });

    // --- Document database: server -> database ---
    let mongo = DocumentDbBuilder::new("mongo-db", host.bus());
    let mongo_database = mongo.add_database("my-mongo-database");

    mongo_database.on_client_ready(|event: Arc<DocumentDbDatabaseReady>, _token| async move {
        info!(path = event.database().path(), "mongo database online");
        Ok(())
    });

    // --- Message broker: namespace -> queue, topic -> subscriptions ---
    let broker = MessageBrokerBuilder::new("demo-bus", host.bus());
    let orders = broker.add_queue("orders");
    let notifications = broker.add_topic("notifications");
    let email_alerts = notifications.add_subscription("email-alerts");
    let sms_alerts = notifications.add_subscription("sms-alerts");

    orders.on_sender_ready(|event: Arc<QueueSenderReady>, _token| async move {
        info!(path = event.sender().path(), "queue sender online");
        Ok(())
    });
    notifications.on_sender_ready(|event: Arc<TopicSenderReady>, _token| async move {
        info!(path = event.sender().path(), "topic sender online");
        Ok(())
    });
    for subscription in [&email_alerts, &sms_alerts] {
        subscription.on_receiver_ready(
            |event: Arc<SubscriptionReceiverReady>, _token| async move {
                info!(path = event.receiver().path(), "subscription receiver online");
                Ok(())
            },
        );
    }

    // --- Blob store: account -> container ---
    let storage = BlobStoreBuilder::new("azure-storage", host.bus());
    let blobs = storage.add_blob_container("my-blob-container");

    blobs.on_client_ready(|event: Arc<BlobContainerReady>, _token| async move {
        info!(
            path = event.client().path(),
            created = event.client().was_created(),
            "blob container online"
        );
        Ok(())
    });

    // Host side: provision roots, then walk readiness down each tree.
    host.start_root(cosmos.node(), "cosmos://localhost:8081").await?;
    host.signal_ready(database.node()).await?;
    host.signal_ready(container.node()).await?;

    host.start_root(mongo.node(), "mongodb://localhost:27017").await?;
    host.signal_ready(mongo_database.node()).await?;

    host.start_root(broker.node(), "amqp://localhost:5672").await?;
    host.signal_ready(orders.node()).await?;
    host.signal_ready(notifications.node()).await?;
    host.signal_ready(email_alerts.node()).await?;
    host.signal_ready(sms_alerts.node()).await?;

    host.start_root(storage.node(), "blob://127.0.0.1:10000").await?;
    host.signal_ready(blobs.node()).await?;

    host.shutdown();
    info!("all resources delivered, shutting down");
    Ok(())
}
