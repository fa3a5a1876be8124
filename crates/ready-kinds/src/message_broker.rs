//! # Message Broker Kind
//!
//! Namespace -> queue | topic -> subscription. The only kind with two node
//! flavors at the same depth and a three-level receive path: a subscription
//! receiver needs both the topic name (its parent) and its own name, which
//! is exactly what the resolved descent path provides.

use std::future::Future;
use std::sync::Arc;

use ready_broker::{resolve_connection, BoxError, EventBus, NodeBuilder, ReadyError, ResourceNode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{validate_connection_string, ClientError};
use crate::events::ready_event;

const CLIENT_READY: &str = "message-broker/client-ready";
const QUEUE_SENDER_READY: &str = "message-broker/queue-sender-ready";
const TOPIC_SENDER_READY: &str = "message-broker/topic-sender-ready";
const SUBSCRIPTION_RECEIVER_READY: &str = "message-broker/subscription-receiver-ready";

/// Root client for a broker namespace.
#[derive(Clone, Debug, Serialize)]
pub struct MessageBrokerClient {
    connection_string: String,
}

impl MessageBrokerClient {
    pub fn connect(connection_string: &str) -> Result<Self, ClientError> {
        validate_connection_string(connection_string)?;
        Ok(Self {
            connection_string: connection_string.to_string(),
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn queue_sender(&self, queue: &str) -> Sender {
        Sender {
            connection_string: self.connection_string.clone(),
            entity: queue.to_string(),
        }
    }

    pub fn topic_sender(&self, topic: &str) -> Sender {
        Sender {
            connection_string: self.connection_string.clone(),
            entity: topic.to_string(),
        }
    }

    pub fn subscription_receiver(&self, topic: &str, subscription: &str) -> Receiver {
        Receiver {
            connection_string: self.connection_string.clone(),
            topic: topic.to_string(),
            subscription: subscription.to_string(),
        }
    }
}

/// Send-side handle, addressed to one queue or topic.
#[derive(Clone, Debug, Serialize)]
pub struct Sender {
    connection_string: String,
    entity: String,
}

impl Sender {
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.connection_string, self.entity)
    }
}

/// Receive-side handle, addressed to one subscription of a topic.
#[derive(Clone, Debug, Serialize)]
pub struct Receiver {
    connection_string: String,
    topic: String,
    subscription: String,
}

impl Receiver {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscription(&self) -> &str {
        &self.subscription
    }

    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.connection_string, self.topic, self.subscription)
    }
}

ready_event!(
    /// The namespace's client is initialized and ready for use.
    MessageBrokerClientReady { client: MessageBrokerClient },
    "message-broker-client-ready"
);

ready_event!(
    /// A queue's sender is initialized and ready for use.
    QueueSenderReady { sender: Sender },
    "queue-sender-ready"
);

ready_event!(
    /// A topic's sender is initialized and ready for use.
    TopicSenderReady { sender: Sender },
    "topic-sender-ready"
);

ready_event!(
    /// A subscription's receiver is initialized and ready for use.
    SubscriptionReceiverReady { receiver: Receiver },
    "subscription-receiver-ready"
);

/// Builder for the namespace (root) resource.
#[derive(Clone)]
pub struct MessageBrokerBuilder {
    inner: NodeBuilder,
}

impl MessageBrokerBuilder {
    pub fn new(name: &str, bus: EventBus) -> Self {
        Self {
            inner: NodeBuilder::root(name, bus),
        }
    }

    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_queue(&self, name: &str) -> QueueBuilder {
        QueueBuilder {
            inner: self.inner.child(name),
        }
    }

    pub fn add_topic(&self, name: &str) -> TopicBuilder {
        TopicBuilder {
            inner: self.inner.child(name),
        }
    }

    pub fn on_client_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<MessageBrokerClientReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            CLIENT_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = MessageBrokerClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                Ok(MessageBrokerClientReady::new(node, client))
            },
            handler,
        );
        self
    }
}

/// Builder for a queue under a namespace.
#[derive(Clone)]
pub struct QueueBuilder {
    inner: NodeBuilder,
}

impl QueueBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn on_sender_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<QueueSenderReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            QUEUE_SENDER_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = MessageBrokerClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let sender = match resolved.path.as_slice() {
                    [queue] => client.queue_sender(queue),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!("expected namespace/queue chain, got depth {}", other.len()),
                        ))
                    }
                };
                Ok(QueueSenderReady::new(node, sender))
            },
            handler,
        );
        self
    }
}

/// Builder for a topic under a namespace.
#[derive(Clone)]
pub struct TopicBuilder {
    inner: NodeBuilder,
}

impl TopicBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn add_subscription(&self, name: &str) -> SubscriptionBuilder {
        SubscriptionBuilder {
            inner: self.inner.child(name),
        }
    }

    pub fn on_sender_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<TopicSenderReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            TOPIC_SENDER_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = MessageBrokerClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let sender = match resolved.path.as_slice() {
                    [topic] => client.topic_sender(topic),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!("expected namespace/topic chain, got depth {}", other.len()),
                        ))
                    }
                };
                Ok(TopicSenderReady::new(node, sender))
            },
            handler,
        );
        self
    }
}

/// Builder for a subscription under a topic.
#[derive(Clone)]
pub struct SubscriptionBuilder {
    inner: NodeBuilder,
}

impl SubscriptionBuilder {
    pub fn node(&self) -> &ResourceNode {
        self.inner.node()
    }

    pub fn on_receiver_ready<H, Fut>(&self, handler: H) -> &Self
    where
        H: Fn(Arc<SubscriptionReceiverReady>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.inner.on_ready(
            SUBSCRIPTION_RECEIVER_READY,
            |node, token| async move {
                let resolved = resolve_connection(&node, &token).await?;
                let client = MessageBrokerClient::connect(&resolved.connection_string)
                    .map_err(|e| ReadyError::factory(node.name(), e))?;
                let receiver = match resolved.path.as_slice() {
                    [topic, subscription] => client.subscription_receiver(topic, subscription),
                    other => {
                        return Err(ReadyError::factory(
                            node.name(),
                            format!(
                                "expected namespace/topic/subscription chain, got depth {}",
                                other.len()
                            ),
                        ))
                    }
                };
                Ok(SubscriptionReceiverReady::new(node, receiver))
            },
            handler,
        );
        self
    }
}
