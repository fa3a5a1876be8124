//! Boilerplate shared by the per-kind readiness event payloads.
//!
//! Every kind publishes the same shape of event (the node that became ready
//! plus the constructed client/sender/receiver), so the struct, its
//! accessors, and the `ReadyEvent` impl are stamped out by one macro.

/// Defines a readiness event payload type.
///
/// `$field` doubles as the accessor name, so
/// `ready_event!(QueueSenderReady { sender: QueueSender }, "queue-sender-ready")`
/// yields a `QueueSenderReady` with a `sender()` accessor.
macro_rules! ready_event {
    ($(#[$meta:meta])* $event:ident { $field:ident : $client:ty }, $name:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $event {
            resource: ::ready_broker::ResourceNode,
            $field: $client,
        }

        impl $event {
            pub(crate) fn new(resource: ::ready_broker::ResourceNode, $field: $client) -> Self {
                Self { resource, $field }
            }

            /// The constructed client handle carried by this event.
            pub fn $field(&self) -> &$client {
                &self.$field
            }
        }

        impl ::ready_broker::ReadyEvent for $event {
            fn resource(&self) -> &::ready_broker::ResourceNode {
                &self.resource
            }

            fn event_name() -> &'static str {
                $name
            }
        }
    };
}

pub(crate) use ready_event;
