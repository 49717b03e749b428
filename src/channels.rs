//! Inter-task communication channels.
//!
//! `embassy-sync` bounded channels bridge threads that live outside the
//! executor (the MQTT receive thread, a resource transport) with the
//! async tasks inside it.  Statics, no heap allocation.
//!
//! ```text
//! ┌───────────────┐  BrokerEvent      ┌───────────────┐
//! │  MQTT rx      │──────────────────▶│ session task  │
//! │  (thread)     │                   │ (executor)    │
//! └───────────────┘                   └───────────────┘
//! ┌───────────────┐  ResourceRequest  ┌───────────────┐
//! │  resource     │──────────────────▶│ resource task │
//! │  transport    │◀──────────────────│ (executor)    │
//! └───────────────┘  ResourceReply    └───────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use log::warn;

use crate::app::resources::{Method, ResponseCode};

// ── Broker events ────────────────────────────────────────────

/// Longest topic the node accepts.
pub const MAX_TOPIC_LEN: usize = 32;
/// Longest message payload the node accepts.
pub const MAX_MESSAGE_LEN: usize = 16;

/// Notification from the broker client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Disconnected,
    Message {
        topic: String<MAX_TOPIC_LEN>,
        payload: Vec<u8, MAX_MESSAGE_LEN>,
    },
}

impl BrokerEvent {
    /// Build a message event.  `None` if topic or payload exceed the
    /// node's limits.
    pub fn message(topic: &str, payload: &[u8]) -> Option<Self> {
        Some(Self::Message {
            topic: String::try_from(topic).ok()?,
            payload: Vec::from_slice(payload).ok()?,
        })
    }
}

const BROKER_DEPTH: usize = 8;

pub type BrokerEventChannel = Channel<CriticalSectionRawMutex, BrokerEvent, BROKER_DEPTH>;

/// Broker client → session task.
pub static BROKER_EVENTS: BrokerEventChannel = Channel::new();

/// Post a broker event from any thread.  Drops it if the channel is full.
pub fn post_broker_event(event: BrokerEvent) {
    if BROKER_EVENTS.try_send(event).is_err() {
        warn!("MQTT: event channel full, dropping event");
    }
}

// ── Resource requests (glucose node) ─────────────────────────

/// Inbound resource request, owned so it can cross threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Transport-assigned token echoed in the reply.
    pub token: u16,
    pub method: Method,
    pub path: String<48>,
    /// Form-encoded body.
    pub body: String<32>,
}

/// Reply to a [`ResourceRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReply {
    pub token: u16,
    pub code: ResponseCode,
    pub payload: String<96>,
}

const RESOURCE_DEPTH: usize = 4;

/// Resource transport → resource task.
pub static RESOURCE_REQUESTS: Channel<CriticalSectionRawMutex, ResourceRequest, RESOURCE_DEPTH> =
    Channel::new();

/// Resource task → resource transport.
pub static RESOURCE_REPLIES: Channel<CriticalSectionRawMutex, ResourceReply, RESOURCE_DEPTH> =
    Channel::new();

/// Hand a request to the resource task.  Returns `false` if the queue is
/// full; the transport should answer with a server error.
pub fn submit_resource_request(request: ResourceRequest) -> bool {
    RESOURCE_REQUESTS.try_send(request).is_ok()
}

/// Take the next reply, if any, for transmission.
pub fn try_take_resource_reply() -> Option<ResourceReply> {
    RESOURCE_REPLIES.try_receive().ok()
}
