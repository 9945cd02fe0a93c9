//! Event broker: topic-scoped rooms for realtime fan-out.
//!
//! Sessions live in an arena keyed by [`ClientId`]; each topic is an index
//! set of those keys.
//!
//! ```text
//! sessions                       topics
//! ├── client-a ──┐               ├── order:O1     { client-a, client-b }
//! ├── client-b ──┼──────────────►├── track:SS-9   { client-b }
//! └── client-c ──┘               └── all-updates  { client-c }
//! ```
//!
//! Every session owns a bounded broadcast channel. A publish hands the event
//! to each member's channel without waiting; when a client falls behind,
//! the oldest queued events are overwritten and the client is told how many
//! it missed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::messages::{BrokerEvent, EventPayload, EventType};
use super::session::SubscriptionSession;
use super::topic::Topic;

/// Default per-session queue length.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Unique identifier for a connected client.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SessionSlot {
    sender: broadcast::Sender<Arc<BrokerEvent>>,
    topics: HashSet<Topic>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<ClientId, SessionSlot>,
    topics: HashMap<Topic, HashSet<ClientId>>,
}

impl Registry {
    fn remove_member(&mut self, topic: &Topic, client_id: &ClientId) {
        if let Some(members) = self.topics.get_mut(topic) {
            members.remove(client_id);
            if members.is_empty() {
                self.topics.remove(topic);
            }
        }
    }
}

/// In-process publish/subscribe hub.
///
/// Holds no durable log: a session only receives events published while it
/// was a member of the topic.
///
/// # Thread Safety
///
/// The registry sits behind a synchronous `RwLock` that is never held across
/// an await point. Publishing takes the read side; membership changes take
/// the write side briefly. Cleanup can therefore run from `Drop`.
pub struct EventBroker {
    registry: RwLock<Registry>,
    queue_capacity: usize,
}

impl EventBroker {
    /// Creates a broker whose sessions buffer up to `queue_capacity` events.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new session with no topic memberships.
    pub fn connect(self: &Arc<Self>) -> SubscriptionSession {
        let client_id = ClientId::new();
        let (sender, receiver) = broadcast::channel(self.queue_capacity);

        self.write().sessions.insert(
            client_id,
            SessionSlot {
                sender,
                topics: HashSet::new(),
            },
        );

        tracing::debug!(client_id = %client_id, "Session connected");
        SubscriptionSession::new(client_id, Arc::clone(self), receiver)
    }

    /// Adds `client_id` to `topic`.
    ///
    /// Returns false if the session was already a member or is unknown.
    pub fn join(&self, client_id: &ClientId, topic: Topic) -> bool {
        let mut registry = self.write();
        let Some(slot) = registry.sessions.get_mut(client_id) else {
            return false;
        };
        if !slot.topics.insert(topic.clone()) {
            return false;
        }

        tracing::debug!(client_id = %client_id, topic = %topic, "Joined topic");
        registry.topics.entry(topic).or_default().insert(*client_id);
        true
    }

    /// Removes `client_id` from `topic`.
    ///
    /// Returns false if the session was not a member.
    pub fn leave(&self, client_id: &ClientId, topic: &Topic) -> bool {
        let mut registry = self.write();
        let removed = registry
            .sessions
            .get_mut(client_id)
            .is_some_and(|slot| slot.topics.remove(topic));
        if removed {
            registry.remove_member(topic, client_id);
            tracing::debug!(client_id = %client_id, topic = %topic, "Left topic");
        }
        removed
    }

    /// Removes the session and all its memberships in one step.
    ///
    /// Returns the number of topics the session was removed from. Dropping
    /// the session's sender closes its receiver.
    pub fn disconnect(&self, client_id: &ClientId) -> usize {
        let mut registry = self.write();
        let Some(slot) = registry.sessions.remove(client_id) else {
            return 0;
        };
        for topic in &slot.topics {
            registry.remove_member(topic, client_id);
        }

        tracing::debug!(
            client_id = %client_id,
            topics = slot.topics.len(),
            "Session disconnected"
        );
        slot.topics.len()
    }

    /// Delivers an event to every current member of `topic`.
    ///
    /// Returns once the event is queued for each member; never waits for a
    /// client. Publishing to an empty topic is a no-op. A member whose
    /// channel is closed is logged and skipped.
    ///
    /// Returns the number of sessions the event was queued for.
    pub fn publish(&self, topic: &Topic, event_type: EventType, payload: EventPayload) -> usize {
        let registry = self.read();
        let Some(members) = registry.topics.get(topic) else {
            tracing::trace!(topic = %topic, event_type = %event_type, "No subscribers");
            return 0;
        };

        let event = Arc::new(BrokerEvent {
            topic: topic.to_string(),
            event_type,
            payload,
        });

        let mut delivered = 0;
        for client_id in members {
            let Some(slot) = registry.sessions.get(client_id) else {
                continue;
            };
            match slot.sender.send(Arc::clone(&event)) {
                Ok(_) => delivered += 1,
                Err(_) => {
                    tracing::warn!(
                        client_id = %client_id,
                        topic = %topic,
                        event_type = %event_type,
                        "Delivery failed: session receiver closed"
                    );
                }
            }
        }

        tracing::debug!(topic = %topic, event_type = %event_type, delivered, "Published");
        delivered
    }

    /// Number of sessions currently in `topic`.
    pub fn member_count(&self, topic: &Topic) -> usize {
        self.read().topics.get(topic).map_or(0, HashSet::len)
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.read().sessions.len()
    }

    /// Number of topics with at least one member.
    pub fn topic_count(&self) -> usize {
        self.read().topics.len()
    }

    /// Topics `client_id` belongs to, sorted.
    pub fn topics_of(&self, client_id: &ClientId) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .read()
            .sessions
            .get(client_id)
            .map(|slot| slot.topics.iter().cloned().collect())
            .unwrap_or_default();
        topics.sort();
        topics
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
