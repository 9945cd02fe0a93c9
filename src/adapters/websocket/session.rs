//! Subscription session: one live client connection and its memberships.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::messages::BrokerEvent;
use super::rooms::{ClientId, EventBroker};
use super::topic::Topic;

/// Something a session receives from the broker.
#[derive(Debug, Clone)]
pub enum Delivery {
    Event(Arc<BrokerEvent>),
    /// The queue overflowed and this many of the oldest events were dropped.
    Lagged(u64),
}

/// A client's handle on the broker.
///
/// Memberships exist only as long as the session: dropping it, on any exit
/// path, removes the client from every topic.
pub struct SubscriptionSession {
    client_id: ClientId,
    broker: Arc<EventBroker>,
    receiver: broadcast::Receiver<Arc<BrokerEvent>>,
}

impl SubscriptionSession {
    pub(super) fn new(
        client_id: ClientId,
        broker: Arc<EventBroker>,
        receiver: broadcast::Receiver<Arc<BrokerEvent>>,
    ) -> Self {
        Self {
            client_id,
            broker,
            receiver,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Joins `topic`. Joining twice is a no-op that returns false.
    pub fn join(&self, topic: Topic) -> bool {
        self.broker.join(&self.client_id, topic)
    }

    /// Leaves `topic`. Leaving a topic not joined is a no-op that returns false.
    pub fn leave(&self, topic: &Topic) -> bool {
        self.broker.leave(&self.client_id, topic)
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.broker.topics_of(&self.client_id)
    }

    /// Waits for the next delivery. `None` once the broker dropped the session.
    ///
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(RecvError::Lagged(missed)) => Some(Delivery::Lagged(missed)),
            Err(RecvError::Closed) => None,
        }
    }

    /// Returns a queued delivery without waiting.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Delivery::Event(event)),
            Err(TryRecvError::Lagged(missed)) => Some(Delivery::Lagged(missed)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    /// Ends the session explicitly.
    pub fn close(self) {}
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        self.broker.disconnect(&self.client_id);
    }
}

impl std::fmt::Debug for SubscriptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionSession")
            .field("client_id", &self.client_id)
            .finish()
    }
}
