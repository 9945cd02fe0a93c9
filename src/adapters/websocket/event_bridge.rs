//! Event bridge connecting domain events to broker topics.
//!
//! # Event Flow
//!
//! ```text
//! Domain Event Published
//!          │
//!          ▼
//! ┌────────────────────┐
//! │ BrokerEventBridge  │
//! │  receives envelope │
//! └────────────────────┘
//!          │
//!          ▼
//! ┌────────────────────┐
//! │  Map to EventType  │
//! │  and EventPayload  │
//! └────────────────────┘
//!          │
//!          ▼
//! ┌────────────────────┐
//! │  Resolve topics:   │
//! │  order:<id>        │
//! │  track:<number>    │
//! │  all-updates       │
//! └────────────────────┘
//!          │
//!          ▼
//!   EventBroker::publish
//! ```
//!
//! Only order status changes are also published to `all-updates`; every
//! other event reaches its own room only.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::domain::logistics::event_types as logistics_events;
use crate::domain::order::event_types as order_events;
use crate::ports::{EventHandler, EventSubscriber};

use super::messages::{EventPayload, EventType};
use super::rooms::EventBroker;
use super::topic::Topic;

/// Domain event types forwarded to realtime clients.
pub const REALTIME_EVENT_TYPES: &[&str] = &[
    order_events::ORDER_CREATED,
    order_events::ORDER_UPDATED,
    order_events::ORDER_STATUS_CHANGED,
    logistics_events::LOGISTICS_CREATED,
    logistics_events::LOGISTICS_UPDATED,
    logistics_events::LOGISTICS_STATUS_CHANGED,
    logistics_events::LOGISTICS_TRACK_ADDED,
];

/// A resolved broker publication.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub topics: Vec<Topic>,
    pub event_type: EventType,
    pub payload: EventPayload,
}

/// Bridge between the event bus and the broker.
pub struct BrokerEventBridge {
    broker: Arc<EventBroker>,
}

impl BrokerEventBridge {
    pub fn new(broker: Arc<EventBroker>) -> Self {
        Self { broker }
    }

    pub fn new_shared(broker: Arc<EventBroker>) -> Arc<Self> {
        Arc::new(Self::new(broker))
    }

    /// Subscribes to every realtime-relevant event type.
    pub fn register(self: &Arc<Self>, subscriber: &impl EventSubscriber) {
        subscriber.subscribe_all(REALTIME_EVENT_TYPES, self.clone());
    }

    /// Maps an envelope to its wire event and target topics.
    ///
    /// Returns `Ok(None)` for event types the bridge does not forward.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a routing key is missing from the payload
    pub fn route(event: &EventEnvelope) -> Result<Option<Route>, DomainError> {
        let payload = &event.payload;
        let mut wire = EventPayload::at(event.occurred_at);

        let (event_type, topics) = match event.event_type.as_str() {
            order_events::ORDER_CREATED | order_events::ORDER_UPDATED => {
                let order_id = event.aggregate_id.clone();
                wire.status = field(payload, &["order", "status"]);
                wire.order_data = payload.get("order").cloned();
                wire.order_id = Some(order_id.clone());

                let event_type = if event.event_type == order_events::ORDER_CREATED {
                    EventType::OrderCreated
                } else {
                    EventType::OrderUpdated
                };
                (event_type, vec![order_topic(&order_id)?])
            }
            order_events::ORDER_STATUS_CHANGED => {
                let order_id = event.aggregate_id.clone();
                wire.status = field(payload, &["to"]);
                wire.order_id = Some(order_id.clone());
                (
                    EventType::OrderStatusChanged,
                    vec![order_topic(&order_id)?, Topic::AllUpdates],
                )
            }
            logistics_events::LOGISTICS_CREATED | logistics_events::LOGISTICS_UPDATED => {
                let tracking_number = required(event, "tracking_number")?;
                wire.order_id = field(payload, &["track", "orderId"]);
                wire.status = field(payload, &["track", "status"]);
                wire.logistics_data = payload.get("track").cloned();
                wire.tracking_number = Some(tracking_number.clone());

                let event_type = if event.event_type == logistics_events::LOGISTICS_CREATED {
                    EventType::LogisticsCreated
                } else {
                    EventType::LogisticsUpdated
                };
                (event_type, vec![track_topic(&tracking_number)?])
            }
            logistics_events::LOGISTICS_STATUS_CHANGED => {
                let tracking_number = required(event, "tracking_number")?;
                wire.order_id = field(payload, &["order_id"]);
                wire.status = field(payload, &["to"]);
                wire.tracking_number = Some(tracking_number.clone());
                (
                    EventType::LogisticsStatusChanged,
                    vec![track_topic(&tracking_number)?],
                )
            }
            logistics_events::LOGISTICS_TRACK_ADDED => {
                let tracking_number = required(event, "tracking_number")?;
                wire.track_node = payload.get("node").cloned();
                wire.status = field(payload, &["node", "status"]);
                wire.tracking_number = Some(tracking_number.clone());
                (
                    EventType::LogisticsTrackAdded,
                    vec![track_topic(&tracking_number)?],
                )
            }
            _ => return Ok(None),
        };

        Ok(Some(Route {
            topics,
            event_type,
            payload: wire,
        }))
    }
}

fn field(payload: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(payload, |value, key| value.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn required(event: &EventEnvelope, key: &str) -> Result<String, DomainError> {
    field(&event.payload, &[key]).ok_or_else(|| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("{} payload is missing '{}'", event.event_type, key),
        )
    })
}

fn order_topic(order_id: &str) -> Result<Topic, DomainError> {
    Topic::order(order_id).map_err(|e| DomainError::new(ErrorCode::ValidationFailed, e.to_string()))
}

fn track_topic(tracking_number: &str) -> Result<Topic, DomainError> {
    Topic::track(tracking_number)
        .map_err(|e| DomainError::new(ErrorCode::ValidationFailed, e.to_string()))
}

#[async_trait]
impl EventHandler for BrokerEventBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let Some(route) = Self::route(&event)? else {
            return Ok(());
        };

        for topic in &route.topics {
            self.broker
                .publish(topic, route.event_type, route.payload.clone());
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "BrokerEventBridge"
    }
}
