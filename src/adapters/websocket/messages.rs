//! Realtime message types.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: broker events in the stable `{topic, eventType, payload}`
//!   shape, plus tagged control replies (connected, joined, left, pong, error,
//!   lagged)
//! - Client → Server: join/leave requests per room and pings

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

use super::topic::Topic;

// ============================================
// Broker Events
// ============================================

/// Event type enumeration on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "order:created")]
    OrderCreated,
    #[serde(rename = "order:updated")]
    OrderUpdated,
    #[serde(rename = "order:status:changed")]
    OrderStatusChanged,
    #[serde(rename = "logistics:created")]
    LogisticsCreated,
    #[serde(rename = "logistics:updated")]
    LogisticsUpdated,
    #[serde(rename = "logistics:status:changed")]
    LogisticsStatusChanged,
    #[serde(rename = "logistics:track:added")]
    LogisticsTrackAdded,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order:created",
            EventType::OrderUpdated => "order:updated",
            EventType::OrderStatusChanged => "order:status:changed",
            EventType::LogisticsCreated => "logistics:created",
            EventType::LogisticsUpdated => "logistics:updated",
            EventType::LogisticsStatusChanged => "logistics:status:changed",
            EventType::LogisticsTrackAdded => "logistics:track:added",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a broker event. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistics_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_node: Option<serde_json::Value>,
    /// RFC 3339 time the underlying change occurred.
    pub timestamp: String,
}

impl EventPayload {
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339(),
            ..Self::default()
        }
    }
}

/// One event as delivered to a subscribed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerEvent {
    pub topic: String,
    pub event_type: EventType,
    pub payload: EventPayload,
}

// ============================================
// Server → Client Control Messages
// ============================================

/// Control replies sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established; no rooms joined yet.
    Connected(ConnectedMessage),
    Joined(TopicMessage),
    Left(TopicMessage),
    Pong(PongMessage),
    Error(ErrorMessage),
    /// The client fell behind and `missed` events were dropped.
    Lagged(LaggedMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub client_id: String,
    pub timestamp: String,
}

/// Acknowledges a join or leave. `changed` is false when the request was a
/// no-op (already joined, or not a member).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMessage {
    pub topic: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaggedMessage {
    pub missed: u64,
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// Requests received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join:order", rename_all = "camelCase")]
    JoinOrder { order_id: String },
    #[serde(rename = "leave:order", rename_all = "camelCase")]
    LeaveOrder { order_id: String },
    #[serde(rename = "join:track", rename_all = "camelCase")]
    JoinTrack { tracking_number: String },
    #[serde(rename = "leave:track", rename_all = "camelCase")]
    LeaveTrack { tracking_number: String },
    #[serde(rename = "join:all-updates")]
    JoinAllUpdates,
    #[serde(rename = "leave:all-updates")]
    LeaveAllUpdates,
    #[serde(rename = "ping")]
    Ping,
}

/// What a membership request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Join(Topic),
    Leave(Topic),
}

impl ClientMessage {
    /// The membership change requested, or `None` for a ping.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the room key is blank
    pub fn membership(&self) -> Result<Option<Membership>, ValidationError> {
        let change = match self {
            ClientMessage::JoinOrder { order_id } => Membership::Join(Topic::order(order_id.clone())?),
            ClientMessage::LeaveOrder { order_id } => Membership::Leave(Topic::order(order_id.clone())?),
            ClientMessage::JoinTrack { tracking_number } => {
                Membership::Join(Topic::track(tracking_number.clone())?)
            }
            ClientMessage::LeaveTrack { tracking_number } => {
                Membership::Leave(Topic::track(tracking_number.clone())?)
            }
            ClientMessage::JoinAllUpdates => Membership::Join(Topic::AllUpdates),
            ClientMessage::LeaveAllUpdates => Membership::Leave(Topic::AllUpdates),
            ClientMessage::Ping => return Ok(None),
        };
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn broker_event_has_stable_shape() {
        let event = BrokerEvent {
            topic: "order:O1".into(),
            event_type: EventType::OrderStatusChanged,
            payload: EventPayload {
                order_id: Some("O1".into()),
                status: Some("paid".into()),
                timestamp: "2026-01-01T00:00:00+00:00".into(),
                ..EventPayload::default()
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "topic": "order:O1",
                "eventType": "order:status:changed",
                "payload": {
                    "orderId": "O1",
                    "status": "paid",
                    "timestamp": "2026-01-01T00:00:00+00:00"
                }
            })
        );
    }

    #[test]
    fn event_type_names_match_serde() {
        for event_type in [
            EventType::OrderCreated,
            EventType::OrderUpdated,
            EventType::OrderStatusChanged,
            EventType::LogisticsCreated,
            EventType::LogisticsUpdated,
            EventType::LogisticsStatusChanged,
            EventType::LogisticsTrackAdded,
        ] {
            assert_eq!(
                serde_json::to_value(event_type).unwrap(),
                json!(event_type.as_str())
            );
        }
    }

    #[test]
    fn parses_join_and_leave_requests() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"join:order","orderId":"O1"}"#).unwrap();
        assert_eq!(
            join.membership().unwrap(),
            Some(Membership::Join(Topic::Order("O1".into())))
        );

        let leave: ClientMessage =
            serde_json::from_str(r#"{"type":"leave:track","trackingNumber":"SS-1"}"#).unwrap();
        assert_eq!(
            leave.membership().unwrap(),
            Some(Membership::Leave(Topic::Track("SS-1".into())))
        );

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping.membership().unwrap(), None);
    }

    #[test]
    fn blank_room_key_is_rejected() {
        let msg = ClientMessage::JoinOrder { order_id: " ".into() };
        assert!(msg.membership().is_err());
    }

    #[test]
    fn control_messages_are_tagged() {
        let value = serde_json::to_value(ServerMessage::Lagged(LaggedMessage { missed: 3 })).unwrap();
        assert_eq!(value, json!({"type": "lagged", "missed": 3}));
    }
}
