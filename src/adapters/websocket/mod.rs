//! Realtime adapters: event broker, subscription sessions and the
//! WebSocket gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    InMemoryEventBus                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ subscribes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    BrokerEventBridge                                 │
//! │   - Maps EventEnvelope → EventType + EventPayload                   │
//! │   - Resolves order / track / all-updates topics                     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ publishes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      EventBroker                                     │
//! │   order:O1          track:SS-9          all-updates                 │
//! │   ├── client-a      └── client-b        └── client-c                │
//! │   └── client-b                                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//!                SubscriptionSession ⇄ WebSocket (handler)
//! ```

pub mod event_bridge;
pub mod handler;
pub mod messages;
pub mod rooms;
pub mod session;
pub mod topic;

pub use event_bridge::{BrokerEventBridge, REALTIME_EVENT_TYPES};
pub use handler::{handle_client_message, websocket_router, ws_handler, WebSocketState};
pub use messages::{
    BrokerEvent, ClientMessage, EventPayload, EventType, Membership, ServerMessage,
};
pub use rooms::{ClientId, EventBroker, DEFAULT_QUEUE_CAPACITY};
pub use session::{Delivery, SubscriptionSession};
pub use topic::{Topic, ALL_UPDATES};
