//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - In-process event bus
//! - `memory` - In-memory repositories
//! - `postgres` - PostgreSQL repositories
//! - `websocket` - Realtime broker, topic rooms and the WebSocket gateway

pub mod events;
pub mod memory;
pub mod postgres;
pub mod websocket;

pub use events::InMemoryEventBus;
pub use memory::{InMemoryOrderRepository, InMemoryTrackRepository};
pub use postgres::{PostgresOrderRepository, PostgresTrackRepository};
