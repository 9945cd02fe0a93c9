//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `OrderRepository` - Order load and version-checked update
//! - `TrackRepository` - Track loads, append-to-log, pickup code lookups
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events

mod event_publisher;
mod event_subscriber;
mod order_repository;
mod track_repository;
mod write_outcome;

pub use event_publisher::{EventPublisher, EventPublisherExt};
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use order_repository::OrderRepository;
pub use track_repository::TrackRepository;
pub use write_outcome::WriteOutcome;
