//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait, event
//! infrastructure and error types that form the vocabulary of the
//! fulfillment domain.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, EntityRef, ErrorCode, FulfillmentError, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{MerchantId, OrderId, ProductId, SkuId, TrackId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
