//! Application layer - Commands, Queries, and Handlers.
//!
//! The handlers here form the Status Transition Engine: each loads current
//! state through a repository port, checks the transition against the
//! domain tables, writes conditionally on the version it read, and then
//! publishes the matching domain events.

pub mod handlers;
mod policy;

pub use policy::{FulfillmentPolicy, DEFAULT_CONFLICT_RETRIES, DEFAULT_PICKUP_CODE_TTL_HOURS};

pub use handlers::{
    // Order handlers
    ApplyOrderStatusCommand, ApplyOrderStatusHandler, ApplyOrderStatusResult,
    CreateOrderCommand, CreateOrderHandler, CreateOrderResult,
    // Logistics handlers
    AppendTrackEventCommand, AppendTrackEventHandler, AppendTrackEventResult,
    CreateTrackCommand, CreateTrackHandler, CreateTrackResult,
    UpdateTrackPositionCommand, UpdateTrackPositionHandler, UpdateTrackPositionResult,
    UpdateTrackStatusCommand, UpdateTrackStatusHandler, UpdateTrackStatusResult,
    // Pickup handlers
    PickupCodeIssuer, PickupVerification, VerifyPickupCodeHandler, VerifyPickupCodeQuery,
};
