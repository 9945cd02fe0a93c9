//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod logistics;
pub mod order;
pub mod pickup;

pub use logistics::{
    AppendTrackEventCommand, AppendTrackEventHandler, AppendTrackEventResult, CreateTrackCommand,
    CreateTrackHandler, CreateTrackResult, UpdateTrackPositionCommand, UpdateTrackPositionHandler,
    UpdateTrackPositionResult, UpdateTrackStatusCommand, UpdateTrackStatusHandler,
    UpdateTrackStatusResult,
};
pub use order::{
    ApplyOrderStatusCommand, ApplyOrderStatusHandler, ApplyOrderStatusResult, CreateOrderCommand,
    CreateOrderHandler, CreateOrderResult,
};
pub use pickup::{PickupCodeIssuer, PickupVerification, VerifyPickupCodeHandler, VerifyPickupCodeQuery};

#[cfg(test)]
pub(crate) mod test_support;
