//! Pickup code issuance and verification.

mod issue_pickup_code;
mod verify_pickup_code;

pub use issue_pickup_code::PickupCodeIssuer;
pub use verify_pickup_code::{PickupVerification, VerifyPickupCodeHandler, VerifyPickupCodeQuery};
