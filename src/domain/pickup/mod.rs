//! Pickup code domain module.
//!
//! Issuance and validation of the short-lived numeric codes that gate
//! final collection of a shipment.

mod code;

pub use code::{
    is_valid_pickup_code, PickupCode, PickupCodeGenerator, PickupGrant, DEFAULT_MAX_ATTEMPTS,
    PICKUP_CODE_LENGTH,
};
