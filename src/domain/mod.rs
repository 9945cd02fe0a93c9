//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, events)
//! - `order` - Order aggregate and its lifecycle
//! - `logistics` - Shipment tracks and the final-mile status graph
//! - `pickup` - Pickup code issuance and validation

pub mod foundation;
pub mod logistics;
pub mod order;
pub mod pickup;
