//! Order domain module.
//!
//! The order aggregate, its lifecycle status and the events it emits.

mod aggregate;
mod events;
mod status;

pub use aggregate::{LineItem, Order};
pub use events::{event_types, OrderCreated, OrderStatusChanged, OrderUpdated};
pub use status::OrderStatus;
