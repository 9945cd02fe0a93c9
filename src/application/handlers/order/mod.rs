//! Order command handlers.

mod apply_order_status;
mod create_order;

pub use apply_order_status::{ApplyOrderStatusCommand, ApplyOrderStatusHandler, ApplyOrderStatusResult};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
