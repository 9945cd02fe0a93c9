//! Order domain events.
//!
//! - `OrderCreated` - order placed at checkout
//! - `OrderUpdated` - non-status change (e.g. pickup code mirrored from the track)
//! - `OrderStatusChanged` - lifecycle transition accepted

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, OrderId, Timestamp};

use super::{Order, OrderStatus};

// ════════════════════════════════════════════════════════════════════════════
// OrderCreated
// ════════════════════════════════════════════════════════════════════════════

/// Published when an order is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub event_id: EventId,
    pub order_id: OrderId,
    /// Snapshot of the order as persisted.
    pub order: Order,
    pub created_at: Timestamp,
}

domain_event!(
    OrderCreated,
    event_type = "order.created.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = created_at,
    event_id = event_id
);

impl OrderCreated {
    pub fn new(order: &Order) -> Self {
        Self {
            event_id: EventId::new(),
            order_id: *order.id(),
            order: order.clone(),
            created_at: *order.created_at(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OrderUpdated
// ════════════════════════════════════════════════════════════════════════════

/// Published when order data changes without a status transition.
///
/// Carries the pickup expiry, never the code itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdated {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub order: Order,
    pub pickup_expires_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

domain_event!(
    OrderUpdated,
    event_type = "order.updated.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = updated_at,
    event_id = event_id
);

impl OrderUpdated {
    pub fn new(order: &Order) -> Self {
        Self {
            event_id: EventId::new(),
            order_id: *order.id(),
            order: order.clone(),
            pickup_expires_at: order.pickup().map(|grant| grant.expires_at),
            updated_at: *order.updated_at(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OrderStatusChanged
// ════════════════════════════════════════════════════════════════════════════

/// Published when an order transition is persisted.
///
/// Routed to the order's room and to the global updates room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: Timestamp,
}

domain_event!(
    OrderStatusChanged,
    event_type = "order.status_changed.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = changed_at,
    event_id = event_id
);

impl OrderStatusChanged {
    pub fn new(order_id: OrderId, from: OrderStatus, to: OrderStatus, changed_at: Timestamp) -> Self {
        Self {
            event_id: EventId::new(),
            order_id,
            from,
            to,
            changed_at,
        }
    }
}

/// Event type strings, used when subscribing handlers.
pub mod event_types {
    pub const ORDER_CREATED: &str = "order.created.v1";
    pub const ORDER_UPDATED: &str = "order.updated.v1";
    pub const ORDER_STATUS_CHANGED: &str = "order.status_changed.v1";

    pub const ALL: [&str; 3] = [ORDER_CREATED, ORDER_UPDATED, ORDER_STATUS_CHANGED];
}
