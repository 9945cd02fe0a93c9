//! CreateOrderHandler - Command handler for placing orders at checkout.

use std::sync::Arc;

use crate::domain::foundation::{FulfillmentError, MerchantId, OrderId, Timestamp, UserId};
use crate::domain::order::{LineItem, Order, OrderCreated};
use crate::ports::{EventPublisher, EventPublisherExt, OrderRepository};

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub items: Vec<LineItem>,
    /// Payment was confirmed synchronously at checkout.
    pub payment_confirmed: bool,
}

/// Result of successful order creation.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: Order,
    pub event: OrderCreated,
}

/// Handler for placing orders.
pub struct CreateOrderHandler {
    orders: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            orders,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, FulfillmentError> {
        // 1. Build the aggregate (validates items and totals)
        let order = Order::place(
            OrderId::new(),
            cmd.user_id,
            cmd.merchant_id,
            cmd.items,
            cmd.payment_confirmed,
            Timestamp::now(),
        )?;

        // 2. Persist
        self.orders.save(&order).await?;

        tracing::info!(
            order_id = %order.id(),
            status = %order.status(),
            total_amount = order.total_amount(),
            "Order created"
        );

        // 3. Publish event
        let event = OrderCreated::new(&order);
        self.event_publisher.publish_committed(&event).await;

        Ok(CreateOrderResult { order, event })
    }
}
