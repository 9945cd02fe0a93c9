//! ApplyOrderStatusHandler - Command handler for order status transitions.
//!
//! The read-check-write runs against the version read in the same pass.
//! A version conflict triggers a re-read: if the status is still the one
//! the first pass saw, the transition is re-checked and retried; if another
//! writer moved the status, the request is surfaced as `Conflict`.

use std::sync::Arc;

use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{EntityRef, FulfillmentError, OrderId, Timestamp};
use crate::domain::order::{Order, OrderStatus, OrderStatusChanged};
use crate::ports::{EventPublisher, EventPublisherExt, OrderRepository, WriteOutcome};

/// Command to move an order to a new status.
#[derive(Debug, Clone)]
pub struct ApplyOrderStatusCommand {
    pub order_id: OrderId,
    pub target: OrderStatus,
}

/// Result of a successful transition.
#[derive(Debug, Clone)]
pub struct ApplyOrderStatusResult {
    pub order: Order,
    pub previous: OrderStatus,
    pub event: OrderStatusChanged,
}

/// Handler for order status transitions.
pub struct ApplyOrderStatusHandler {
    orders: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: FulfillmentPolicy,
}

impl ApplyOrderStatusHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            orders,
            event_publisher,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: ApplyOrderStatusCommand,
    ) -> Result<ApplyOrderStatusResult, FulfillmentError> {
        let mut observed: Option<OrderStatus> = None;
        let mut conflicts = 0u32;

        loop {
            // 1. Load current state
            let mut order = self
                .orders
                .find_by_id(&cmd.order_id)
                .await?
                .ok_or_else(|| FulfillmentError::not_found(EntityRef::Order(cmd.order_id)))?;

            // 2. Status moved under us since the first read
            if let Some(seen) = observed {
                if seen != order.status() {
                    return Err(FulfillmentError::conflict(format!(
                        "order {} moved from {} to {} concurrently",
                        cmd.order_id,
                        seen,
                        order.status()
                    )));
                }
            }
            observed = Some(order.status());

            // 3. Check and apply
            let now = Timestamp::now();
            let expected = order.version();
            let previous = order.apply_status(cmd.target, now)?;

            // 4. Conditional write
            match self.orders.update_if_version(&order, expected).await? {
                WriteOutcome::Applied { version } => {
                    order.mark_persisted(version);
                    tracing::info!(
                        order_id = %cmd.order_id,
                        from = %previous,
                        to = %cmd.target,
                        "Order status changed"
                    );

                    // 5. Publish
                    let event = OrderStatusChanged::new(cmd.order_id, previous, cmd.target, now);
                    self.event_publisher.publish_committed(&event).await;

                    return Ok(ApplyOrderStatusResult {
                        order,
                        previous,
                        event,
                    });
                }
                WriteOutcome::Conflict => {
                    conflicts += 1;
                    if conflicts > self.policy.conflict_retries {
                        return Err(FulfillmentError::conflict(format!(
                            "order {} still contended after {} retries",
                            cmd.order_id, self.policy.conflict_retries
                        )));
                    }
                    tracing::warn!(order_id = %cmd.order_id, attempt = conflicts, "Write conflict, retrying");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{Harness, RejectingPublisher};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::order::event_types;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed order and rejects every write.
    struct ContendedOrderRepository {
        order: Order,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl OrderRepository for ContendedOrderRepository {
        async fn save(&self, _order: &Order) -> Result<(), DomainError> {
            Ok(())
        }

        async fn find_by_id(&self, _id: &OrderId) -> Result<Option<Order>, DomainError> {
            Ok(Some(self.order.clone()))
        }

        async fn update_if_version(
            &self,
            _order: &Order,
            _expected_version: u64,
        ) -> Result<WriteOutcome, DomainError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(WriteOutcome::Conflict)
        }
    }

    /// Serves queued snapshots in order and rejects the first write.
    struct MovingOrderRepository {
        snapshots: Mutex<Vec<Order>>,
    }

    #[async_trait]
    impl OrderRepository for MovingOrderRepository {
        async fn save(&self, _order: &Order) -> Result<(), DomainError> {
            Ok(())
        }

        async fn find_by_id(&self, _id: &OrderId) -> Result<Option<Order>, DomainError> {
            let mut snapshots = self.snapshots.lock().unwrap();
            Ok(Some(snapshots.remove(0)))
        }

        async fn update_if_version(
            &self,
            _order: &Order,
            _expected_version: u64,
        ) -> Result<WriteOutcome, DomainError> {
            Ok(WriteOutcome::Conflict)
        }
    }

    fn handler(harness: &Harness) -> ApplyOrderStatusHandler {
        ApplyOrderStatusHandler::new(harness.orders.clone(), harness.bus.clone(), harness.policy)
    }

    #[tokio::test]
    async fn legal_transition_persists_and_publishes() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Pending).await;

        let result = handler(&harness)
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Paid,
            })
            .await
            .unwrap();

        assert_eq!(result.previous, OrderStatus::Pending);
        assert_eq!(result.order.status(), OrderStatus::Paid);
        assert!(result.order.payment_time().is_some());
        assert_eq!(result.order.version(), 1);

        let stored = harness.orders.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Paid);

        let events = harness.bus.events_of_type(event_types::ORDER_STATUS_CHANGED);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["from"], "pending");
        assert_eq!(events[0].payload["to"], "paid");
    }

    #[tokio::test]
    async fn failed_publish_still_reports_the_transition() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Pending).await;
        let handler = ApplyOrderStatusHandler::new(
            harness.orders.clone(),
            Arc::new(RejectingPublisher),
            harness.policy,
        );

        let result = handler
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Paid,
            })
            .await
            .unwrap();

        assert_eq!(result.order.status(), OrderStatus::Paid);
        let stored = harness.orders.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.version(), 1);
    }

    #[tokio::test]
    async fn shipped_sets_shipment_time_once() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Paid).await;
        let handler = handler(&harness);

        let shipped = handler
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Shipped,
            })
            .await
            .unwrap();
        let shipment_time = *shipped.order.shipment_time().unwrap();

        let confirmed = handler
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Confirmed,
            })
            .await
            .unwrap();

        assert_eq!(confirmed.order.shipment_time(), Some(&shipment_time));
        assert_eq!(confirmed.order.version(), 2);
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let harness = Harness::new();
        let missing = OrderId::new();

        let err = handler(&harness)
            .handle(ApplyOrderStatusCommand {
                order_id: missing,
                target: OrderStatus::Paid,
            })
            .await
            .unwrap_err();

        assert_eq!(err, FulfillmentError::not_found(EntityRef::Order(missing)));
        assert_eq!(err.code(), ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn leaving_terminal_state_is_invalid() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Delivered).await;

        let err = handler(&harness)
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Shipped,
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FulfillmentError::invalid_transition(OrderStatus::Delivered, OrderStatus::Shipped)
        );
        assert_eq!(harness.bus.event_count(), 0);
        let stored = harness.orders.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.version(), 0);
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up_after_retries() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Pending).await;
        let repo = Arc::new(ContendedOrderRepository {
            order: order.clone(),
            writes: AtomicUsize::new(0),
        });
        let handler = ApplyOrderStatusHandler::new(repo.clone(), harness.bus.clone(), harness.policy);

        let err = handler
            .handle(ApplyOrderStatusCommand {
                order_id: *order.id(),
                target: OrderStatus::Paid,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::Conflict(_)));
        assert_eq!(repo.writes.load(Ordering::SeqCst), 4);
        assert_eq!(harness.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn status_moved_by_another_writer_surfaces_conflict() {
        let harness = Harness::new();
        let pending = harness.seed_order(OrderStatus::Pending).await;
        let mut paid = pending.clone();
        paid.apply_status(OrderStatus::Paid, Timestamp::now()).unwrap();
        paid.mark_persisted(1);

        let repo = Arc::new(MovingOrderRepository {
            snapshots: Mutex::new(vec![pending.clone(), paid]),
        });
        let handler = ApplyOrderStatusHandler::new(repo, harness.bus.clone(), harness.policy);

        // Cancelling is legal from both states; the stale view still loses.
        let err = handler
            .handle(ApplyOrderStatusCommand {
                order_id: *pending.id(),
                target: OrderStatus::Cancelled,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::WriteConflict);
    }
}
