//! In-memory Order repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId};
use crate::domain::order::Order;
use crate::ports::{OrderRepository, WriteOutcome};

/// Order store backed by a map; the default when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(order.id()) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Order {} already exists", order.id()),
            ));
        }
        orders.insert(*order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn update_if_version(
        &self,
        order: &Order,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError> {
        let mut orders = self.orders.write().await;
        match orders.get(order.id()) {
            Some(stored) if stored.version() == expected_version => {
                let version = expected_version + 1;
                let mut next = order.clone();
                next.mark_persisted(version);
                orders.insert(*order.id(), next);
                Ok(WriteOutcome::Applied { version })
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MerchantId, ProductId, SkuId, Timestamp, UserId};
    use crate::domain::order::{LineItem, OrderStatus};

    fn test_order() -> Order {
        Order::place(
            OrderId::new(),
            UserId::new("u-1").unwrap(),
            MerchantId::new("m-1").unwrap(),
            vec![LineItem::new(ProductId::new("p").unwrap(), SkuId::new("s").unwrap(), 100, 1).unwrap()],
            false,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_then_find() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order();
        repo.save(&order).await.unwrap();

        assert_eq!(repo.find_by_id(order.id()).await.unwrap(), Some(order));
        assert_eq!(repo.find_by_id(&OrderId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_save_fails() {
        let repo = InMemoryOrderRepository::new();
        let order = test_order();
        repo.save(&order).await.unwrap();

        let err = repo.save(&order).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let mut order = test_order();
        repo.save(&order).await.unwrap();

        order.apply_status(OrderStatus::Paid, Timestamp::now()).unwrap();
        assert_eq!(
            repo.update_if_version(&order, 0).await.unwrap(),
            WriteOutcome::Applied { version: 1 }
        );
        assert_eq!(
            repo.update_if_version(&order, 0).await.unwrap(),
            WriteOutcome::Conflict
        );

        let stored = repo.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.version(), 1);
        assert_eq!(stored.status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn missing_order_conflicts() {
        let repo = InMemoryOrderRepository::new();
        assert_eq!(
            repo.update_if_version(&test_order(), 0).await.unwrap(),
            WriteOutcome::Conflict
        );
    }
}
