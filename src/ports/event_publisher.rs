//! EventPublisher port - how the transition handlers announce changes.
//!
//! Handlers publish envelopes after the write they describe has landed;
//! the adapter decides how envelopes reach subscribers (in-process bus,
//! realtime broker bridge).

use async_trait::async_trait;

use crate::domain::foundation::{
    DomainError, DomainEvent, EventEnvelope, SerializableDomainEvent,
};

/// Port for publishing domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    ///
    /// # Errors
    ///
    /// Returns an error if any registered handler failed. Every handler is
    /// still invoked.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events in order, stopping at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// Serializes typed events before handing them to the publisher.
#[async_trait]
pub trait EventPublisherExt: EventPublisher {
    async fn publish_event<E>(&self, event: &E) -> Result<(), DomainError>
    where
        E: SerializableDomainEvent + Sync,
    {
        self.publish(event.to_envelope()?).await
    }

    /// Publishes an event describing a write that has already landed.
    ///
    /// A failure is logged, never returned: the write stands, and a caller
    /// retrying on the error would repeat it.
    async fn publish_committed<E>(&self, event: &E)
    where
        E: SerializableDomainEvent + Sync,
    {
        if let Err(e) = self.publish_event(event).await {
            tracing::warn!(
                event_type = event.event_type(),
                aggregate_id = %event.aggregate_id(),
                error = %e,
                "Publish failed after commit"
            );
        }
    }
}

impl<T: EventPublisher + ?Sized> EventPublisherExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{
        ErrorCode, MerchantId, OrderId, ProductId, SkuId, Timestamp, UserId,
    };
    use crate::domain::order::{LineItem, Order, OrderCreated};
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl EventPublisher for Recorder {
        async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
            self.0.lock().unwrap().push(event.event_type);
            Ok(())
        }
    }

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    struct Broken;

    #[async_trait]
    impl EventPublisher for Broken {
        async fn publish(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "bridge rejected envelope"))
        }
    }

    #[tokio::test]
    async fn publish_committed_swallows_failures() {
        let order = Order::place(
            OrderId::new(),
            UserId::new("user-1").unwrap(),
            MerchantId::new("merchant-1").unwrap(),
            vec![LineItem::new(ProductId::new("p").unwrap(), SkuId::new("s").unwrap(), 100, 1).unwrap()],
            false,
            Timestamp::now(),
        )
        .unwrap();

        Broken.publish_committed(&OrderCreated::new(&order)).await;
        assert!(Broken.publish_event(&OrderCreated::new(&order)).await.is_err());
    }

    #[tokio::test]
    async fn publish_all_keeps_order() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        recorder
            .publish_all(vec![
                EventEnvelope::new("a.v1", "1", "A", json!({})),
                EventEnvelope::new("b.v1", "1", "A", json!({})),
            ])
            .await
            .unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec!["a.v1", "b.v1"]);
    }
}
