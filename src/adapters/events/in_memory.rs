//! In-process event bus.
//!
//! Dispatches each published envelope to the handlers registered for its
//! event type, in registration order, on the publisher's task. This is the
//! bus the server runs with: fan-out stays inside one process.
//!
//! A bus built with [`InMemoryEventBus::recording`] additionally keeps every
//! envelope for assertions in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// In-process event bus.
///
/// Handler failures are logged and aggregated into one error returned to
/// the publisher after every handler has run.
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    published: Option<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventBus {
    /// Creates a bus that dispatches without keeping history.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: None,
        }
    }

    /// Creates a bus that also records every published envelope.
    pub fn recording() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: Some(RwLock::new(Vec::new())),
        }
    }

    // === Recording Helpers ===

    /// Returns all recorded events; empty unless built with `recording()`.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .as_ref()
            .map(|log| log.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Returns recorded events of a specific type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Returns recorded events for a specific aggregate.
    pub fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .collect()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        if let Some(log) = &self.published {
            log.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    pub fn event_count(&self) -> usize {
        self.published
            .as_ref()
            .map(|log| log.read().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published.as_ref().is_some_and(|log| {
            log.read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|e| e.event_type == event_type)
        })
    }

    /// Number of handlers registered for `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Some(log) = &self.published {
            log.write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }

        // Clone handlers to release lock before await points
        let type_handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers
                .get(&event.event_type)
                .cloned()
                .unwrap_or_default()
        };

        tracing::debug!(
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            handlers = type_handlers.len(),
            "Dispatching event"
        );

        let mut errors = Vec::new();
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    error = %e,
                    "Event handler failed"
                );
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event_type, handler = handler.name(), "Handler subscribed");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{EventId, EventMetadata, Timestamp};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_envelope(event_type: &str, aggregate_id: &str) -> EventEnvelope {
        EventEnvelope {
            event_id: EventId::new(),
            event_type: event_type.to_string(),
            aggregate_id: aggregate_id.to_string(),
            aggregate_type: "Order".to_string(),
            occurred_at: Timestamp::now(),
            payload: json!({}),
            metadata: EventMetadata::default(),
        }
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "socket closed"))
        }
        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[tokio::test]
    async fn plain_bus_keeps_no_history() {
        let bus = InMemoryEventBus::new();
        bus.publish(test_envelope("order.created.v1", "o-1"))
            .await
            .unwrap();

        assert_eq!(bus.event_count(), 0);
        assert!(bus.published_events().is_empty());
    }

    #[tokio::test]
    async fn recording_bus_captures_and_filters() {
        let bus = InMemoryEventBus::recording();

        bus.publish(test_envelope("order.created.v1", "o-1")).await.unwrap();
        bus.publish(test_envelope("order.status_changed.v1", "o-2")).await.unwrap();
        bus.publish(test_envelope("order.status_changed.v1", "o-1")).await.unwrap();

        assert_eq!(bus.event_count(), 3);
        assert_eq!(bus.events_of_type("order.status_changed.v1").len(), 2);
        assert_eq!(bus.events_for_aggregate("o-1").len(), 2);
        assert!(bus.has_event("order.created.v1"));

        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn every_registered_handler_is_invoked() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.created.v1", Arc::new(CountingHandler(counter.clone())));
        bus.subscribe("order.created.v1", Arc::new(CountingHandler(counter.clone())));
        bus.publish(test_envelope("order.created.v1", "o-1"))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(bus.handler_count("order.created.v1"), 2);
    }

    #[tokio::test]
    async fn subscribe_all_registers_for_each_type() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe_all(
            &["order.created.v1", "order.updated.v1"],
            Arc::new(CountingHandler(counter.clone())),
        );

        bus.publish(test_envelope("order.created.v1", "1")).await.unwrap();
        bus.publish(test_envelope("order.updated.v1", "1")).await.unwrap();
        bus.publish(test_envelope("logistics.created.v1", "1")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_handler_does_not_starve_the_rest() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe("order.updated.v1", Arc::new(FailingHandler));
        bus.subscribe("order.updated.v1", Arc::new(CountingHandler(counter.clone())));

        let result = bus.publish(test_envelope("order.updated.v1", "1")).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let err = result.unwrap_err();
        assert!(err.message.contains("FailingHandler"));
    }
}
