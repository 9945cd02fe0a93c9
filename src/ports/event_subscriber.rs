//! EventSubscriber port - registration of handlers for published events.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler that processes published events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one event. Errors are reported back to the publisher.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Name used in logs and aggregated error messages.
    fn name(&self) -> &'static str;
}

/// Port for registering event handlers by event type.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, handler.clone());
        }
    }
}

/// Combined publish/subscribe capability.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
