//! Shared fixtures for handler tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::{InMemoryOrderRepository, InMemoryTrackRepository};
use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{
    DomainError, ErrorCode, EventEnvelope, MerchantId, OrderId, ProductId, SkuId, Timestamp,
    TrackId, UserId,
};
use crate::domain::logistics::{LogisticsStatus, ShipmentTrack};
use crate::domain::order::{LineItem, Order, OrderStatus};
use crate::ports::{EventPublisher, OrderRepository, TrackRepository};

use super::PickupCodeIssuer;

/// Publisher whose every publish fails, as a bridge rejecting an envelope would.
pub(crate) struct RejectingPublisher;

#[async_trait]
impl EventPublisher for RejectingPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        Err(DomainError::new(
            ErrorCode::ValidationFailed,
            format!("{} rejected", event.event_type),
        ))
    }
}

static TRACKING_SEQ: AtomicU32 = AtomicU32::new(1);

/// In-memory repositories plus a recording bus.
pub(crate) struct Harness {
    pub orders: Arc<InMemoryOrderRepository>,
    pub tracks: Arc<InMemoryTrackRepository>,
    pub bus: Arc<InMemoryEventBus>,
    pub policy: FulfillmentPolicy,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderRepository::new()),
            tracks: Arc::new(InMemoryTrackRepository::new()),
            bus: Arc::new(InMemoryEventBus::recording()),
            policy: FulfillmentPolicy::default(),
        }
    }

    pub fn issuer(&self) -> Arc<PickupCodeIssuer> {
        Arc::new(PickupCodeIssuer::new(
            self.tracks.clone(),
            self.orders.clone(),
            self.bus.clone(),
            self.policy,
        ))
    }

    /// Stores an order already sitting in `status`.
    pub async fn seed_order(&self, status: OrderStatus) -> Order {
        let now = Timestamp::now();
        let item = LineItem::new(
            ProductId::new("prod-1").unwrap(),
            SkuId::new("sku-1").unwrap(),
            2_500,
            2,
        )
        .unwrap();
        let order = Order::reconstitute(
            OrderId::new(),
            UserId::new("user-1").unwrap(),
            MerchantId::new("merchant-1").unwrap(),
            vec![item],
            5_000,
            status,
            now,
            None,
            None,
            None,
            None,
            0,
            now,
            now,
        );
        self.orders.save(&order).await.unwrap();
        order
    }

    /// Stores a track for `order` sitting in `status`.
    pub async fn seed_track(&self, order: &Order, status: LogisticsStatus) -> ShipmentTrack {
        let number = format!("SS-{:06}", TRACKING_SEQ.fetch_add(1, Ordering::SeqCst));
        let track = ShipmentTrack::open(
            TrackId::new(),
            *order.id(),
            "SwiftShip",
            number,
            status,
            Timestamp::now(),
        )
        .unwrap();
        self.tracks.save(&track).await.unwrap();
        track
    }
}
