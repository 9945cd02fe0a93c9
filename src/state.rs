//! Application state: the explicitly constructed service graph.
//!
//! Stores, the in-process event bus, the realtime broker and every handler
//! are built here once and shared by reference. The broker bridge is
//! subscribed to the bus so that each event a handler publishes reaches
//! the matching topic rooms.

use std::sync::Arc;

use crate::adapters::events::InMemoryEventBus;
use crate::adapters::memory::{InMemoryOrderRepository, InMemoryTrackRepository};
use crate::adapters::postgres::{self, PostgresOrderRepository, PostgresTrackRepository};
use crate::adapters::websocket::{BrokerEventBridge, EventBroker, WebSocketState};
use crate::application::{
    AppendTrackEventHandler, ApplyOrderStatusHandler, CreateOrderHandler, CreateTrackHandler,
    FulfillmentPolicy, PickupCodeIssuer, UpdateTrackPositionHandler, UpdateTrackStatusHandler,
    VerifyPickupCodeHandler,
};
use crate::config::AppConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{EventPublisher, OrderRepository, TrackRepository};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<EventBroker>,
    pub bus: Arc<InMemoryEventBus>,
    pub orders: Arc<dyn OrderRepository>,
    pub tracks: Arc<dyn TrackRepository>,
    pub create_order: Arc<CreateOrderHandler>,
    pub apply_order_status: Arc<ApplyOrderStatusHandler>,
    pub create_track: Arc<CreateTrackHandler>,
    pub append_track_event: Arc<AppendTrackEventHandler>,
    pub update_track_status: Arc<UpdateTrackStatusHandler>,
    pub update_track_position: Arc<UpdateTrackPositionHandler>,
    pub verify_pickup_code: Arc<VerifyPickupCodeHandler>,
}

impl AppState {
    /// Wires handlers over the given stores and bus.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        tracks: Arc<dyn TrackRepository>,
        bus: Arc<InMemoryEventBus>,
        policy: FulfillmentPolicy,
        queue_capacity: usize,
    ) -> Self {
        let broker = Arc::new(EventBroker::new(queue_capacity));
        BrokerEventBridge::new_shared(broker.clone()).register(bus.as_ref());

        let publisher: Arc<dyn EventPublisher> = bus.clone();
        let pickup = Arc::new(PickupCodeIssuer::new(
            tracks.clone(),
            orders.clone(),
            publisher.clone(),
            policy,
        ));

        Self {
            create_order: Arc::new(CreateOrderHandler::new(orders.clone(), publisher.clone())),
            apply_order_status: Arc::new(ApplyOrderStatusHandler::new(
                orders.clone(),
                publisher.clone(),
                policy,
            )),
            create_track: Arc::new(CreateTrackHandler::new(
                orders.clone(),
                tracks.clone(),
                pickup.clone(),
                publisher.clone(),
            )),
            append_track_event: Arc::new(AppendTrackEventHandler::new(
                tracks.clone(),
                pickup.clone(),
                publisher.clone(),
                policy,
            )),
            update_track_status: Arc::new(UpdateTrackStatusHandler::new(
                tracks.clone(),
                pickup,
                publisher.clone(),
                policy,
            )),
            update_track_position: Arc::new(UpdateTrackPositionHandler::new(
                tracks.clone(),
                publisher,
                policy,
            )),
            verify_pickup_code: Arc::new(VerifyPickupCodeHandler::new(tracks.clone())),
            broker,
            bus,
            orders,
            tracks,
        }
    }

    /// In-memory stores and a non-recording bus.
    pub fn in_memory(policy: FulfillmentPolicy, queue_capacity: usize) -> Self {
        Self::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryTrackRepository::new()),
            Arc::new(InMemoryEventBus::new()),
            policy,
            queue_capacity,
        )
    }

    /// Builds the state described by `config`.
    ///
    /// Uses PostgreSQL when a database section is present, in-memory stores
    /// otherwise.
    pub async fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let policy = FulfillmentPolicy::from(&config.fulfillment);
        let capacity = config.realtime.subscriber_queue_capacity;

        let Some(database) = &config.database else {
            tracing::warn!("No database configured, using in-memory stores");
            return Ok(Self::in_memory(policy, capacity));
        };

        let pool = postgres::connect(database).await?;
        if database.run_migrations {
            postgres::run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");
        }

        Ok(Self::new(
            Arc::new(PostgresOrderRepository::new(pool.clone())),
            Arc::new(PostgresTrackRepository::new(pool)),
            Arc::new(InMemoryEventBus::new()),
            policy,
            capacity,
        ))
    }

    pub fn websocket_state(&self) -> WebSocketState {
        WebSocketState::new(self.broker.clone())
    }
}
