//! CreateTrackHandler - Command handler for opening a shipment track.

use std::sync::Arc;

use crate::application::handlers::pickup::PickupCodeIssuer;
use crate::domain::foundation::{EntityRef, FulfillmentError, OrderId, Timestamp, TrackId};
use crate::domain::logistics::{GeoPoint, LogisticsCreated, LogisticsStatus, ShipmentTrack};
use crate::ports::{EventPublisher, EventPublisherExt, OrderRepository, TrackRepository};

/// Command to open a track for an order.
#[derive(Debug, Clone)]
pub struct CreateTrackCommand {
    pub order_id: OrderId,
    pub company: String,
    pub tracking_number: String,
    /// Defaults to the order's current status.
    pub initial_status: Option<LogisticsStatus>,
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

/// Result of successful track creation.
#[derive(Debug, Clone)]
pub struct CreateTrackResult {
    pub track: ShipmentTrack,
    pub event: LogisticsCreated,
}

/// Handler for opening tracks.
pub struct CreateTrackHandler {
    orders: Arc<dyn OrderRepository>,
    tracks: Arc<dyn TrackRepository>,
    pickup: Arc<PickupCodeIssuer>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateTrackHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        tracks: Arc<dyn TrackRepository>,
        pickup: Arc<PickupCodeIssuer>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            tracks,
            pickup,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: CreateTrackCommand) -> Result<CreateTrackResult, FulfillmentError> {
        // 1. The order must exist
        let order = self
            .orders
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| FulfillmentError::not_found(EntityRef::Order(cmd.order_id)))?;

        // 2. One track per order, one track per tracking number
        if self.tracks.find_by_order_id(&cmd.order_id).await?.is_some() {
            return Err(FulfillmentError::validation(
                "order_id",
                format!("order {} already has a track", cmd.order_id),
            ));
        }
        if self
            .tracks
            .find_by_logistics_number(&cmd.tracking_number)
            .await?
            .is_some()
        {
            return Err(FulfillmentError::validation(
                "tracking_number",
                format!("tracking number {} is already in use", cmd.tracking_number),
            ));
        }

        // 3. Open the track; a pickup-eligible start gets its code now
        let now = Timestamp::now();
        let status = cmd
            .initial_status
            .unwrap_or_else(|| LogisticsStatus::from(order.status()));
        let mut track = ShipmentTrack::open(
            TrackId::new(),
            cmd.order_id,
            cmd.company,
            cmd.tracking_number,
            status,
            now,
        )?;
        track.set_route_ends(cmd.start, cmd.end);
        let minted = self.pickup.mint_if_eligible(&mut track, now).await?;

        // 4. Persist (the store re-checks both uniqueness rules)
        self.tracks.save(&track).await?;

        tracing::info!(
            track_id = %track.id(),
            order_id = %track.order_id(),
            tracking_number = track.tracking_number(),
            status = %track.status(),
            "Track created"
        );

        // 5. Publish
        let event = LogisticsCreated::new(&track);
        self.event_publisher.publish_committed(&event).await;
        if minted {
            self.pickup.announce(&track).await;
        }

        Ok(CreateTrackResult { track, event })
    }
}
