//! UpdateTrackStatusHandler - Direct status correction for an order's track.
//!
//! Bypasses the append path and the transition table; used for bulk and
//! administrative corrections. A terminal track still refuses to move.

use std::sync::Arc;

use crate::application::handlers::pickup::PickupCodeIssuer;
use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{EntityRef, FulfillmentError, OrderId, Timestamp};
use crate::domain::logistics::{LogisticsStatus, LogisticsStatusChanged, ShipmentTrack};
use crate::ports::{EventPublisher, EventPublisherExt, TrackRepository, WriteOutcome};

/// Command to set the status of the track belonging to an order.
#[derive(Debug, Clone)]
pub struct UpdateTrackStatusCommand {
    pub order_id: OrderId,
    pub status: LogisticsStatus,
}

/// Result of a successful status update.
#[derive(Debug, Clone)]
pub struct UpdateTrackStatusResult {
    pub track: ShipmentTrack,
    pub previous: LogisticsStatus,
    pub pickup_minted: bool,
}

/// Handler for direct track status updates.
pub struct UpdateTrackStatusHandler {
    tracks: Arc<dyn TrackRepository>,
    pickup: Arc<PickupCodeIssuer>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: FulfillmentPolicy,
}

impl UpdateTrackStatusHandler {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        pickup: Arc<PickupCodeIssuer>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            tracks,
            pickup,
            event_publisher,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateTrackStatusCommand,
    ) -> Result<UpdateTrackStatusResult, FulfillmentError> {
        let mut observed: Option<LogisticsStatus> = None;
        let mut conflicts = 0u32;

        let (track, previous, pickup_minted) = loop {
            // 1. Locate the track through its order
            let mut track = self
                .tracks
                .find_by_order_id(&cmd.order_id)
                .await?
                .ok_or_else(|| {
                    FulfillmentError::not_found(EntityRef::TrackForOrder(cmd.order_id))
                })?;

            // 2. Status moved under us since the first read
            if let Some(seen) = observed {
                if seen != track.status() {
                    return Err(FulfillmentError::conflict(format!(
                        "track for order {} moved from {} to {} concurrently",
                        cmd.order_id,
                        seen,
                        track.status()
                    )));
                }
            }
            observed = Some(track.status());

            // 3. Override, then mint if the track just became eligible
            let now = Timestamp::now();
            let expected = track.version();
            let previous = track.override_status(cmd.status, now)?;
            let minted = self.pickup.mint_if_eligible(&mut track, now).await?;

            // 4. Conditional write
            match self.tracks.update_if_version(&track, expected).await? {
                WriteOutcome::Applied { version } => {
                    track.mark_persisted(version);
                    break (track, previous, minted);
                }
                WriteOutcome::Conflict => {
                    conflicts += 1;
                    if conflicts > self.policy.conflict_retries {
                        return Err(FulfillmentError::conflict(format!(
                            "track for order {} still contended after {} retries",
                            cmd.order_id, self.policy.conflict_retries
                        )));
                    }
                    tracing::warn!(order_id = %cmd.order_id, attempt = conflicts, "Write conflict, retrying");
                }
            }
        };

        tracing::info!(
            track_id = %track.id(),
            order_id = %cmd.order_id,
            from = %previous,
            to = %cmd.status,
            "Track status set"
        );

        // 5. Publish
        self.event_publisher
            .publish_committed(&LogisticsStatusChanged::new(&track, previous))
            .await;
        if pickup_minted {
            self.pickup.announce(&track).await;
        }

        Ok(UpdateTrackStatusResult {
            track,
            previous,
            pickup_minted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Harness;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::logistics::event_types;
    use crate::domain::order::OrderStatus;
    use crate::ports::OrderRepository;

    fn handler(harness: &Harness) -> UpdateTrackStatusHandler {
        UpdateTrackStatusHandler::new(
            harness.tracks.clone(),
            harness.issuer(),
            harness.bus.clone(),
            harness.policy,
        )
    }

    #[tokio::test]
    async fn sets_status_outside_the_table() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Paid).await;
        let track = harness.seed_track(&order, LogisticsStatus::Paid).await;

        // paid -> confirmed is not an edge, but corrections may jump.
        let result = handler(&harness)
            .handle(UpdateTrackStatusCommand {
                order_id: *order.id(),
                status: LogisticsStatus::Confirmed,
            })
            .await
            .unwrap();

        assert_eq!(result.previous, LogisticsStatus::Paid);
        assert_eq!(result.track.status(), LogisticsStatus::Confirmed);
        assert!(result.track.events().is_empty());
        let stored = harness.tracks.find_by_id(track.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), LogisticsStatus::Confirmed);
        assert_eq!(stored.version(), 1);
        assert_eq!(
            harness.bus.events_of_type(event_types::LOGISTICS_STATUS_CHANGED).len(),
            1
        );
        assert!(!harness.bus.has_event(event_types::LOGISTICS_TRACK_ADDED));
    }

    #[tokio::test]
    async fn eligible_status_mints_code() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        harness.seed_track(&order, LogisticsStatus::Shipped).await;

        let result = handler(&harness)
            .handle(UpdateTrackStatusCommand {
                order_id: *order.id(),
                status: LogisticsStatus::Delivering,
            })
            .await
            .unwrap();

        assert!(result.pickup_minted);
        let mirrored = harness.orders.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(mirrored.pickup(), result.track.pickup());
    }

    #[tokio::test]
    async fn terminal_track_refuses_to_move() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Cancelled).await;
        harness.seed_track(&order, LogisticsStatus::Cancelled).await;

        let err = handler(&harness)
            .handle(UpdateTrackStatusCommand {
                order_id: *order.id(),
                status: LogisticsStatus::Delivering,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(harness.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn order_without_track_is_not_found() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;

        let err = handler(&harness)
            .handle(UpdateTrackStatusCommand {
                order_id: *order.id(),
                status: LogisticsStatus::Delivering,
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FulfillmentError::not_found(EntityRef::TrackForOrder(*order.id()))
        );
        assert_eq!(err.code(), ErrorCode::TrackNotFound);
    }
}
