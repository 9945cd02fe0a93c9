//! UpdateTrackPositionHandler - Moves a track's display position.

use std::sync::Arc;

use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{EntityRef, FulfillmentError, Timestamp, TrackId};
use crate::domain::logistics::{GeoPoint, LogisticsUpdated, ShipmentTrack};
use crate::ports::{EventPublisher, EventPublisherExt, TrackRepository, WriteOutcome};

/// Command to move a track's current position.
#[derive(Debug, Clone)]
pub struct UpdateTrackPositionCommand {
    pub track_id: TrackId,
    pub current: GeoPoint,
    /// Also append `current` to the path polyline.
    pub extend_path: bool,
}

/// Result of a successful position update.
#[derive(Debug, Clone)]
pub struct UpdateTrackPositionResult {
    pub track: ShipmentTrack,
    pub event: LogisticsUpdated,
}

/// Handler for position updates. Status is never touched.
pub struct UpdateTrackPositionHandler {
    tracks: Arc<dyn TrackRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: FulfillmentPolicy,
}

impl UpdateTrackPositionHandler {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            tracks,
            event_publisher,
            policy,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateTrackPositionCommand,
    ) -> Result<UpdateTrackPositionResult, FulfillmentError> {
        let mut conflicts = 0u32;

        let track = loop {
            let mut track = self
                .tracks
                .find_by_id(&cmd.track_id)
                .await?
                .ok_or_else(|| FulfillmentError::not_found(EntityRef::Track(cmd.track_id)))?;

            let expected = track.version();
            track.update_position(cmd.current, cmd.extend_path, Timestamp::now());

            match self.tracks.update_if_version(&track, expected).await? {
                WriteOutcome::Applied { version } => {
                    track.mark_persisted(version);
                    break track;
                }
                WriteOutcome::Conflict => {
                    conflicts += 1;
                    if conflicts > self.policy.conflict_retries {
                        return Err(FulfillmentError::conflict(format!(
                            "track {} still contended after {} retries",
                            cmd.track_id, self.policy.conflict_retries
                        )));
                    }
                    tracing::debug!(track_id = %cmd.track_id, attempt = conflicts, "Position write conflict");
                }
            }
        };

        let event = LogisticsUpdated::new(&track);
        self.event_publisher.publish_committed(&event).await;

        Ok(UpdateTrackPositionResult { track, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Harness;
    use crate::domain::logistics::{event_types, LogisticsStatus};
    use crate::domain::order::OrderStatus;

    fn handler(harness: &Harness) -> UpdateTrackPositionHandler {
        UpdateTrackPositionHandler::new(harness.tracks.clone(), harness.bus.clone(), harness.policy)
    }

    #[tokio::test]
    async fn moves_position_and_extends_path() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Delivering).await;
        let handler = handler(&harness);

        let a = GeoPoint::new(31.2, 121.4).unwrap();
        let b = GeoPoint::new(31.3, 121.5).unwrap();
        handler
            .handle(UpdateTrackPositionCommand {
                track_id: *track.id(),
                current: a,
                extend_path: true,
            })
            .await
            .unwrap();
        let result = handler
            .handle(UpdateTrackPositionCommand {
                track_id: *track.id(),
                current: b,
                extend_path: false,
            })
            .await
            .unwrap();

        assert_eq!(result.track.route().current, Some(b));
        assert_eq!(result.track.route().path, vec![a]);
        assert_eq!(result.track.status(), LogisticsStatus::Delivering);
        assert_eq!(result.track.version(), 2);
        assert_eq!(harness.bus.events_of_type(event_types::LOGISTICS_UPDATED).len(), 2);
    }

    #[tokio::test]
    async fn unknown_track_is_not_found() {
        let harness = Harness::new();

        let err = handler(&harness)
            .handle(UpdateTrackPositionCommand {
                track_id: TrackId::new(),
                current: GeoPoint::new(0.0, 0.0).unwrap(),
                extend_path: false,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::NotFound(EntityRef::Track(_))));
    }
}
