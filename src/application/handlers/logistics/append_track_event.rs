//! AppendTrackEventHandler - Command handler for appending logistics nodes.
//!
//! The node lands with the store's append primitive, guarded by the version
//! read in the same pass. When the node carries a status the track moves
//! with it, and the first move into a pickup-eligible status mints the
//! track's pickup code as part of that same write.
//!
//! A lost conditional append is retried up to the policy bound. A status
//! node fails with `Conflict` instead if the track's status moved since the
//! first read; a status-less node is legal in any status and just retries.

use std::sync::Arc;

use crate::application::handlers::pickup::PickupCodeIssuer;
use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{EntityRef, FulfillmentError, Timestamp, TrackId};
use crate::domain::logistics::{
    LogisticsStatus, LogisticsStatusChanged, LogisticsTrackAdded, ShipmentTrack, TrackEvent,
};
use crate::ports::{EventPublisher, EventPublisherExt, TrackRepository, WriteOutcome};

/// Command to append a node to a track's event log.
#[derive(Debug, Clone)]
pub struct AppendTrackEventCommand {
    pub track_id: TrackId,
    pub event: TrackEvent,
}

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct AppendTrackEventResult {
    pub track: ShipmentTrack,
    /// Status before the append, present when the node carried a status.
    pub previous_status: Option<LogisticsStatus>,
    /// A pickup code was minted by this append.
    pub pickup_minted: bool,
}

/// Handler for appending track events.
///
/// A node carrying a status must follow an edge of the shipment graph (or
/// repeat the current non-terminal status). Out-of-graph scans fail with
/// `InvalidTransition` and append nothing; they are not recorded as notes.
pub struct AppendTrackEventHandler {
    tracks: Arc<dyn TrackRepository>,
    pickup: Arc<PickupCodeIssuer>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: FulfillmentPolicy,
}

impl AppendTrackEventHandler {
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
        cmd: AppendTrackEventCommand,
    ) -> Result<AppendTrackEventResult, FulfillmentError> {
        let mut observed: Option<LogisticsStatus> = None;
        let mut conflicts = 0u32;

        let (track, previous_status, pickup_minted) = loop {
            // 1. Load current state
            let mut track = self
                .tracks
                .find_by_id(&cmd.track_id)
                .await?
                .ok_or_else(|| FulfillmentError::not_found(EntityRef::Track(cmd.track_id)))?;

            // 2. A status node judged against a status that has since moved
            if let (Some(seen), Some(_)) = (observed, cmd.event.status) {
                if seen != track.status() {
                    return Err(FulfillmentError::conflict(format!(
                        "track {} moved from {} to {} concurrently",
                        cmd.track_id,
                        seen,
                        track.status()
                    )));
                }
            }
            observed = Some(track.status());

            // 3. Append, then mint if the track just became eligible
            let now = Timestamp::now();
            let expected = track.version();
            let previous = track.append_event(cmd.event.clone(), now)?;
            let minted = self.pickup.mint_if_eligible(&mut track, now).await?;

            // 4. Conditional append
            match self.tracks.append_event(&track, expected, &cmd.event).await? {
                WriteOutcome::Applied { version } => {
                    track.mark_persisted(version);
                    break (track, previous, minted);
                }
                WriteOutcome::Conflict => {
                    conflicts += 1;
                    if conflicts > self.policy.conflict_retries {
                        return Err(FulfillmentError::conflict(format!(
                            "track {} still contended after {} retries",
                            cmd.track_id, self.policy.conflict_retries
                        )));
                    }
                    tracing::warn!(track_id = %cmd.track_id, attempt = conflicts, "Write conflict, retrying");
                }
            }
        };

        tracing::info!(
            track_id = %track.id(),
            events = track.events().len(),
            status = %track.status(),
            "Track event appended"
        );

        // 5. Publish: the node, then the status it carried
        self.event_publisher
            .publish_committed(&LogisticsTrackAdded::new(&track, cmd.event))
            .await;
        if let Some(from) = previous_status {
            self.event_publisher
                .publish_committed(&LogisticsStatusChanged::new(&track, from))
                .await;
        }
        if pickup_minted {
            self.pickup.announce(&track).await;
        }

        Ok(AppendTrackEventResult {
            track,
            previous_status,
            pickup_minted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{Harness, RejectingPublisher};
    use crate::domain::foundation::ErrorCode;
    use crate::domain::logistics::event_types;
    use crate::domain::order::OrderStatus;

    fn handler(harness: &Harness) -> AppendTrackEventHandler {
        AppendTrackEventHandler::new(
            harness.tracks.clone(),
            harness.issuer(),
            harness.bus.clone(),
            harness.policy,
        )
    }

    fn node(location: &str) -> TrackEvent {
        TrackEvent::new(Timestamp::now(), location, "Parcel scanned")
    }

    #[tokio::test]
    async fn status_less_node_only_grows_the_log() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Shipped).await;

        let result = handler(&harness)
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Shanghai Hub"),
            })
            .await
            .unwrap();

        assert_eq!(result.previous_status, None);
        assert_eq!(result.track.status(), LogisticsStatus::Shipped);
        assert_eq!(result.track.events().len(), 1);
        assert!(harness.bus.has_event(event_types::LOGISTICS_TRACK_ADDED));
        assert!(!harness.bus.has_event(event_types::LOGISTICS_STATUS_CHANGED));
    }

    #[tokio::test]
    async fn status_node_moves_track_and_keeps_order() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Shipped).await;
        let handler = handler(&harness);

        handler
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Origin"),
            })
            .await
            .unwrap();
        let result = handler
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Hub").with_status(LogisticsStatus::WaitingForDelivery),
            })
            .await
            .unwrap();

        assert_eq!(result.previous_status, Some(LogisticsStatus::Shipped));
        assert_eq!(result.track.status(), LogisticsStatus::WaitingForDelivery);

        let stored = harness.tracks.find_by_id(track.id()).await.unwrap().unwrap();
        let locations: Vec<&str> = stored.events().iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["Origin", "Hub"]);
        assert_eq!(stored.status(), LogisticsStatus::WaitingForDelivery);

        let changed = harness.bus.events_of_type(event_types::LOGISTICS_STATUS_CHANGED);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].payload["from"], "shipped");
        assert_eq!(changed[0].payload["to"], "waiting_for_delivery");
    }

    #[tokio::test]
    async fn first_eligible_status_mints_once() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Shipped).await;
        let handler = handler(&harness);

        let first = handler
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Hub").with_status(LogisticsStatus::WaitingForDelivery),
            })
            .await
            .unwrap();
        let second = handler
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Van").with_status(LogisticsStatus::Delivering),
            })
            .await
            .unwrap();

        assert!(first.pickup_minted);
        assert!(!second.pickup_minted);
        assert_eq!(first.track.pickup(), second.track.pickup());
        assert_eq!(harness.bus.events_of_type(event_types::LOGISTICS_UPDATED).len(), 1);
    }

    #[tokio::test]
    async fn illegal_status_appends_nothing() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Delivered).await;
        let track = harness.seed_track(&order, LogisticsStatus::Delivered).await;

        let err = handler(&harness)
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Depot").with_status(LogisticsStatus::Shipped),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        let stored = harness.tracks.find_by_id(track.id()).await.unwrap().unwrap();
        assert!(stored.events().is_empty());
        assert_eq!(harness.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn out_of_graph_scan_is_rejected() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Shipped).await;

        let err = handler(&harness)
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Door").with_status(LogisticsStatus::Confirmed),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FulfillmentError::InvalidTransition { .. }));
        let stored = harness.tracks.find_by_id(track.id()).await.unwrap().unwrap();
        assert!(stored.events().is_empty());
        assert_eq!(stored.status(), LogisticsStatus::Shipped);
    }

    #[tokio::test]
    async fn failed_publish_keeps_the_append() {
        let harness = Harness::new();
        let order = harness.seed_order(OrderStatus::Shipped).await;
        let track = harness.seed_track(&order, LogisticsStatus::Shipped).await;
        let handler = AppendTrackEventHandler::new(
            harness.tracks.clone(),
            harness.issuer(),
            Arc::new(RejectingPublisher),
            harness.policy,
        );

        let result = handler
            .handle(AppendTrackEventCommand {
                track_id: *track.id(),
                event: node("Hub").with_status(LogisticsStatus::WaitingForDelivery),
            })
            .await
            .unwrap();

        assert!(result.pickup_minted);
        let stored = harness.tracks.find_by_id(track.id()).await.unwrap().unwrap();
        assert_eq!(stored.events().len(), 1);
        assert_eq!(stored.status(), LogisticsStatus::WaitingForDelivery);
    }

    #[tokio::test]
    async fn unknown_track_is_not_found() {
        let harness = Harness::new();
        let missing = TrackId::new();

        let err = handler(&harness)
            .handle(AppendTrackEventCommand {
                track_id: missing,
                event: node("Nowhere"),
            })
            .await
            .unwrap_err();

        assert_eq!(err, FulfillmentError::not_found(EntityRef::Track(missing)));
    }
}
