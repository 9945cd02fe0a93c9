//! In-memory ShipmentTrack repository.
//!
//! Secondary lookups (order, tracking number, pickup code) scan the map.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, TrackId};
use crate::domain::logistics::{ShipmentTrack, TrackEvent};
use crate::domain::pickup::PickupCode;
use crate::ports::{TrackRepository, WriteOutcome};

#[derive(Debug, Clone, Default)]
pub struct InMemoryTrackRepository {
    tracks: Arc<RwLock<HashMap<TrackId, ShipmentTrack>>>,
}

impl InMemoryTrackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tracks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tracks.read().await.is_empty()
    }
}

/// Builds the stored form: scalar fields from `track`, log from `events`.
fn stored_form(track: &ShipmentTrack, events: Vec<TrackEvent>, version: u64) -> ShipmentTrack {
    ShipmentTrack::reconstitute(
        *track.id(),
        *track.order_id(),
        track.company().to_string(),
        track.tracking_number().to_string(),
        track.status(),
        events,
        track.route().clone(),
        track.pickup().cloned(),
        version,
        *track.created_at(),
        *track.updated_at(),
    )
}

#[async_trait]
impl TrackRepository for InMemoryTrackRepository {
    async fn save(&self, track: &ShipmentTrack) -> Result<(), DomainError> {
        let mut tracks = self.tracks.write().await;

        for existing in tracks.values() {
            if existing.id() == track.id() {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Track {} already exists", track.id()),
                ));
            }
            if existing.tracking_number() == track.tracking_number() {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Tracking number {} is already in use", track.tracking_number()),
                )
                .with_detail("field", "tracking_number"));
            }
            if existing.order_id() == track.order_id() {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Order {} already has a track", track.order_id()),
                )
                .with_detail("field", "order_id"));
            }
        }

        tracks.insert(*track.id(), track.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TrackId) -> Result<Option<ShipmentTrack>, DomainError> {
        Ok(self.tracks.read().await.get(id).cloned())
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        Ok(self
            .tracks
            .read()
            .await
            .values()
            .find(|t| t.order_id() == order_id)
            .cloned())
    }

    async fn find_by_logistics_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        Ok(self
            .tracks
            .read()
            .await
            .values()
            .find(|t| t.tracking_number() == tracking_number)
            .cloned())
    }

    async fn find_by_pickup_code(
        &self,
        code: &PickupCode,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        Ok(self
            .tracks
            .read()
            .await
            .values()
            .find(|t| t.order_id() == order_id && t.pickup().is_some_and(|g| &g.code == code))
            .cloned())
    }

    async fn pickup_code_in_use(
        &self,
        code: &PickupCode,
        now: &Timestamp,
    ) -> Result<bool, DomainError> {
        Ok(self.tracks.read().await.values().any(|t| {
            t.pickup()
                .is_some_and(|g| &g.code == code && !g.is_expired_at(now))
        }))
    }

    async fn update_if_version(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError> {
        let mut tracks = self.tracks.write().await;
        let events = match tracks.get(track.id()) {
            Some(stored) if stored.version() == expected_version => stored.events().to_vec(),
            _ => return Ok(WriteOutcome::Conflict),
        };

        let version = expected_version + 1;
        tracks.insert(*track.id(), stored_form(track, events, version));
        Ok(WriteOutcome::Applied { version })
    }

    async fn append_event(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
        event: &TrackEvent,
    ) -> Result<WriteOutcome, DomainError> {
        let mut tracks = self.tracks.write().await;
        let mut events = match tracks.get(track.id()) {
            Some(stored) if stored.version() == expected_version => stored.events().to_vec(),
            _ => return Ok(WriteOutcome::Conflict),
        };
        events.push(event.clone());

        let version = expected_version + 1;
        tracks.insert(*track.id(), stored_form(track, events, version));
        Ok(WriteOutcome::Applied { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::logistics::LogisticsStatus;
    use crate::domain::pickup::PickupGrant;
    use chrono::Duration;

    fn test_track(tracking_number: &str) -> ShipmentTrack {
        ShipmentTrack::open(
            TrackId::new(),
            OrderId::new(),
            "SwiftShip",
            tracking_number,
            LogisticsStatus::Shipped,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lookups_by_secondary_keys() {
        let repo = InMemoryTrackRepository::new();
        let track = test_track("SS-1");
        repo.save(&track).await.unwrap();

        assert!(repo.find_by_order_id(track.order_id()).await.unwrap().is_some());
        assert!(repo.find_by_logistics_number("SS-1").await.unwrap().is_some());
        assert!(repo.find_by_logistics_number("SS-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_tracking_number_is_rejected() {
        let repo = InMemoryTrackRepository::new();
        repo.save(&test_track("SS-1")).await.unwrap();

        let err = repo.save(&test_track("SS-1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn append_grows_stored_log_in_order() {
        let repo = InMemoryTrackRepository::new();
        let mut track = test_track("SS-1");
        repo.save(&track).await.unwrap();

        let first = TrackEvent::new(Timestamp::now(), "Hub A", "Sorted");
        track.append_event(first.clone(), Timestamp::now()).unwrap();
        assert!(repo.append_event(&track, 0, &first).await.unwrap().is_applied());

        let second = TrackEvent::new(Timestamp::now(), "Hub B", "Arrived")
            .with_status(LogisticsStatus::WaitingForDelivery);
        track.append_event(second.clone(), Timestamp::now()).unwrap();
        assert!(repo.append_event(&track, 1, &second).await.unwrap().is_applied());

        let stored = repo.find_by_id(track.id()).await.unwrap().unwrap();
        assert_eq!(stored.events(), &[first, second][..]);
        assert_eq!(stored.status(), LogisticsStatus::WaitingForDelivery);
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn stale_append_conflicts_and_leaves_log() {
        let repo = InMemoryTrackRepository::new();
        let track = test_track("SS-1");
        repo.save(&track).await.unwrap();

        let event = TrackEvent::new(Timestamp::now(), "Hub", "Note");
        assert_eq!(
            repo.append_event(&track, 7, &event).await.unwrap(),
            WriteOutcome::Conflict
        );
        assert!(repo
            .find_by_id(track.id())
            .await
            .unwrap()
            .unwrap()
            .events()
            .is_empty());
    }

    #[tokio::test]
    async fn expired_codes_are_free_again() {
        let repo = InMemoryTrackRepository::new();
        let mut track = test_track("SS-1");
        let code = PickupCode::parse("123456").unwrap();
        let issued = Timestamp::now();
        track.attach_pickup(PickupGrant::issue(code.clone(), issued, Duration::hours(1)), issued);
        repo.save(&track).await.unwrap();

        assert!(repo.pickup_code_in_use(&code, &issued).await.unwrap());
        let later = issued.plus(Duration::hours(2));
        assert!(!repo.pickup_code_in_use(&code, &later).await.unwrap());

        assert!(repo
            .find_by_pickup_code(&code, track.order_id())
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_by_pickup_code(&code, &OrderId::new())
            .await
            .unwrap()
            .is_none());
    }
}
