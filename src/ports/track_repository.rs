//! Shipment track repository port.
//!
//! Besides plain loads, the store offers an append primitive so the event
//! log grows in place instead of being rewritten, and the two lookups the
//! pickup code subsystem relies on.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, Timestamp, TrackId};
use crate::domain::logistics::{ShipmentTrack, TrackEvent};
use crate::domain::pickup::PickupCode;

use super::WriteOutcome;

/// Repository port for ShipmentTrack aggregate persistence.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Save a new track.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the tracking number is taken or the order
    ///   already has a track
    /// - `DatabaseError` on persistence failure
    async fn save(&self, track: &ShipmentTrack) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TrackId) -> Result<Option<ShipmentTrack>, DomainError>;

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError>;

    async fn find_by_logistics_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentTrack>, DomainError>;

    /// Find the track of `order_id` whose pickup code is `code`.
    ///
    /// Expiry is not checked here.
    async fn find_by_pickup_code(
        &self,
        code: &PickupCode,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError>;

    /// True if any track holds `code` with an expiry not before `now`.
    async fn pickup_code_in_use(
        &self,
        code: &PickupCode,
        now: &Timestamp,
    ) -> Result<bool, DomainError>;

    /// Replace the stored track (all fields but the event log) if its
    /// version still equals `expected_version`.
    async fn update_if_version(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError>;

    /// Append `event` to the stored log and copy the scalar fields of
    /// `track` (status, pickup grant, route, updated_at), guarded by
    /// `expected_version`.
    async fn append_event(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
        event: &TrackEvent,
    ) -> Result<WriteOutcome, DomainError>;
}
