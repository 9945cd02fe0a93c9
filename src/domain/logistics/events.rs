//! Logistics domain events.
//!
//! - `LogisticsCreated` - track opened for an order
//! - `LogisticsUpdated` - non-status change (position, pickup code minted)
//! - `LogisticsStatusChanged` - track status set
//! - `LogisticsTrackAdded` - node appended to the event log

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, OrderId, Timestamp, TrackId};

use super::{LogisticsStatus, ShipmentTrack, TrackEvent};

/// Published when a track is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsCreated {
    pub event_id: EventId,
    pub track_id: TrackId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub track: ShipmentTrack,
    pub created_at: Timestamp,
}

domain_event!(
    LogisticsCreated,
    event_type = "logistics.created.v1",
    aggregate_id = track_id,
    aggregate_type = "ShipmentTrack",
    occurred_at = created_at,
    event_id = event_id
);

impl LogisticsCreated {
    pub fn new(track: &ShipmentTrack) -> Self {
        Self {
            event_id: EventId::new(),
            track_id: *track.id(),
            order_id: *track.order_id(),
            tracking_number: track.tracking_number().to_string(),
            track: track.clone(),
            created_at: *track.created_at(),
        }
    }
}

/// Published when track data changes without a status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsUpdated {
    pub event_id: EventId,
    pub track_id: TrackId,
    pub tracking_number: String,
    pub track: ShipmentTrack,
    pub pickup_expires_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

domain_event!(
    LogisticsUpdated,
    event_type = "logistics.updated.v1",
    aggregate_id = track_id,
    aggregate_type = "ShipmentTrack",
    occurred_at = updated_at,
    event_id = event_id
);

impl LogisticsUpdated {
    pub fn new(track: &ShipmentTrack) -> Self {
        Self {
            event_id: EventId::new(),
            track_id: *track.id(),
            tracking_number: track.tracking_number().to_string(),
            track: track.clone(),
            pickup_expires_at: track.pickup().map(|grant| grant.expires_at),
            updated_at: *track.updated_at(),
        }
    }
}

/// Published whenever a track's status is set, by event or by override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsStatusChanged {
    pub event_id: EventId,
    pub track_id: TrackId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub from: LogisticsStatus,
    pub to: LogisticsStatus,
    pub changed_at: Timestamp,
}

domain_event!(
    LogisticsStatusChanged,
    event_type = "logistics.status_changed.v1",
    aggregate_id = track_id,
    aggregate_type = "ShipmentTrack",
    occurred_at = changed_at,
    event_id = event_id
);

impl LogisticsStatusChanged {
    pub fn new(track: &ShipmentTrack, from: LogisticsStatus) -> Self {
        Self {
            event_id: EventId::new(),
            track_id: *track.id(),
            order_id: *track.order_id(),
            tracking_number: track.tracking_number().to_string(),
            from,
            to: track.status(),
            changed_at: *track.updated_at(),
        }
    }
}

/// Published for every node appended to a track's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsTrackAdded {
    pub event_id: EventId,
    pub track_id: TrackId,
    pub tracking_number: String,
    pub node: TrackEvent,
    /// Log length after the append.
    pub event_count: usize,
    pub added_at: Timestamp,
}

domain_event!(
    LogisticsTrackAdded,
    event_type = "logistics.track_added.v1",
    aggregate_id = track_id,
    aggregate_type = "ShipmentTrack",
    occurred_at = added_at,
    event_id = event_id
);

impl LogisticsTrackAdded {
    pub fn new(track: &ShipmentTrack, node: TrackEvent) -> Self {
        Self {
            event_id: EventId::new(),
            track_id: *track.id(),
            tracking_number: track.tracking_number().to_string(),
            node,
            event_count: track.events().len(),
            added_at: *track.updated_at(),
        }
    }
}

pub mod event_types {
    pub const LOGISTICS_CREATED: &str = "logistics.created.v1";
    pub const LOGISTICS_UPDATED: &str = "logistics.updated.v1";
    pub const LOGISTICS_STATUS_CHANGED: &str = "logistics.status_changed.v1";
    pub const LOGISTICS_TRACK_ADDED: &str = "logistics.track_added.v1";

    pub const ALL: [&str; 4] = [
        LOGISTICS_CREATED,
        LOGISTICS_UPDATED,
        LOGISTICS_STATUS_CHANGED,
        LOGISTICS_TRACK_ADDED,
    ];
}
