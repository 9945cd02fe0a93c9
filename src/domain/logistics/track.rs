//! Shipment track aggregate.
//!
//! A track follows one order's parcel through the carrier network. Its
//! event log is append-only and kept in insertion order; the track status
//! follows the most recent event that carries a status.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    FulfillmentError, OrderId, StateMachine, Timestamp, TrackId, ValidationError,
};
use crate::domain::pickup::PickupGrant;

use super::LogisticsStatus;

/// A WGS84 coordinate, display only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// # Errors
    ///
    /// - `OutOfRange` if a coordinate is outside its valid range or not finite
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::out_of_range("lat", -90, 90, lat as i64));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::out_of_range("lng", -180, 180, lng as i64));
        }
        Ok(Self { lat, lng })
    }
}

/// One node in a track's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    pub time: Timestamp,
    pub location: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LogisticsStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl TrackEvent {
    pub fn new(time: Timestamp, location: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            time,
            location: location.into(),
            description: description.into(),
            status: None,
            operator: None,
        }
    }

    pub fn with_status(mut self, status: LogisticsStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}

/// Display-only route geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Route {
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
    pub current: Option<GeoPoint>,
    pub path: Vec<GeoPoint>,
}

/// Shipment track aggregate.
///
/// # Invariants
///
/// - `tracking_number` is non-blank (uniqueness is enforced by the store)
/// - `events` only ever grows; existing entries are never touched
/// - `status` equals the status of the last status-carrying event
/// - a pickup grant, once attached, is never replaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentTrack {
    id: TrackId,
    order_id: OrderId,
    company: String,
    tracking_number: String,
    status: LogisticsStatus,
    events: Vec<TrackEvent>,
    route: Route,
    #[serde(skip)]
    pickup: Option<PickupGrant>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ShipmentTrack {
    /// Opens a track for an order.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the company or tracking number is blank
    pub fn open(
        id: TrackId,
        order_id: OrderId,
        company: impl Into<String>,
        tracking_number: impl Into<String>,
        status: LogisticsStatus,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let company = company.into();
        let tracking_number = tracking_number.into();
        if company.trim().is_empty() {
            return Err(ValidationError::empty_field("company"));
        }
        if tracking_number.trim().is_empty() {
            return Err(ValidationError::empty_field("tracking_number"));
        }

        Ok(Self {
            id,
            order_id,
            company,
            tracking_number,
            status,
            events: Vec::new(),
            route: Route::default(),
            pickup: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a track from persistence (no validation, no events).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TrackId,
        order_id: OrderId,
        company: String,
        tracking_number: String,
        status: LogisticsStatus,
        events: Vec<TrackEvent>,
        route: Route,
        pickup: Option<PickupGrant>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            order_id,
            company,
            tracking_number,
            status,
            events,
            route,
            pickup,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &TrackId {
        &self.id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn status(&self) -> LogisticsStatus {
        self.status
    }

    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn pickup(&self) -> Option<&PickupGrant> {
        self.pickup.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// True when the track sits in a pickup-eligible status without a code.
    pub fn needs_pickup_code(&self) -> bool {
        self.status.is_pickup_eligible() && self.pickup.is_none()
    }

    /// Appends `event` to the log, returning the previous status when the
    /// event carries one.
    ///
    /// An event repeating the current status is accepted (a repeat scan)
    /// unless the track is terminal. Status-less events are always accepted.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the event's status is not reachable
    pub fn append_event(
        &mut self,
        event: TrackEvent,
        now: Timestamp,
    ) -> Result<Option<LogisticsStatus>, FulfillmentError> {
        let previous = self.status;
        let next = match event.status {
            Some(target) if target == previous && !previous.is_terminal() => Some(target),
            Some(target) => Some(previous.transition_to(target)?),
            None => None,
        };

        self.events.push(event);
        if let Some(next) = next {
            self.status = next;
        }
        self.updated_at = now;

        Ok(next.map(|_| previous))
    }

    /// Sets the status directly, bypassing the transition table.
    ///
    /// Used for administrative corrections. A terminal track can only be
    /// "set" to the status it already has.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the track is terminal and `target` differs
    pub fn override_status(
        &mut self,
        target: LogisticsStatus,
        now: Timestamp,
    ) -> Result<LogisticsStatus, FulfillmentError> {
        let previous = self.status;
        if previous.is_terminal() && previous != target {
            return Err(FulfillmentError::invalid_transition(previous, target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(previous)
    }

    /// Attaches a freshly minted pickup grant.
    ///
    /// Returns false, leaving the track untouched, if a grant already exists.
    pub fn attach_pickup(&mut self, grant: PickupGrant, now: Timestamp) -> bool {
        if self.pickup.is_some() {
            return false;
        }
        self.pickup = Some(grant);
        self.updated_at = now;
        true
    }

    /// Sets the route end points shown on maps.
    pub fn set_route_ends(&mut self, start: Option<GeoPoint>, end: Option<GeoPoint>) {
        self.route.start = start;
        self.route.end = end;
    }

    /// Moves the current position, optionally extending the path polyline.
    pub fn update_position(&mut self, current: GeoPoint, extend_path: bool, now: Timestamp) {
        self.route.current = Some(current);
        if extend_path {
            self.route.path.push(current);
        }
        self.updated_at = now;
    }

    /// Records the version assigned by the store after a successful write.
    pub fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }
}
