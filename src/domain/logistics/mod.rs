//! Logistics domain module.
//!
//! Shipment tracks, their append-only event log and the extended
//! final-mile status graph.

mod events;
mod status;
mod track;

pub use events::{
    event_types, LogisticsCreated, LogisticsStatusChanged, LogisticsTrackAdded, LogisticsUpdated,
};
pub use status::LogisticsStatus;
pub use track::{GeoPoint, Route, ShipmentTrack, TrackEvent};
