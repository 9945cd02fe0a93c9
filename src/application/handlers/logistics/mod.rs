//! Shipment track command handlers.

mod append_track_event;
mod create_track;
mod update_track_position;
mod update_track_status;

pub use append_track_event::{AppendTrackEventCommand, AppendTrackEventHandler, AppendTrackEventResult};
pub use create_track::{CreateTrackCommand, CreateTrackHandler, CreateTrackResult};
pub use update_track_position::{
    UpdateTrackPositionCommand, UpdateTrackPositionHandler, UpdateTrackPositionResult,
};
pub use update_track_status::{UpdateTrackStatusCommand, UpdateTrackStatusHandler, UpdateTrackStatusResult};
