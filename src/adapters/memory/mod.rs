//! In-memory persistence adapters.
//!
//! Used when no database is configured and throughout the tests.

mod order_repository;
mod track_repository;

pub use order_repository::InMemoryOrderRepository;
pub use track_repository::InMemoryTrackRepository;
