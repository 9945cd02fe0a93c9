//! Order repository port.
//!
//! The persistence facade the transition handlers need for orders:
//! load by id and a version-checked update.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::Order;

use super::WriteOutcome;

/// Repository port for Order aggregate persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save a new order at its current version.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if an order with the same id exists
    /// - `DatabaseError` on persistence failure
    async fn save(&self, order: &Order) -> Result<(), DomainError>;

    /// Find an order by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Replace the stored order if its version still equals `expected_version`.
    ///
    /// On success the stored version becomes `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure (a version mismatch is not an error)
    async fn update_if_version(
        &self,
        order: &Order,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError>;
}
