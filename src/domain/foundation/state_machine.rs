//! State machine trait for status enums.
//!
//! Each status enum encodes its transition graph as an adjacency table
//! (`valid_transitions`); legality checks and terminal detection derive
//! from that table.

use std::fmt;

use super::FulfillmentError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for OrderStatus {
///     fn valid_transitions(&self) -> &'static [Self] {
///         match self {
///             Pending => &[Paid, Cancelled, Refunded],
///             // ... etc
///         }
///     }
/// }
///
/// let next = current.transition_to(OrderStatus::Paid)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + fmt::Debug + fmt::Display + 'static {
    /// Outgoing edges of this state.
    fn valid_transitions(&self) -> &'static [Self];

    /// Returns true if transition from self to target is an edge of the graph.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, FulfillmentError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(FulfillmentError::invalid_transition(self, target))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
