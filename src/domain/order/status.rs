//! OrderStatus enum and its transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of an order.
///
/// Happy path: `pending → paid → shipped → confirmed → delivered`.
/// `cancelled` and `refunded` are absorbing side-branches reachable from
/// every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Confirmed,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl StateMachine for OrderStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use OrderStatus::*;
        match self {
            Pending => &[Paid, Cancelled, Refunded],
            Paid => &[Shipped, Cancelled, Refunded],
            Shipped => &[Confirmed, Cancelled, Refunded],
            Confirmed => &[Delivered, Cancelled, Refunded],
            Delivered | Cancelled | Refunded => &[],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("order_status", format!("unknown status '{}'", s))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    #[test]
    fn default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn happy_path_is_legal() {
        use OrderStatus::*;
        for (from, to) in [
            (Pending, Paid),
            (Paid, Shipped),
            (Shipped, Confirmed),
            (Confirmed, Delivered),
        ] {
            assert!(from.can_transition_to(&to), "{} -> {}", from, to);
        }
    }

    #[test]
    fn side_branches_reachable_from_every_non_terminal_state() {
        use OrderStatus::*;
        for from in [Pending, Paid, Shipped, Confirmed] {
            assert!(from.can_transition_to(&Cancelled));
            assert!(from.can_transition_to(&Refunded));
        }
    }

    #[test]
    fn delivered_to_shipped_is_rejected() {
        assert!(OrderStatus::Delivered
            .transition_to(OrderStatus::Shipped)
            .is_err());
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(&OrderStatus::Shipped));
        assert!(!OrderStatus::Paid.can_transition_to(&OrderStatus::Delivered));
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
    }

    #[test]
    fn parses_snake_case_names() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert!("PAID".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serializes_to_snake_case_json() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Refunded).unwrap(),
            "\"refunded\""
        );
    }

    proptest! {
        #[test]
        fn terminal_states_accept_nothing(from in any_status(), to in any_status()) {
            if from.is_terminal() {
                prop_assert!(from.transition_to(to).is_err());
            }
        }

        #[test]
        fn no_self_loops(status in any_status()) {
            prop_assert!(!status.can_transition_to(&status));
        }

        #[test]
        fn as_str_round_trips(status in any_status()) {
            prop_assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
