//! LogisticsStatus enum and its transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::order::OrderStatus;

/// Status of a shipment track.
///
/// A superset of [`OrderStatus`] that adds two final-mile states between
/// `shipped` and `confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogisticsStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    /// Arrived at a distribution hub, awaiting final-mile handoff.
    WaitingForDelivery,
    /// Out for final-mile delivery.
    Delivering,
    Confirmed,
    Delivered,
    Cancelled,
    Refunded,
}

impl LogisticsStatus {
    pub const ALL: [LogisticsStatus; 9] = [
        LogisticsStatus::Pending,
        LogisticsStatus::Paid,
        LogisticsStatus::Shipped,
        LogisticsStatus::WaitingForDelivery,
        LogisticsStatus::Delivering,
        LogisticsStatus::Confirmed,
        LogisticsStatus::Delivered,
        LogisticsStatus::Cancelled,
        LogisticsStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogisticsStatus::Pending => "pending",
            LogisticsStatus::Paid => "paid",
            LogisticsStatus::Shipped => "shipped",
            LogisticsStatus::WaitingForDelivery => "waiting_for_delivery",
            LogisticsStatus::Delivering => "delivering",
            LogisticsStatus::Confirmed => "confirmed",
            LogisticsStatus::Delivered => "delivered",
            LogisticsStatus::Cancelled => "cancelled",
            LogisticsStatus::Refunded => "refunded",
        }
    }

    /// Statuses at which a recipient may collect the parcel with a pickup code.
    pub fn is_pickup_eligible(&self) -> bool {
        matches!(
            self,
            LogisticsStatus::WaitingForDelivery
                | LogisticsStatus::Delivering
                | LogisticsStatus::Delivered
        )
    }
}

impl StateMachine for LogisticsStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use LogisticsStatus::*;
        match self {
            Pending => &[Paid, Cancelled, Refunded],
            Paid => &[Shipped, Cancelled, Refunded],
            Shipped => &[WaitingForDelivery, Delivering, Cancelled, Refunded],
            WaitingForDelivery => &[Delivering, Cancelled, Refunded],
            // A failed delivery attempt returns the parcel to the hub.
            Delivering => &[WaitingForDelivery, Confirmed, Cancelled, Refunded],
            Confirmed => &[Delivered, Cancelled, Refunded],
            Delivered | Cancelled | Refunded => &[],
        }
    }
}

impl From<OrderStatus> for LogisticsStatus {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => LogisticsStatus::Pending,
            OrderStatus::Paid => LogisticsStatus::Paid,
            OrderStatus::Shipped => LogisticsStatus::Shipped,
            OrderStatus::Confirmed => LogisticsStatus::Confirmed,
            OrderStatus::Delivered => LogisticsStatus::Delivered,
            OrderStatus::Cancelled => LogisticsStatus::Cancelled,
            OrderStatus::Refunded => LogisticsStatus::Refunded,
        }
    }
}

impl fmt::Display for LogisticsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogisticsStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogisticsStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "logistics_status",
                    format!("unknown status '{}'", s),
                )
            })
    }
}
