//! Subscription topics (rooms).

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Name of the global room receiving every order status change.
pub const ALL_UPDATES: &str = "all-updates";

/// A logical room clients subscribe to.
///
/// Rendered as `order:<orderId>`, `track:<trackingNumber>` or `all-updates`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Order(String),
    Track(String),
    AllUpdates,
}

impl Topic {
    /// # Errors
    ///
    /// - `EmptyField` if `order_id` is blank
    pub fn order(order_id: impl Into<String>) -> Result<Self, ValidationError> {
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(ValidationError::empty_field("orderId"));
        }
        Ok(Topic::Order(order_id))
    }

    /// # Errors
    ///
    /// - `EmptyField` if `tracking_number` is blank
    pub fn track(tracking_number: impl Into<String>) -> Result<Self, ValidationError> {
        let tracking_number = tracking_number.into();
        if tracking_number.trim().is_empty() {
            return Err(ValidationError::empty_field("trackingNumber"));
        }
        Ok(Topic::Track(tracking_number))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Order(id) => write!(f, "order:{}", id),
            Topic::Track(number) => write!(f, "track:{}", number),
            Topic::AllUpdates => f.write_str(ALL_UPDATES),
        }
    }
}

impl FromStr for Topic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_UPDATES {
            return Ok(Topic::AllUpdates);
        }
        match s.split_once(':') {
            Some(("order", id)) => Topic::order(id),
            Some(("track", number)) => Topic::track(number),
            _ => Err(ValidationError::invalid_format(
                "topic",
                format!("unknown topic '{}'", s),
            )),
        }
    }
}
