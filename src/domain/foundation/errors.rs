//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

use super::{OrderId, TrackId};

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidPickupCode,

    // Not found errors
    OrderNotFound,
    TrackNotFound,
    PickupCodeNotFound,

    // State errors
    InvalidStateTransition,
    PickupCodeExpired,
    CodeSpaceExhausted,
    WriteConflict,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidPickupCode => "INVALID_PICKUP_CODE",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::TrackNotFound => "TRACK_NOT_FOUND",
            ErrorCode::PickupCodeNotFound => "PICKUP_CODE_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PickupCodeExpired => "PICKUP_CODE_EXPIRED",
            ErrorCode::CodeSpaceExhausted => "CODE_SPACE_EXHAUSTED",
            ErrorCode::WriteConflict => "WRITE_CONFLICT",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
///
/// Crosses port boundaries; adapters convert transport failures into it.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a database error from any displayable cause.
    pub fn database(context: &str, cause: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, format!("{}: {}", context, cause))
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

/// The entity a failed lookup referred to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Order(OrderId),
    Track(TrackId),
    TrackForOrder(OrderId),
    TrackingNumber(String),
    PickupCode { order_id: OrderId },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Order(id) => write!(f, "order {}", id),
            EntityRef::Track(id) => write!(f, "track {}", id),
            EntityRef::TrackForOrder(id) => write!(f, "track for order {}", id),
            EntityRef::TrackingNumber(number) => write!(f, "track with number {}", number),
            EntityRef::PickupCode { order_id } => write!(f, "pickup code for order {}", order_id),
        }
    }
}

/// Errors surfaced by fulfillment operations.
///
/// # Retry Semantics
///
/// | Error | Retried internally | Caller may retry unchanged |
/// |-------|--------------------|----------------------------|
/// | NotFound | no | no |
/// | InvalidTransition | no | no |
/// | CodeSpaceExhausted | no | no (operational alarm) |
/// | Conflict | bounded | yes |
/// | Infrastructure | no | yes |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentError {
    /// Entity reference does not resolve.
    NotFound(EntityRef),

    /// Target status is not reachable from the current one.
    InvalidTransition { from: String, to: String },

    /// Unique pickup-code generation exceeded its attempt bound.
    CodeSpaceExhausted { attempts: u32 },

    /// A concurrent writer changed the record.
    Conflict(String),

    /// Pickup code is not six ASCII digits.
    InvalidPickupCode,

    /// Pickup code matched but is past its expiry.
    PickupCodeExpired,

    /// Input validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl FulfillmentError {
    pub fn not_found(entity: EntityRef) -> Self {
        FulfillmentError::NotFound(entity)
    }

    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        FulfillmentError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        FulfillmentError::Conflict(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        FulfillmentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FulfillmentError::NotFound(EntityRef::Order(_)) => ErrorCode::OrderNotFound,
            FulfillmentError::NotFound(EntityRef::PickupCode { .. }) => {
                ErrorCode::PickupCodeNotFound
            }
            FulfillmentError::NotFound(_) => ErrorCode::TrackNotFound,
            FulfillmentError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            FulfillmentError::CodeSpaceExhausted { .. } => ErrorCode::CodeSpaceExhausted,
            FulfillmentError::Conflict(_) => ErrorCode::WriteConflict,
            FulfillmentError::InvalidPickupCode => ErrorCode::InvalidPickupCode,
            FulfillmentError::PickupCodeExpired => ErrorCode::PickupCodeExpired,
            FulfillmentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            FulfillmentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FulfillmentError::NotFound(entity) => format!("Not found: {}", entity),
            FulfillmentError::InvalidTransition { from, to } => {
                format!("Cannot transition from {} to {}", from, to)
            }
            FulfillmentError::CodeSpaceExhausted { attempts } => {
                format!("No free pickup code after {} attempts", attempts)
            }
            FulfillmentError::Conflict(msg) => format!("Concurrent update: {}", msg),
            FulfillmentError::InvalidPickupCode => "Pickup code must be six digits".to_string(),
            FulfillmentError::PickupCodeExpired => "Pickup code has expired".to_string(),
            FulfillmentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            FulfillmentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl fmt::Display for FulfillmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl Error for FulfillmentError {}

impl From<DomainError> for FulfillmentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::WriteConflict => FulfillmentError::Conflict(err.message),
            ErrorCode::ValidationFailed => FulfillmentError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => FulfillmentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for FulfillmentError {
    fn from(err: ValidationError) -> Self {
        FulfillmentError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("merchant_id");
        assert_eq!(format!("{}", err), "Field 'merchant_id' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("quantity", 1, 10_000, 0);
        assert_eq!(
            format!("{}", err),
            "Field 'quantity' must be between 1 and 10000, got 0"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::OrderNotFound, "Order not found");
        assert_eq!(format!("{}", err), "[ORDER_NOT_FOUND] Order not found");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::ValidationFailed, "Validation failed")
            .with_detail("field", "items");
        assert_eq!(err.details.get("field"), Some(&"items".to_string()));
    }

    #[test]
    fn not_found_codes_follow_entity() {
        let order = FulfillmentError::not_found(EntityRef::Order(OrderId::new()));
        let track = FulfillmentError::not_found(EntityRef::TrackForOrder(OrderId::new()));
        assert_eq!(order.code(), ErrorCode::OrderNotFound);
        assert_eq!(track.code(), ErrorCode::TrackNotFound);
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = FulfillmentError::invalid_transition("delivered", "shipped");
        assert_eq!(err.to_string(), "Cannot transition from delivered to shipped");
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn write_conflict_domain_error_becomes_conflict() {
        let err: FulfillmentError =
            DomainError::new(ErrorCode::WriteConflict, "version moved").into();
        assert!(matches!(err, FulfillmentError::Conflict(_)));
    }

    #[test]
    fn database_error_becomes_infrastructure() {
        let err: FulfillmentError = DomainError::database("Failed to load order", "io").into();
        assert!(matches!(err, FulfillmentError::Infrastructure(_)));
    }

    #[test]
    fn validation_error_keeps_field_name() {
        let err: FulfillmentError = ValidationError::empty_field("items").into();
        assert!(matches!(
            err,
            FulfillmentError::ValidationFailed { ref field, .. } if field == "items"
        ));
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::CodeSpaceExhausted), "CODE_SPACE_EXHAUSTED");
        assert_eq!(format!("{}", ErrorCode::WriteConflict), "WRITE_CONFLICT");
    }
}
