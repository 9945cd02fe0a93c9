//! Tunables shared by the transition handlers.

use chrono::Duration;

use crate::config::FulfillmentConfig;
use crate::domain::pickup::DEFAULT_MAX_ATTEMPTS;

/// Default pickup code lifetime.
pub const DEFAULT_PICKUP_CODE_TTL_HOURS: i64 = 72;

/// Default number of re-reads after a write conflict.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Operational knobs for the Status Transition Engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentPolicy {
    /// How long a minted pickup code stays valid.
    pub pickup_code_ttl: Duration,
    /// Bound on unique pickup-code generation.
    pub pickup_code_max_attempts: u32,
    /// Retries of a read-check-write after a version conflict.
    pub conflict_retries: u32,
}

impl Default for FulfillmentPolicy {
    fn default() -> Self {
        Self {
            pickup_code_ttl: Duration::hours(DEFAULT_PICKUP_CODE_TTL_HOURS),
            pickup_code_max_attempts: DEFAULT_MAX_ATTEMPTS,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl From<&FulfillmentConfig> for FulfillmentPolicy {
    fn from(config: &FulfillmentConfig) -> Self {
        Self {
            pickup_code_ttl: config.pickup_code_ttl(),
            pickup_code_max_attempts: config.pickup_code_max_attempts,
            conflict_retries: config.conflict_retries,
        }
    }
}
