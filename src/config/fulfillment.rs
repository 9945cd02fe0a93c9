//! Fulfillment engine configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Pickup code and conflict-retry settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FulfillmentConfig {
    /// Pickup code lifetime in hours
    #[serde(default = "default_pickup_code_ttl_hours")]
    pub pickup_code_ttl_hours: i64,

    /// Attempts allowed when searching for a free pickup code
    #[serde(default = "default_pickup_code_max_attempts")]
    pub pickup_code_max_attempts: u32,

    /// Re-reads after a version conflict before giving up
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

impl FulfillmentConfig {
    pub fn pickup_code_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.pickup_code_ttl_hours)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=720).contains(&self.pickup_code_ttl_hours) {
            return Err(ValidationError::InvalidPickupCodeTtl);
        }
        if !(1..=10_000).contains(&self.pickup_code_max_attempts) {
            return Err(ValidationError::InvalidAttemptBound);
        }
        if self.conflict_retries > 10 {
            return Err(ValidationError::TooManyConflictRetries);
        }
        Ok(())
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            pickup_code_ttl_hours: default_pickup_code_ttl_hours(),
            pickup_code_max_attempts: default_pickup_code_max_attempts(),
            conflict_retries: default_conflict_retries(),
        }
    }
}

fn default_pickup_code_ttl_hours() -> i64 {
    72
}

fn default_pickup_code_max_attempts() -> u32 {
    100
}

fn default_conflict_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FulfillmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pickup_code_ttl(), chrono::Duration::hours(72));
    }

    #[test]
    fn ttl_must_be_positive_and_bounded() {
        for hours in [0, -1, 721] {
            let config = FulfillmentConfig {
                pickup_code_ttl_hours: hours,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidPickupCodeTtl));
        }
    }

    #[test]
    fn attempt_bound_must_be_positive() {
        let config = FulfillmentConfig {
            pickup_code_max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidAttemptBound));
    }

    #[test]
    fn zero_retries_is_allowed() {
        let config = FulfillmentConfig {
            conflict_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = FulfillmentConfig {
            conflict_retries: 11,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::TooManyConflictRetries));
    }
}
