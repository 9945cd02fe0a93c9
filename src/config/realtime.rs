//! Realtime broker configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Subscription session settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Events buffered per session before the oldest are dropped
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,
}

impl RealtimeConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=65_536).contains(&self.subscriber_queue_capacity) {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
        }
    }
}

fn default_subscriber_queue_capacity() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_valid() {
        let config = RealtimeConfig::default();
        assert_eq!(config.subscriber_queue_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = RealtimeConfig {
            subscriber_queue_capacity: 0,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueueCapacity));
    }
}
