//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `FULFILLMENT_HUB`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use fulfillment_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Pickup codes live {}h", config.fulfillment.pickup_code_ttl_hours);
//! ```

mod database;
mod error;
mod fulfillment;
mod realtime;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use fulfillment::FulfillmentConfig;
pub use realtime::RealtimeConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults except `database`, whose absence selects
/// in-memory persistence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; in-memory stores when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Pickup code and conflict-retry settings
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,

    /// Realtime broker settings
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FULFILLMENT_HUB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FULFILLMENT_HUB__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `FULFILLMENT_HUB__DATABASE__URL=...` -> `database.url = ...`
    /// - `FULFILLMENT_HUB__FULFILLMENT__PICKUP_CODE_TTL_HOURS=48`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FULFILLMENT_HUB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.fulfillment.validate()?;
        self.realtime.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
