//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresOrderRepository` - Orders with version-guarded updates
//! - `PostgresTrackRepository` - Shipment tracks, event logs and pickup codes
//!
//! Schema lives in `migrations/` and is applied by [`run_migrations`].

mod order_repository;
mod rows;
mod track_repository;

pub use order_repository::PostgresOrderRepository;
pub use track_repository::PostgresTrackRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Opens a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))
}

/// Applies pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database("Failed to run migrations", e))
}
