//! PostgreSQL implementation of TrackRepository.
//!
//! The event log is a JSONB array; appends use `events || $x` so the
//! stored log is extended in place rather than rewritten.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, OrderId, Timestamp, TrackId};
use crate::domain::logistics::{LogisticsStatus, Route, ShipmentTrack, TrackEvent};
use crate::domain::pickup::PickupCode;
use crate::ports::{TrackRepository, WriteOutcome};

use super::rows::{column, insert_error, pickup_grant, timestamp, to_i64, version};

const TRACK_COLUMNS: &str = r#"
    id, order_id, company, tracking_number, status, events, route,
    pickup_code, pickup_code_generated_at, pickup_code_expires_at,
    version, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresTrackRepository {
    pool: PgPool,
}

impl PostgresTrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackRepository for PostgresTrackRepository {
    async fn save(&self, track: &ShipmentTrack) -> Result<(), DomainError> {
        let pickup = track.pickup();
        sqlx::query(
            r#"
            INSERT INTO shipment_tracks (
                id, order_id, company, tracking_number, status, events, route,
                pickup_code, pickup_code_generated_at, pickup_code_expires_at,
                version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(track.id().as_uuid())
        .bind(track.order_id().as_uuid())
        .bind(track.company())
        .bind(track.tracking_number())
        .bind(track.status().as_str())
        .bind(Json(track.events()))
        .bind(Json(track.route()))
        .bind(pickup.map(|g| g.code.as_str().to_string()))
        .bind(pickup.map(|g| *g.generated_at.as_datetime()))
        .bind(pickup.map(|g| *g.expires_at.as_datetime()))
        .bind(to_i64("version", track.version())?)
        .bind(track.created_at().as_datetime())
        .bind(track.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error("Failed to insert track", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TrackId) -> Result<Option<ShipmentTrack>, DomainError> {
        let sql = format!("SELECT {} FROM shipment_tracks WHERE id = $1", TRACK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch track", e))?;

        row.as_ref().map(row_to_track).transpose()
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        let sql = format!("SELECT {} FROM shipment_tracks WHERE order_id = $1", TRACK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch track by order", e))?;

        row.as_ref().map(row_to_track).transpose()
    }

    async fn find_by_logistics_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        let sql = format!(
            "SELECT {} FROM shipment_tracks WHERE tracking_number = $1",
            TRACK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(tracking_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch track by number", e))?;

        row.as_ref().map(row_to_track).transpose()
    }

    async fn find_by_pickup_code(
        &self,
        code: &PickupCode,
        order_id: &OrderId,
    ) -> Result<Option<ShipmentTrack>, DomainError> {
        let sql = format!(
            "SELECT {} FROM shipment_tracks WHERE pickup_code = $1 AND order_id = $2",
            TRACK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(code.as_str())
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch track by pickup code", e))?;

        row.as_ref().map(row_to_track).transpose()
    }

    async fn pickup_code_in_use(
        &self,
        code: &PickupCode,
        now: &Timestamp,
    ) -> Result<bool, DomainError> {
        let (in_use,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM shipment_tracks
                WHERE pickup_code = $1 AND pickup_code_expires_at >= $2
            )
            "#,
        )
        .bind(code.as_str())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to check pickup code", e))?;

        Ok(in_use)
    }

    async fn update_if_version(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError> {
        let pickup = track.pickup();
        let result = sqlx::query(
            r#"
            UPDATE shipment_tracks SET
                status = $3,
                route = $4,
                pickup_code = $5,
                pickup_code_generated_at = $6,
                pickup_code_expires_at = $7,
                updated_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(track.id().as_uuid())
        .bind(to_i64("version", expected_version)?)
        .bind(track.status().as_str())
        .bind(Json(track.route()))
        .bind(pickup.map(|g| g.code.as_str().to_string()))
        .bind(pickup.map(|g| *g.generated_at.as_datetime()))
        .bind(pickup.map(|g| *g.expires_at.as_datetime()))
        .bind(track.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update track", e))?;

        if result.rows_affected() == 0 {
            return Ok(WriteOutcome::Conflict);
        }
        Ok(WriteOutcome::Applied {
            version: expected_version + 1,
        })
    }

    async fn append_event(
        &self,
        track: &ShipmentTrack,
        expected_version: u64,
        event: &TrackEvent,
    ) -> Result<WriteOutcome, DomainError> {
        let pickup = track.pickup();
        let result = sqlx::query(
            r#"
            UPDATE shipment_tracks SET
                events = events || jsonb_build_array($3::jsonb),
                status = $4,
                pickup_code = $5,
                pickup_code_generated_at = $6,
                pickup_code_expires_at = $7,
                updated_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(track.id().as_uuid())
        .bind(to_i64("version", expected_version)?)
        .bind(Json(event))
        .bind(track.status().as_str())
        .bind(pickup.map(|g| g.code.as_str().to_string()))
        .bind(pickup.map(|g| *g.generated_at.as_datetime()))
        .bind(pickup.map(|g| *g.expires_at.as_datetime()))
        .bind(track.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to append track event", e))?;

        if result.rows_affected() == 0 {
            return Ok(WriteOutcome::Conflict);
        }
        Ok(WriteOutcome::Applied {
            version: expected_version + 1,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_track(row: &PgRow) -> Result<ShipmentTrack, DomainError> {
    let status: String = column(row, "status")?;
    let status: LogisticsStatus = status
        .parse()
        .map_err(|e| DomainError::database("Invalid logistics status", e))?;

    let Json(events): Json<Vec<TrackEvent>> = column(row, "events")?;
    let Json(route): Json<Route> = column(row, "route")?;

    Ok(ShipmentTrack::reconstitute(
        TrackId::from_uuid(column(row, "id")?),
        OrderId::from_uuid(column(row, "order_id")?),
        column(row, "company")?,
        column(row, "tracking_number")?,
        status,
        events,
        route,
        pickup_grant(row)?,
        version(row)?,
        timestamp(row, "created_at")?,
        timestamp(row, "updated_at")?,
    ))
}
