//! Row decoding helpers shared by the PostgreSQL repositories.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::pickup::{PickupCode, PickupGrant};

/// Reads a column, mapping decode failures to `DatabaseError`.
pub(super) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to get {}", name), e))
}

pub(super) fn timestamp(row: &PgRow, name: &str) -> Result<Timestamp, DomainError> {
    column::<DateTime<Utc>>(row, name).map(Timestamp::from_datetime)
}

pub(super) fn optional_timestamp(
    row: &PgRow,
    name: &str,
) -> Result<Option<Timestamp>, DomainError> {
    Ok(column::<Option<DateTime<Utc>>>(row, name)?.map(Timestamp::from_datetime))
}

pub(super) fn version(row: &PgRow) -> Result<u64, DomainError> {
    let raw: i64 = column(row, "version")?;
    u64::try_from(raw).map_err(|e| DomainError::database("Invalid version", e))
}

/// Reads the three `pickup_code*` columns into a grant.
pub(super) fn pickup_grant(row: &PgRow) -> Result<Option<PickupGrant>, DomainError> {
    let code: Option<String> = column(row, "pickup_code")?;
    let Some(code) = code else {
        return Ok(None);
    };

    let code = PickupCode::parse(&code)
        .map_err(|e| DomainError::database("Invalid stored pickup code", e))?;
    let generated_at = optional_timestamp(row, "pickup_code_generated_at")?;
    let expires_at = optional_timestamp(row, "pickup_code_expires_at")?;

    match (generated_at, expires_at) {
        (Some(generated_at), Some(expires_at)) => Ok(Some(PickupGrant {
            code,
            generated_at,
            expires_at,
        })),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            "Pickup code stored without its validity window",
        )),
    }
}

/// Converts an unsigned amount or version to the signed column type.
pub(super) fn to_i64(field: &str, value: u64) -> Result<i64, DomainError> {
    i64::try_from(value).map_err(|e| DomainError::database(&format!("{} out of range", field), e))
}

/// Maps an insert failure, turning unique violations into `ValidationFailed`.
pub(super) fn insert_error(context: &str, e: sqlx::Error) -> DomainError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or("unique").to_string();
            return DomainError::new(
                ErrorCode::ValidationFailed,
                format!("{}: duplicate value", context),
            )
            .with_detail("constraint", constraint);
        }
    }
    DomainError::database(context, e)
}
