//! VerifyPickupCodeHandler - Query handler checking a presented pickup code.
//!
//! Verification is read-only: a code stays valid for any number of
//! presentations until it expires.

use std::sync::Arc;

use crate::domain::foundation::{EntityRef, FulfillmentError, OrderId, Timestamp};
use crate::domain::logistics::ShipmentTrack;
use crate::domain::pickup::{is_valid_pickup_code, PickupCode};
use crate::ports::TrackRepository;

/// Query to verify a code presented for an order.
#[derive(Debug, Clone)]
pub struct VerifyPickupCodeQuery {
    /// Raw input, checked for format before any lookup.
    pub code: String,
    pub order_id: OrderId,
    pub now: Timestamp,
}

/// A code that matched and is within its validity window.
#[derive(Debug, Clone)]
pub struct PickupVerification {
    pub track: ShipmentTrack,
    pub expires_at: Timestamp,
}

/// Handler for pickup code verification.
pub struct VerifyPickupCodeHandler {
    tracks: Arc<dyn TrackRepository>,
}

impl VerifyPickupCodeHandler {
    pub fn new(tracks: Arc<dyn TrackRepository>) -> Self {
        Self { tracks }
    }

    pub async fn handle(
        &self,
        query: VerifyPickupCodeQuery,
    ) -> Result<PickupVerification, FulfillmentError> {
        // 1. Reject malformed input without touching the store
        if !is_valid_pickup_code(&query.code) {
            return Err(FulfillmentError::InvalidPickupCode);
        }
        let code = PickupCode::parse(&query.code).map_err(|_| FulfillmentError::InvalidPickupCode)?;

        // 2. Lookup
        let not_found = || {
            FulfillmentError::not_found(EntityRef::PickupCode {
                order_id: query.order_id,
            })
        };
        let track = self
            .tracks
            .find_by_pickup_code(&code, &query.order_id)
            .await?
            .ok_or_else(not_found)?;
        let grant = track.pickup().cloned().ok_or_else(not_found)?;

        // 3. Expiry
        if grant.is_expired_at(&query.now) {
            tracing::debug!(order_id = %query.order_id, "Expired pickup code presented");
            return Err(FulfillmentError::PickupCodeExpired);
        }

        Ok(PickupVerification {
            track,
            expires_at: grant.expires_at,
        })
    }
}
