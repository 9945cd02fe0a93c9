//! PickupCodeIssuer - Mints pickup codes for tracks and mirrors them onto orders.
//!
//! Minting happens inside the caller's read-check-write: the grant is
//! attached to the in-flight track and lands with the same conditional
//! write as the status change that made the track pickup-eligible. Once
//! that write succeeds the caller hands the track back for announcement,
//! which copies the grant onto the owning order and tells both rooms.

use std::sync::Arc;

use crate::application::FulfillmentPolicy;
use crate::domain::foundation::{EntityRef, FulfillmentError, OrderId, Timestamp};
use crate::domain::logistics::{LogisticsUpdated, ShipmentTrack};
use crate::domain::order::{Order, OrderUpdated};
use crate::domain::pickup::{PickupCodeGenerator, PickupGrant};
use crate::ports::{EventPublisher, EventPublisherExt, OrderRepository, TrackRepository, WriteOutcome};

/// Issues pickup codes that are unique among unexpired codes.
pub struct PickupCodeIssuer {
    tracks: Arc<dyn TrackRepository>,
    orders: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: FulfillmentPolicy,
}

impl PickupCodeIssuer {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        orders: Arc<dyn OrderRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: FulfillmentPolicy,
    ) -> Self {
        Self {
            tracks,
            orders,
            event_publisher,
            policy,
        }
    }

    /// Attaches a fresh grant if `track` is pickup-eligible and has none.
    ///
    /// Returns true if a grant was attached. Nothing is persisted here.
    ///
    /// # Errors
    ///
    /// - `CodeSpaceExhausted` if no free code was found within the bound
    /// - `Infrastructure` if the uniqueness lookup fails
    pub async fn mint_if_eligible(
        &self,
        track: &mut ShipmentTrack,
        now: Timestamp,
    ) -> Result<bool, FulfillmentError> {
        if !track.needs_pickup_code() {
            return Ok(false);
        }

        let generator = PickupCodeGenerator::new(self.policy.pickup_code_max_attempts);
        let tracks = &self.tracks;
        let code = generator
            .generate_unique(|candidate| async move {
                tracks.pickup_code_in_use(&candidate, &now).await
            })
            .await
            .map_err(|e| {
                if let FulfillmentError::CodeSpaceExhausted { attempts } = e {
                    tracing::error!(
                        track_id = %track.id(),
                        attempts,
                        "Pickup code space exhausted"
                    );
                }
                e
            })?;

        let grant = PickupGrant::issue(code, now, self.policy.pickup_code_ttl);
        Ok(track.attach_pickup(grant, now))
    }

    /// Announces a grant that has been persisted with `track`.
    ///
    /// Publishes `LogisticsUpdated`, then mirrors the grant onto the owning
    /// order and publishes `OrderUpdated`. A failed mirror or publish is
    /// logged; the track keeps its code either way.
    pub async fn announce(&self, track: &ShipmentTrack) {
        let Some(grant) = track.pickup() else {
            return;
        };

        tracing::info!(
            track_id = %track.id(),
            order_id = %track.order_id(),
            expires_at = %grant.expires_at.to_rfc3339(),
            "Pickup code minted"
        );
        self.event_publisher
            .publish_committed(&LogisticsUpdated::new(track))
            .await;

        match self.mirror_to_order(track.order_id(), grant).await {
            Ok(Some(order)) => {
                self.event_publisher
                    .publish_committed(&OrderUpdated::new(&order))
                    .await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    track_id = %track.id(),
                    order_id = %track.order_id(),
                    error = %e,
                    "Failed to mirror pickup code onto order"
                );
            }
        }
    }

    /// Copies `grant` onto the order. Returns `None` if it was already there.
    async fn mirror_to_order(
        &self,
        order_id: &OrderId,
        grant: &PickupGrant,
    ) -> Result<Option<Order>, FulfillmentError> {
        for attempt in 0..=self.policy.conflict_retries {
            let mut order = self
                .orders
                .find_by_id(order_id)
                .await?
                .ok_or_else(|| FulfillmentError::not_found(EntityRef::Order(*order_id)))?;

            let expected = order.version();
            if !order.mirror_pickup(grant, Timestamp::now()) {
                return Ok(None);
            }

            match self.orders.update_if_version(&order, expected).await? {
                WriteOutcome::Applied { version } => {
                    order.mark_persisted(version);
                    return Ok(Some(order));
                }
                WriteOutcome::Conflict => {
                    tracing::debug!(order_id = %order_id, attempt, "Mirror write conflict");
                }
            }
        }

        Err(FulfillmentError::conflict(format!(
            "order {} kept changing while mirroring its pickup code",
            order_id
        )))
    }
}
