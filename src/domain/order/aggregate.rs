//! Order aggregate entity.
//!
//! An order is created at checkout and afterwards mutated only through the
//! status transition handlers. Amounts are integer minor currency units.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    FulfillmentError, MerchantId, OrderId, ProductId, SkuId, StateMachine, Timestamp, UserId,
    ValidationError,
};
use crate::domain::pickup::PickupGrant;

use super::OrderStatus;

/// One purchased SKU within an order.
///
/// `line_total` is always `unit_price * quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    product_id: ProductId,
    sku_id: SkuId,
    unit_price: u64,
    quantity: u32,
    line_total: u64,
}

impl LineItem {
    /// Creates a line item and computes its total.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if quantity is zero
    /// - `InvalidFormat` if the total overflows
    pub fn new(
        product_id: ProductId,
        sku_id: SkuId,
        unit_price: u64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }

        let line_total = unit_price
            .checked_mul(u64::from(quantity))
            .ok_or_else(|| ValidationError::invalid_format("line_total", "amount overflow"))?;

        Ok(Self {
            product_id,
            sku_id,
            unit_price,
            quantity,
            line_total,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn sku_id(&self) -> &SkuId {
        &self.sku_id
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn line_total(&self) -> u64 {
        self.line_total
    }
}

/// Order aggregate.
///
/// # Invariants
///
/// - `items` is non-empty
/// - `total_amount` equals the sum of line totals
/// - lifecycle timestamps, once set, are never overwritten
/// - `version` increases by one on every persisted write
///
/// The pickup grant is not serialized; event payloads never carry codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    merchant_id: MerchantId,
    items: Vec<LineItem>,
    total_amount: u64,
    status: OrderStatus,
    order_time: Timestamp,
    payment_time: Option<Timestamp>,
    shipment_time: Option<Timestamp>,
    delivery_time: Option<Timestamp>,
    #[serde(skip)]
    pickup: Option<PickupGrant>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Places a new order at checkout.
    ///
    /// The order starts `pending`, or `paid` with `payment_time` set when the
    /// payment was confirmed synchronously.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if there are no items or the total overflows
    pub fn place(
        id: OrderId,
        user_id: UserId,
        merchant_id: MerchantId,
        items: Vec<LineItem>,
        payment_confirmed: bool,
        now: Timestamp,
    ) -> Result<Self, FulfillmentError> {
        if items.is_empty() {
            return Err(ValidationError::empty_field("items").into());
        }

        let total_amount = items
            .iter()
            .try_fold(0u64, |acc, item| acc.checked_add(item.line_total()))
            .ok_or_else(|| ValidationError::invalid_format("total_amount", "amount overflow"))?;

        let (status, payment_time) = if payment_confirmed {
            (OrderStatus::Paid, Some(now))
        } else {
            (OrderStatus::Pending, None)
        };

        Ok(Self {
            id,
            user_id,
            merchant_id,
            items,
            total_amount,
            status,
            order_time: now,
            payment_time,
            shipment_time: None,
            delivery_time: None,
            pickup: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute an order from persistence (no validation, no events).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: OrderId,
        user_id: UserId,
        merchant_id: MerchantId,
        items: Vec<LineItem>,
        total_amount: u64,
        status: OrderStatus,
        order_time: Timestamp,
        payment_time: Option<Timestamp>,
        shipment_time: Option<Timestamp>,
        delivery_time: Option<Timestamp>,
        pickup: Option<PickupGrant>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            merchant_id,
            items,
            total_amount,
            status,
            order_time,
            payment_time,
            shipment_time,
            delivery_time,
            pickup,
            version,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn order_time(&self) -> &Timestamp {
        &self.order_time
    }

    pub fn payment_time(&self) -> Option<&Timestamp> {
        self.payment_time.as_ref()
    }

    pub fn shipment_time(&self) -> Option<&Timestamp> {
        self.shipment_time.as_ref()
    }

    pub fn delivery_time(&self) -> Option<&Timestamp> {
        self.delivery_time.as_ref()
    }

    pub fn pickup(&self) -> Option<&PickupGrant> {
        self.pickup.as_ref()
    }

    /// Version of the persisted state this instance was read at.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Domain Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Moves the order to `target`, returning the previous status.
    ///
    /// Sets the lifecycle timestamp implied by `target` if it is not set yet.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if `target` is not an outgoing edge of the
    ///   current status
    pub fn apply_status(
        &mut self,
        target: OrderStatus,
        now: Timestamp,
    ) -> Result<OrderStatus, FulfillmentError> {
        let previous = self.status;
        self.status = previous.transition_to(target)?;

        let slot = match target {
            OrderStatus::Paid => Some(&mut self.payment_time),
            OrderStatus::Shipped => Some(&mut self.shipment_time),
            OrderStatus::Delivered => Some(&mut self.delivery_time),
            _ => None,
        };
        if let Some(slot) = slot {
            slot.get_or_insert(now);
        }

        self.updated_at = now;
        Ok(previous)
    }

    /// Copies a pickup grant minted on the order's shipment track.
    ///
    /// Returns false if the order already carries the same code.
    pub fn mirror_pickup(&mut self, grant: &PickupGrant, now: Timestamp) -> bool {
        if self.pickup.as_ref() == Some(grant) {
            return false;
        }
        self.pickup = Some(grant.clone());
        self.updated_at = now;
        true
    }

    /// Records the version assigned by the store after a successful write.
    pub fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }
}
