//! PostgreSQL implementation of OrderRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, MerchantId, OrderId, UserId};
use crate::domain::order::{LineItem, Order, OrderStatus};
use crate::ports::{OrderRepository, WriteOutcome};

use super::rows::{column, insert_error, optional_timestamp, pickup_grant, timestamp, to_i64, version};

const ORDER_COLUMNS: &str = r#"
    id, user_id, merchant_id, items, total_amount, status,
    order_time, payment_time, shipment_time, delivery_time,
    pickup_code, pickup_code_generated_at, pickup_code_expires_at,
    version, created_at, updated_at
"#;

#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        let pickup = order.pickup();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, merchant_id, items, total_amount, status,
                order_time, payment_time, shipment_time, delivery_time,
                pickup_code, pickup_code_generated_at, pickup_code_expires_at,
                version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_str())
        .bind(order.merchant_id().as_str())
        .bind(Json(order.items()))
        .bind(to_i64("total_amount", order.total_amount())?)
        .bind(order.status().as_str())
        .bind(order.order_time().as_datetime())
        .bind(order.payment_time().map(|t| *t.as_datetime()))
        .bind(order.shipment_time().map(|t| *t.as_datetime()))
        .bind(order.delivery_time().map(|t| *t.as_datetime()))
        .bind(pickup.map(|g| g.code.as_str().to_string()))
        .bind(pickup.map(|g| *g.generated_at.as_datetime()))
        .bind(pickup.map(|g| *g.expires_at.as_datetime()))
        .bind(to_i64("version", order.version())?)
        .bind(order.created_at().as_datetime())
        .bind(order.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error("Failed to insert order", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch order", e))?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn update_if_version(
        &self,
        order: &Order,
        expected_version: u64,
    ) -> Result<WriteOutcome, DomainError> {
        let pickup = order.pickup();
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $3,
                payment_time = $4,
                shipment_time = $5,
                delivery_time = $6,
                pickup_code = $7,
                pickup_code_generated_at = $8,
                pickup_code_expires_at = $9,
                updated_at = $10,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(to_i64("version", expected_version)?)
        .bind(order.status().as_str())
        .bind(order.payment_time().map(|t| *t.as_datetime()))
        .bind(order.shipment_time().map(|t| *t.as_datetime()))
        .bind(order.delivery_time().map(|t| *t.as_datetime()))
        .bind(pickup.map(|g| g.code.as_str().to_string()))
        .bind(pickup.map(|g| *g.generated_at.as_datetime()))
        .bind(pickup.map(|g| *g.expires_at.as_datetime()))
        .bind(order.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update order", e))?;

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

fn row_to_order(row: &PgRow) -> Result<Order, DomainError> {
    let status: String = column(row, "status")?;
    let status: OrderStatus = status
        .parse()
        .map_err(|e| DomainError::database("Invalid order status", e))?;

    let user_id: String = column(row, "user_id")?;
    let merchant_id: String = column(row, "merchant_id")?;
    let Json(items): Json<Vec<LineItem>> = column(row, "items")?;
    let total_amount: i64 = column(row, "total_amount")?;

    Ok(Order::reconstitute(
        OrderId::from_uuid(column(row, "id")?),
        UserId::new(user_id).map_err(|e| DomainError::database("Invalid user_id", e))?,
        MerchantId::new(merchant_id)
            .map_err(|e| DomainError::database("Invalid merchant_id", e))?,
        items,
        u64::try_from(total_amount).map_err(|e| DomainError::database("Invalid total_amount", e))?,
        status,
        timestamp(row, "order_time")?,
        optional_timestamp(row, "payment_time")?,
        optional_timestamp(row, "shipment_time")?,
        optional_timestamp(row, "delivery_time")?,
        pickup_grant(row)?,
        version(row)?,
        timestamp(row, "created_at")?,
        timestamp(row, "updated_at")?,
    ))
}
