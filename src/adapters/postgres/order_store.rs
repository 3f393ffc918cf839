//! PostgreSQL implementation of the OrderStore port.
//!
//! Every conditional primitive is a single `UPDATE ... WHERE` guarded by the
//! expected prior value and checked via `rows_affected`, so finalization is
//! atomic and isolated per row. Correctness does not depend on in-process
//! locks; multiple service instances can share this store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{Amount, GatewayPaymentId, OrderId, PlanId, Timestamp, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{OrderStore, StoreError};

/// PostgreSQL-backed order store.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Creates a store over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: i64,
    plan_id: String,
    amount: Decimal,
    payer_email: Option<String>,
    gateway_payment_id: Option<String>,
    status: String,
    granted: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let gateway_payment_id = row
            .gateway_payment_id
            .map(GatewayPaymentId::new)
            .transpose()
            .map_err(StoreError::backend)?;

        Ok(Order {
            id: OrderId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(StoreError::backend)?,
            plan_id: PlanId::new(row.plan_id).map_err(StoreError::backend)?,
            amount: Amount::new(row.amount).map_err(StoreError::backend)?,
            payer_email: row.payer_email,
            gateway_payment_id,
            status: parse_status(&row.status)?,
            granted: row.granted,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_status(s: &str) -> Result<OrderStatus, StoreError> {
    match s {
        "created" => Ok(OrderStatus::Created),
        "awaiting_payment" => Ok(OrderStatus::AwaitingPayment),
        "approved" => Ok(OrderStatus::Approved),
        "rejected" => Ok(OrderStatus::Rejected),
        "expired" => Ok(OrderStatus::Expired),
        "error" => Ok(OrderStatus::Error),
        _ => Err(StoreError::backend(format!("invalid status value: {}", s))),
    }
}

fn status_to_string(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Created => "created",
        OrderStatus::AwaitingPayment => "awaiting_payment",
        OrderStatus::Approved => "approved",
        OrderStatus::Rejected => "rejected",
        OrderStatus::Expired => "expired",
        OrderStatus::Error => "error",
    }
}

const SELECT_COLUMNS: &str = "id, user_id, plan_id, amount, payer_email, gateway_payment_id, \
                              status, granted, created_at";

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, plan_id, amount, payer_email, gateway_payment_id,
                status, granted, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_i64())
        .bind(order.plan_id.as_str())
        .bind(order.amount.as_decimal())
        .bind(&order.payer_email)
        .bind(order.gateway_payment_id.as_ref().map(|id| id.as_str()))
        .bind(status_to_string(order.status))
        .bind(order.granted)
        .bind(order.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("orders_pkey") {
                    return StoreError::DuplicateOrder(order.id);
                }
            }
            StoreError::backend(e)
        })?;

        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(Order::try_from).transpose()
    }

    async fn find_by_gateway_payment_id(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE gateway_payment_id = $1",
            SELECT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(Order::try_from).transpose()
    }

    async fn record_payment_intent(
        &self,
        id: OrderId,
        gateway_id: &GatewayPaymentId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET gateway_payment_id = $2, status = 'awaiting_payment'
            WHERE id = $1 AND status = 'created' AND gateway_payment_id IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .bind(gateway_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("orders_gateway_payment_id_key") {
                    return StoreError::DuplicateGatewayPaymentId(gateway_id.clone());
                }
            }
            StoreError::backend(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<bool, StoreError> {
        if !expected.can_transition_to(new) {
            return Ok(false);
        }

        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id.as_uuid())
            .bind(status_to_string(expected))
            .bind(status_to_string(new))
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_granted(&self, id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET granted = TRUE
            WHERE id = $1 AND status = 'approved' AND granted = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_approved_ungranted(&self) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE status = 'approved' AND granted = FALSE \
             ORDER BY created_at ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.into_iter().map(Order::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_all_stored_values() {
        assert_eq!(parse_status("created").unwrap(), OrderStatus::Created);
        assert_eq!(
            parse_status("awaiting_payment").unwrap(),
            OrderStatus::AwaitingPayment
        );
        assert_eq!(parse_status("approved").unwrap(), OrderStatus::Approved);
        assert_eq!(parse_status("rejected").unwrap(), OrderStatus::Rejected);
        assert_eq!(parse_status("expired").unwrap(), OrderStatus::Expired);
        assert_eq!(parse_status("error").unwrap(), OrderStatus::Error);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("paid").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn status_roundtrips_through_strings() {
        for status in [
            OrderStatus::Created,
            OrderStatus::AwaitingPayment,
            OrderStatus::Approved,
            OrderStatus::Rejected,
            OrderStatus::Expired,
            OrderStatus::Error,
        ] {
            assert_eq!(parse_status(status_to_string(status)).unwrap(), status);
        }
    }

    #[test]
    fn row_conversion_validates_fields() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            user_id: 42,
            plan_id: "vip7".to_string(),
            amount: Decimal::new(990, 2),
            payer_email: None,
            gateway_payment_id: Some("P1".to_string()),
            status: "awaiting_payment".to_string(),
            granted: false,
            created_at: Utc::now(),
        };
        let order = Order::try_from(row).unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert_eq!(order.gateway_payment_id.unwrap().as_str(), "P1");
    }

    #[test]
    fn row_conversion_rejects_corrupt_user_id() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            user_id: -1,
            plan_id: "vip7".to_string(),
            amount: Decimal::new(990, 2),
            payer_email: None,
            gateway_payment_id: None,
            status: "created".to_string(),
            granted: false,
            created_at: Utc::now(),
        };
        assert!(Order::try_from(row).is_err());
    }
}
