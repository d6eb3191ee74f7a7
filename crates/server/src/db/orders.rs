//! `PostgreSQL` order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use greencart_core::{
    AddressId, Order, OrderId, OrderItem, OrderStatus, PaymentType, Price, UserId,
};

use super::{NewOrder, OrderRepository, RepositoryError};

const ORDER_COLUMNS: &str = "id, user_id, items, amount, address_id, status, payment_type, \
                             is_paid, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Json<Vec<OrderItem>>,
    amount: Decimal,
    address_id: i32,
    status: String,
    payment_type: String,
    is_paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        };

        let amount = Price::new(row.amount).map_err(|e| corrupt(&e))?;
        let status = row.status.parse::<OrderStatus>().map_err(|e| corrupt(&e))?;
        let payment_type = row.payment_type.parse::<PaymentType>().map_err(|e| corrupt(&e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.0,
            amount,
            address_id: AddressId::new(row.address_id),
            status,
            payment_type,
            is_paid: row.is_paid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Orders stored in `PostgreSQL`.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, items, amount, address_id, status, payment_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.amount)
        .bind(order.address_id)
        .bind(OrderStatus::default())
        .bind(order.payment_type)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn list_listed(&self, user_id: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ($1::INTEGER IS NULL OR user_id = $1)
               AND (payment_type = 'COD' OR is_paid)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }
}
