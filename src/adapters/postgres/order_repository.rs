//! PostgreSQL implementation of OrderRepository.
//!
//! The orders table is owned by the order-management subsystem; this
//! adapter reads contact/display fields and writes only the status mirror.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::payment::OrderSummary;
use crate::ports::OrderRepository;

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    contact_email: Option<String>,
    intention_text: Option<String>,
    mass_date: Option<String>,
    mass_time: Option<String>,
}

impl From<OrderRow> for OrderSummary {
    fn from(row: OrderRow) -> Self {
        OrderSummary {
            id: row.id,
            contact_email: row.contact_email,
            intention_text: row.intention_text,
            mass_date: row.mass_date,
            mass_time: row.mass_time,
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_summary(&self, order_id: &str) -> Result<Option<OrderSummary>, DomainError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, contact_email, intention_text,
                   to_char(mass_date, 'YYYY-MM-DD') AS mass_date,
                   to_char(mass_time, 'HH24:MI') AS mass_time
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OrderSummary::from))
    }

    async fn update_status(&self, order_id: &str, status: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
