//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{NewPayment, Payment, PaymentMethod, PaymentStatus, PaymentType};
use crate::ports::PaymentRepository;

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    amount: i64,
    status: String,
    payment_type: String,
    method: String,
    order_id: Option<String>,
    description: Option<String>,
    error_message: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            status: PaymentStatus::parse(&row.status)?,
            payment_type: PaymentType::parse(&row.payment_type)?,
            method: PaymentMethod::parse(&row.method)?,
            id: row.id,
            amount: row.amount,
            order_id: row.order_id,
            description: row.description,
            error_message: row.error_message,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, amount, status, payment_type, method, order_id, description, \
     error_message, metadata, created_at, updated_at";

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: NewPayment) -> Result<Payment, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (id, amount, status, payment_type, method, order_id, description, metadata)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(&payment.id)
        .bind(payment.amount)
        .bind(payment.payment_type.as_str())
        .bind(payment.method.as_str())
        .bind(&payment.order_id)
        .bind(&payment.description)
        .bind(&payment.metadata)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn transition_status(
        &self,
        id: &str,
        from: &[PaymentStatus],
        to: PaymentStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Payment>, DomainError> {
        let from_strings: Vec<String> =
            from.iter().map(|s| s.as_str().to_string()).collect();

        // Single conditional write: the WHERE clause is the compare-and-set
        // predicate, so concurrent deliveries cannot both apply a transition.
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET status = $2,
                error_message = COALESCE($3, error_message),
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($4)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to.as_str())
        .bind(error_message)
        .bind(&from_strings)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }
}
