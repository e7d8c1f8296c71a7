//! PostgreSQL implementation of WebhookEventRepository.
//!
//! The event id PRIMARY KEY carries the idempotency guarantee:
//! `ON CONFLICT DO NOTHING` makes the first insert win and reports
//! duplicates without a separate read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    provider: String,
    event_type: String,
    status: String,
    payload: serde_json::Value,
    error_message: Option<String>,
    retry_count: i32,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            status: WebhookEventStatus::parse(&row.status)?,
            event_id: row.event_id,
            provider: row.provider,
            event_type: row.event_type,
            payload: row.payload,
            error_message: row.error_message,
            retry_count: row.retry_count,
            received_at: row.received_at,
            processed_at: row.processed_at,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row = sqlx::query_as::<_, WebhookEventRow>(
            r#"
            SELECT event_id, provider, event_type, status, payload,
                   error_message, retry_count, received_at, processed_at
            FROM webhook_events
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn save_received(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, provider, event_type, status, payload, received_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.provider)
        .bind(&record.event_type)
        .bind(record.status.as_str())
        .bind(&record.payload)
        .bind(record.received_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(SaveResult::Inserted)
        } else {
            // Count redeliveries on the surviving row
            sqlx::query(
                "UPDATE webhook_events SET retry_count = retry_count + 1 WHERE event_id = $1",
            )
            .bind(&record.event_id)
            .execute(&self.pool)
            .await?;
            Ok(SaveResult::AlreadyExists)
        }
    }

    async fn mark_result(
        &self,
        event_id: &str,
        status: WebhookEventStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = $2, error_message = $3, processed_at = NOW()
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(status.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE received_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
