//! PostgreSQL implementation of NotificationRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::domain::notification::{
    AdminAlert, Notification, NotificationStatus, NotificationType,
};
use crate::ports::NotificationRepository;

pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient: String,
    subject: String,
    html_body: String,
    text_body: String,
    notification_type: String,
    status: String,
    retry_count: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            notification_type: NotificationType::parse(&row.notification_type)?,
            status: NotificationStatus::parse(&row.status)?,
            id: row.id,
            recipient: row.recipient,
            subject: row.subject,
            html_body: row.html_body,
            text_body: row.text_body,
            retry_count: row.retry_count,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn save(&self, notification: &Notification) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient, subject, html_body, text_body,
                notification_type, status, retry_count, error_message,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(notification.id)
        .bind(&notification.recipient)
        .bind(&notification.subject)
        .bind(&notification.html_body)
        .bind(&notification.text_body)
        .bind(notification.notification_type.as_str())
        .bind(notification.status.as_str())
        .bind(notification.retry_count)
        .bind(&notification.error_message)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_sent(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'sent', error_message = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'failed',
                error_message = $2,
                retry_count = retry_count + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_retryable(
        &self,
        max_attempts: u32,
        limit: i64,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient, subject, html_body, text_body,
                   notification_type, status, retry_count, error_message,
                   created_at, updated_at
            FROM notifications
            WHERE status = 'failed' AND retry_count < $1
            ORDER BY updated_at ASC
            LIMIT $2
            "#,
        )
        .bind(max_attempts as i32)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn save_admin_alert(&self, alert: &AdminAlert) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO admin_notifications (id, alert_type, title, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(alert.id)
        .bind(&alert.alert_type)
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
