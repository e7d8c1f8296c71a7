//! NotificationRepository port - persistence for outbound notifications
//! and admin dashboard alerts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::domain::notification::{AdminAlert, Notification};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new pending notification.
    async fn save(&self, notification: &Notification) -> Result<(), DomainError>;

    /// Mark a notification as delivered.
    async fn mark_sent(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record a failed delivery attempt.
    ///
    /// Sets status to failed, stores the error, and increments the
    /// attempt counter.
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), DomainError>;

    /// Failed notifications still within the retry bound, oldest first.
    async fn list_retryable(
        &self,
        max_attempts: u32,
        limit: i64,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Persist an alert row for the admin dashboard.
    async fn save_admin_alert(&self, alert: &AdminAlert) -> Result<(), DomainError>;
}
