//! NotificationRetryWorker - background sweep for failed notifications and
//! webhook audit retention.
//!
//! Runs as an explicitly spawned task with persisted retry state, decoupled
//! from the webhook request path. Each sweep re-attempts failed
//! notifications up to the configured bound, then purges expired webhook
//! audit records.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::NotificationsConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{
    MailSender, NotificationRepository, OutboundEmail, WebhookEventRepository,
};

/// Batch size per sweep.
const SWEEP_BATCH_SIZE: i64 = 50;

/// Counters from one retry sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct NotificationRetryWorker {
    notifications: Arc<dyn NotificationRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    mailer: Arc<dyn MailSender>,
    config: NotificationsConfig,
}

impl NotificationRetryWorker {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        mailer: Arc<dyn MailSender>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            notifications,
            webhook_events,
            mailer,
            config,
        }
    }

    /// Run the sweep loop until the process shuts down.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.sweep_once().await {
                Ok(stats) if stats.attempted > 0 => {
                    info!(
                        attempted = stats.attempted,
                        sent = stats.sent,
                        failed = stats.failed,
                        "Notification retry sweep finished"
                    );
                }
                Ok(_) => {}
                Err(err) => error!(error = %err, "Notification retry sweep failed"),
            }

            if let Err(err) = self.purge_expired_events().await {
                error!(error = %err, "Webhook audit purge failed");
            }
        }
    }

    /// Re-attempt delivery for failed notifications within the retry bound.
    pub async fn sweep_once(&self) -> Result<SweepStats, DomainError> {
        let batch = self
            .notifications
            .list_retryable(self.config.max_retries, SWEEP_BATCH_SIZE)
            .await?;

        let mut stats = SweepStats {
            attempted: batch.len(),
            ..Default::default()
        };

        for notification in batch {
            let email = OutboundEmail {
                to: notification.recipient.clone(),
                subject: notification.subject.clone(),
                html: notification.html_body.clone(),
                text: notification.text_body.clone(),
            };

            match self.mailer.send(&email).await {
                Ok(()) => {
                    stats.sent += 1;
                    if let Err(err) = self.notifications.mark_sent(notification.id).await {
                        warn!(notification_id = %notification.id, error = %err, "Failed to mark retried notification sent");
                    }
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        notification_id = %notification.id,
                        retry_count = notification.retry_count,
                        error = %err,
                        "Notification retry failed"
                    );
                    if let Err(mark_err) = self
                        .notifications
                        .mark_failed(notification.id, &err.to_string())
                        .await
                    {
                        warn!(notification_id = %notification.id, error = %mark_err, "Failed to record retry failure");
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Delete webhook audit records past the retention window.
    pub async fn purge_expired_events(&self) -> Result<u64, DomainError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.config.webhook_retention_days);
        let deleted = self.webhook_events.delete_before(cutoff).await?;
        if deleted > 0 {
            info!(deleted, "Purged expired webhook audit records");
        }
        Ok(deleted)
    }
}
