//! WebhookEventRepository port - audit and idempotency store for webhooks.
//!
//! Stripe may deliver the same event more than once (network timeouts, 5xx
//! responses, lost acknowledgements). The event id is the idempotency key:
//! the first insert wins, and later deliveries of the same id are skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Processing state recorded for a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventStatus {
    /// Event accepted, processing not yet finished.
    Received,
    /// Event applied a payment transition.
    Processed,
    /// Event acknowledged without side effects.
    Ignored,
    /// Processing hit an error.
    Failed,
}

impl WebhookEventStatus {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "received" => Ok(Self::Received),
            "processed" => Ok(Self::Processed),
            "ignored" => Ok(Self::Ignored),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::internal(format!(
                "Unknown webhook event status: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processed => "processed",
            Self::Ignored => "ignored",
            Self::Failed => "failed",
        }
    }
}

/// Record of one received webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Stripe event id (evt_xxx format), the idempotency key.
    pub event_id: String,

    /// Originating processor, currently always "stripe".
    pub provider: String,

    /// Stripe event type string.
    pub event_type: String,

    pub status: WebhookEventStatus,

    /// Original payload kept for debugging and audit.
    pub payload: serde_json::Value,

    /// Error or ignore reason, when present.
    pub error_message: Option<String>,

    /// Number of redeliveries observed after the first insert.
    pub retry_count: i32,

    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl WebhookEventRecord {
    /// Record for a freshly received, not yet processed event.
    pub fn received(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            provider: "stripe".to_string(),
            event_type: event_type.into(),
            status: WebhookEventStatus::Received,
            payload,
            error_message: None,
            retry_count: 0,
            received_at: Utc::now(),
            processed_at: None,
        }
    }
}

/// Result of attempting to insert a webhook event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event id.
    Inserted,
    /// Another delivery of the same event already inserted it.
    AlreadyExists,
}

/// Port for the webhook audit/idempotency store.
///
/// Implementations must enforce uniqueness of `event_id` at the store level
/// (PRIMARY KEY) so concurrent deliveries race safely.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find a previously received event by its id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Insert a record for a newly received event.
    ///
    /// Insert-wins semantics: returns `Inserted` for the first delivery and
    /// `AlreadyExists` for duplicates. Duplicates bump the surviving row's
    /// redelivery counter but leave everything else untouched.
    async fn save_received(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Record the final processing result for an event.
    async fn mark_result(
        &self,
        event_id: &str,
        status: WebhookEventStatus,
        error_message: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Delete records received before the given timestamp.
    ///
    /// Returns the number of rows deleted. Used by the retention sweep.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct InMemoryWebhookEvents {
        records: RwLock<HashMap<String, WebhookEventRecord>>,
    }

    impl InMemoryWebhookEvents {
        fn new() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl WebhookEventRepository for InMemoryWebhookEvents {
        async fn find_by_event_id(
            &self,
            event_id: &str,
        ) -> Result<Option<WebhookEventRecord>, DomainError> {
            Ok(self.records.read().await.get(event_id).cloned())
        }

        async fn save_received(
            &self,
            record: WebhookEventRecord,
        ) -> Result<SaveResult, DomainError> {
            let mut records = self.records.write().await;
            if let Some(existing) = records.get_mut(&record.event_id) {
                existing.retry_count += 1;
                Ok(SaveResult::AlreadyExists)
            } else {
                records.insert(record.event_id.clone(), record);
                Ok(SaveResult::Inserted)
            }
        }

        async fn mark_result(
            &self,
            event_id: &str,
            status: WebhookEventStatus,
            error_message: Option<&str>,
        ) -> Result<(), DomainError> {
            let mut records = self.records.write().await;
            if let Some(record) = records.get_mut(event_id) {
                record.status = status;
                record.error_message = error_message.map(str::to_string);
                record.processed_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
            let mut records = self.records.write().await;
            let before = records.len();
            records.retain(|_, r| r.received_at >= cutoff);
            Ok((before - records.len()) as u64)
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Record Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn received_record_has_expected_shape() {
        let record = WebhookEventRecord::received(
            "evt_1",
            "payment_intent.succeeded",
            serde_json::json!({"id": "evt_1"}),
        );

        assert_eq!(record.provider, "stripe");
        assert_eq!(record.status, WebhookEventStatus::Received);
        assert!(record.processed_at.is_none());
        assert!(record.error_message.is_none());
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            WebhookEventStatus::Received,
            WebhookEventStatus::Processed,
            WebhookEventStatus::Ignored,
            WebhookEventStatus::Failed,
        ] {
            assert_eq!(WebhookEventStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Idempotency Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn first_save_inserts() {
        let repo = InMemoryWebhookEvents::new();
        let record = WebhookEventRecord::received("evt_a", "t", serde_json::json!({}));

        assert_eq!(repo.save_received(record).await.unwrap(), SaveResult::Inserted);
    }

    #[tokio::test]
    async fn duplicate_save_reports_already_exists() {
        let repo = InMemoryWebhookEvents::new();
        let r1 = WebhookEventRecord::received("evt_dup", "t", serde_json::json!({}));
        let r2 = WebhookEventRecord::received("evt_dup", "t", serde_json::json!({}));

        repo.save_received(r1).await.unwrap();
        assert_eq!(
            repo.save_received(r2).await.unwrap(),
            SaveResult::AlreadyExists
        );

        let surviving = repo.find_by_event_id("evt_dup").await.unwrap().unwrap();
        assert_eq!(surviving.retry_count, 1);
    }

    #[tokio::test]
    async fn mark_result_updates_status_and_error() {
        let repo = InMemoryWebhookEvents::new();
        let record = WebhookEventRecord::received("evt_m", "t", serde_json::json!({}));
        repo.save_received(record).await.unwrap();

        repo.mark_result("evt_m", WebhookEventStatus::Failed, Some("boom"))
            .await
            .unwrap();

        let found = repo.find_by_event_id("evt_m").await.unwrap().unwrap();
        assert_eq!(found.status, WebhookEventStatus::Failed);
        assert_eq!(found.error_message, Some("boom".to_string()));
        assert!(found.processed_at.is_some());
    }

    #[tokio::test]
    async fn delete_before_removes_only_old_records() {
        let repo = InMemoryWebhookEvents::new();
        let mut old = WebhookEventRecord::received("evt_old", "t", serde_json::json!({}));
        old.received_at = Utc::now() - chrono::Duration::days(60);
        let fresh = WebhookEventRecord::received("evt_fresh", "t", serde_json::json!({}));

        repo.save_received(old).await.unwrap();
        repo.save_received(fresh).await.unwrap();

        let deleted = repo
            .delete_before(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(repo.find_by_event_id("evt_old").await.unwrap().is_none());
        assert!(repo.find_by_event_id("evt_fresh").await.unwrap().is_some());
    }
}
