//! Outbound notification records.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Kind of message a notification carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    PaymentConfirmation,
    PaymentFailure,
    PaymentRefund,
}

impl NotificationType {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "payment_confirmation" => Ok(Self::PaymentConfirmation),
            "payment_failure" => Ok(Self::PaymentFailure),
            "payment_refund" => Ok(Self::PaymentRefund),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown notification type: {}", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentConfirmation => "payment_confirmation",
            Self::PaymentFailure => "payment_failure",
            Self::PaymentRefund => "payment_refund",
        }
    }
}

/// Delivery state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown notification status: {}", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// One attempted outbound message.
///
/// Created pending by the dispatcher, then marked sent or failed. Failed
/// notifications are retried by the background sweep until the retry bound
/// is reached.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub notification_type: NotificationType,
    pub status: NotificationStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// New pending notification awaiting its first delivery attempt.
    pub fn pending(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
        text_body: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: text_body.into(),
            notification_type,
            status: NotificationStatus::Pending,
            retry_count: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True while the retry sweep should keep attempting delivery.
    ///
    /// `retry_count` counts completed attempts, so the bound is the total
    /// number of attempts (initial send included).
    pub fn can_retry(&self, max_attempts: u32) -> bool {
        self.status != NotificationStatus::Sent && self.retry_count < max_attempts as i32
    }
}

/// Alert row surfaced on the parish admin dashboard.
#[derive(Debug, Clone)]
pub struct AdminAlert {
    pub id: Uuid,
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AdminAlert {
    pub fn new(
        alert_type: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type: alert_type.into(),
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
