//! Webhook error types for payment event handling.
//!
//! Status code mapping drives Stripe's retry behavior: 2xx acknowledges the
//! delivery, 4xx rejects it permanently, 5xx makes Stripe redeliver.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from a recognized event.
    ///
    /// An authentic but malformed event. Acknowledged without mutation so
    /// Stripe does not redeliver it forever.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Primary data-store operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if Stripe should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to the HTTP status returned to Stripe.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Signature failures reject the delivery outright
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            // Authentic but unusable events are acknowledged
            WebhookError::MissingMetadata(_) => StatusCode::OK,

            // Store failures make Stripe redeliver the whole event
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
