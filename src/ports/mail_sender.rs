//! MailSender port - outbound email transport.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// One outbound email, fully rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Port for the transactional email provider.
///
/// Delivery failures surface as `DomainError` with the mail error code;
/// callers on the webhook path swallow them, the retry sweep re-attempts.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DomainError>;
}
