//! Resend implementation of the MailSender port.
//!
//! Delivers transactional email through the Resend HTTP API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{MailSender, OutboundEmail};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(config.resend_api_key.clone()),
            from: config.from_header(),
        }
    }
}

#[async_trait]
impl MailSender for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DomainError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::mail(format!("Resend request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::mail(format!(
                "Resend returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
