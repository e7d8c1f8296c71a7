//! Email configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (Resend)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl EmailConfig {
    /// Format the From header as "Name <email>"
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("RESEND_API_KEY"));
        }
        if !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@oremus.app".to_string()
}

fn default_from_name() -> String {
    "Oremus".to_string()
}
