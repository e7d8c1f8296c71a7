//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_mode() {
        let config = PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
        };
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = PaymentConfig {
            stripe_api_key: "sk_live_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_missing_api_key_fails() {
        let config = PaymentConfig {
            stripe_api_key: String::new(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_webhook_secret_fails() {
        let config = PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wrong_webhook_secret_prefix_fails() {
        let config = PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "secret_xxx".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        ));
    }

    #[test]
    fn test_valid_config_passes() {
        let config = PaymentConfig {
            stripe_api_key: "sk_test_abc123".to_string(),
            stripe_webhook_secret: "whsec_abc123".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
