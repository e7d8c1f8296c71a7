//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `OREMUS_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use oremus_payments::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod database;
mod email;
mod error;
mod notifications;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use notifications::NotificationsConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the Oremus payments service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe keys and webhook secret)
    pub payment: PaymentConfig,

    /// Email configuration (Resend)
    pub email: EmailConfig,

    /// Notification retry/retention policy
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `OREMUS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `OREMUS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `OREMUS__PAYMENT__STRIPE_WEBHOOK_SECRET=whsec_...` -> `payment.stripe_webhook_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("OREMUS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The webhook route must never come up without its signing secret, so
    /// validation runs at startup before the listener binds. A missing or
    /// malformed secret aborts the process rather than failing per-request.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
