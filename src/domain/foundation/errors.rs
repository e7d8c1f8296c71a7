//! Error types for the domain layer.

use std::collections::HashMap;
use std::fmt;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidFormat,

    // Not found errors
    PaymentNotFound,
    OrderNotFound,
    NotificationNotFound,

    // State errors
    InvalidStateTransition,

    // Infrastructure errors
    DatabaseError,
    MailError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::PaymentNotFound => "PAYMENT_NOT_FOUND",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::NotificationNotFound => "NOTIFICATION_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::MailError => "MAIL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Creates a mail transport error.
    pub fn mail(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MailError, message)
    }

    /// Creates a payment not found error.
    pub fn payment_not_found(payment_id: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentNotFound, "Payment not found")
            .with_detail("payment_id", payment_id.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Returns true if a retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.code, ErrorCode::DatabaseError | ErrorCode::MailError)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for DomainError {}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = DomainError::database("connection refused");
        assert_eq!(format!("{}", err), "[DATABASE_ERROR] connection refused");
    }

    #[test]
    fn payment_not_found_carries_detail() {
        let err = DomainError::payment_not_found("pay_123");
        assert_eq!(err.code, ErrorCode::PaymentNotFound);
        assert_eq!(err.details.get("payment_id"), Some(&"pay_123".to_string()));
    }

    #[test]
    fn database_errors_are_transient() {
        assert!(DomainError::database("timeout").is_transient());
        assert!(!DomainError::internal("bug").is_transient());
    }
}
