//! Payment entity and its status state machine.
//!
//! A payment is a financial record: it is created when checkout starts,
//! mutated only by the reconciler, and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Status of a payment.
///
/// Transitions are monotonic: `pending`/`processing` may move to `completed`
/// or `failed`, and `completed` may move to `refunded`. Every other status
/// is terminal and must never be overwritten by a stale or duplicate event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Parse a status from its stored string form.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown payment status: {}", other),
            )),
        }
    }

    /// Stored string form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Returns true for statuses that end the payment lifecycle.
    ///
    /// `completed` is terminal for everything except the single allowed
    /// refund transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Refunded)
    }

    /// The statuses a payment may hold immediately before moving to `target`.
    ///
    /// This is the compare-and-set predicate for the conditional status
    /// update: the store applies the transition only while the current
    /// status is in this set.
    pub fn transition_sources(target: PaymentStatus) -> &'static [PaymentStatus] {
        match target {
            PaymentStatus::Completed | PaymentStatus::Failed => {
                &[PaymentStatus::Pending, PaymentStatus::Processing]
            }
            PaymentStatus::Refunded => &[PaymentStatus::Completed],
            // Nothing transitions back into an initial status.
            PaymentStatus::Pending | PaymentStatus::Processing => &[],
        }
    }

    /// Returns true if this status may legally transition to `target`.
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        PaymentStatus::transition_sources(target).contains(self)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the payment was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    MassIntention,
    Donation,
    Product,
}

impl PaymentType {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "mass_intention" => Ok(Self::MassIntention),
            "donation" => Ok(Self::Donation),
            "product" => Ok(Self::Product),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown payment type: {}", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MassIntention => "mass_intention",
            Self::Donation => "donation",
            Self::Product => "product",
        }
    }
}

/// How the payer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Blik,
    P24,
    Transfer,
    Cash,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "card" => Ok(Self::Card),
            "blik" => Ok(Self::Blik),
            "p24" => Ok(Self::P24),
            "transfer" => Ok(Self::Transfer),
            "cash" => Ok(Self::Cash),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Unknown payment method: {}", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Blik => "blik",
            Self::P24 => "p24",
            Self::Transfer => "transfer",
            Self::Cash => "cash",
        }
    }

    /// Human-readable Polish name used in notification emails.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Card => "Karta płatnicza",
            Self::Blik => "BLIK",
            Self::P24 => "Przelewy24",
            Self::Transfer => "Przelew bankowy",
            Self::Cash => "Gotówka",
        }
    }
}

/// One payment attempt.
#[derive(Debug, Clone)]
pub struct Payment {
    /// Processor-assigned identifier (e.g. `pay_xxx`).
    pub id: String,

    /// Amount in minor currency units (grosze).
    pub amount: i64,

    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,

    /// The purchased order/intention this payment belongs to, if any.
    pub order_id: Option<String>,

    pub description: Option<String>,

    /// Error detail from the processor for failed payments.
    pub error_message: Option<String>,

    /// Opaque processor metadata captured at checkout.
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Amount formatted as złoty with two decimal places, e.g. "50.00 zł".
    pub fn amount_display(&self) -> String {
        format!("{}.{:02} zł", self.amount / 100, self.amount % 100)
    }
}

/// Fields required to create a new payment at checkout.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: String,
    pub amount: i64,
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub order_id: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
pub struct PaymentBuilder {
    id: String,
    amount: i64,
    status: PaymentStatus,
    payment_type: PaymentType,
    method: PaymentMethod,
    order_id: Option<String>,
    description: Option<String>,
    error_message: Option<String>,
}

#[cfg(test)]
impl Default for PaymentBuilder {
    fn default() -> Self {
        Self {
            id: "pay_test_123".to_string(),
            amount: 5000,
            status: PaymentStatus::Pending,
            payment_type: PaymentType::MassIntention,
            method: PaymentMethod::Blik,
            order_id: Some("order_test_123".to_string()),
            description: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
impl PaymentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn order_id(mut self, order_id: Option<String>) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn error_message(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    pub fn build(self) -> Payment {
        let now = Utc::now();
        Payment {
            id: self.id,
            amount: self.amount,
            status: self.status,
            payment_type: self.payment_type,
            method: self.method,
            order_id: self.order_id,
            description: self.description,
            error_message: self.error_message,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}
