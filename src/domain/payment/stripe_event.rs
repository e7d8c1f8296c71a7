//! Stripe webhook event types.
//!
//! Defines the structures for parsing Stripe webhook payloads.
//! Only fields relevant to payment reconciliation are captured.

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
///
/// Contains the essential fields needed for webhook processing.
/// Additional fields from Stripe's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_type_str(&self.event_type)
    }

    /// Look up a string field in the event object's `metadata` map.
    ///
    /// Checkout metadata is where we stash our own identifiers
    /// (payment id, order id) when the session is created.
    pub fn metadata_field(&self, key: &str) -> Option<&str> {
        self.data
            .object
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
    }

    /// Error detail reported by the processor for failed payments.
    ///
    /// Reads `last_payment_error.message` from the payment intent object.
    pub fn payment_error_message(&self) -> Option<&str> {
        self.data
            .object
            .get("last_payment_error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
    }

    /// String field read directly off the event object.
    pub fn object_field(&self, key: &str) -> Option<&str> {
        self.data.object.get(key).and_then(|v| v.as_str())
    }

    /// Integer field read directly off the event object.
    pub fn object_int_field(&self, key: &str) -> Option<i64> {
        self.data.object.get(key).and_then(|v| v.as_i64())
    }
}

/// Known Stripe event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    /// Payment intent succeeded.
    PaymentIntentSucceeded,
    /// Checkout session completed (treated as success).
    CheckoutSessionCompleted,
    /// Payment intent failed.
    PaymentIntentFailed,
    /// Charge was refunded.
    ChargeRefunded,
    /// Payer opened a dispute against a charge.
    ChargeDisputeCreated,
    /// Unknown or unhandled event type.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from the Stripe type string.
    pub fn from_type_str(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            "charge.refunded" => Self::ChargeRefunded,
            "charge.dispute.created" => Self::ChargeDisputeCreated,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::ChargeRefunded => "charge.refunded",
            Self::ChargeDisputeCreated => "charge.dispute.created",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: self.livemode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ══════════════════════════════════════════════════════════════
    // Deserialization Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn deserialize_minimal_event() {
        let json = r#"{
            "id": "evt_1234567890",
            "type": "payment_intent.succeeded",
            "created": 1704067200,
            "data": {
                "object": {}
            },
            "livemode": false
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_1234567890");
        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.created, 1704067200);
        assert!(!event.is_live());
    }

    #[test]
    fn deserialize_ignores_extra_fields() {
        let json = r#"{
            "id": "evt_extra",
            "type": "charge.refunded",
            "created": 1704067200,
            "data": {
                "object": {"id": "ch_1"},
                "previous_attributes": {"status": "succeeded"}
            },
            "livemode": true,
            "api_version": "2023-10-16",
            "pending_webhooks": 1
        }"#;

        let event: StripeEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "evt_extra");
        assert!(event.is_live());
    }

    // ══════════════════════════════════════════════════════════════
    // Metadata Extraction Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn metadata_field_reads_nested_value() {
        let event = StripeEventBuilder::new()
            .object(json!({
                "id": "pi_123",
                "metadata": {
                    "payment_id": "pay_abc",
                    "order_id": "order_xyz"
                }
            }))
            .build();

        assert_eq!(event.metadata_field("payment_id"), Some("pay_abc"));
        assert_eq!(event.metadata_field("order_id"), Some("order_xyz"));
    }

    #[test]
    fn metadata_field_missing_returns_none() {
        let event = StripeEventBuilder::new()
            .object(json!({"id": "pi_123", "metadata": {}}))
            .build();

        assert_eq!(event.metadata_field("payment_id"), None);
    }

    #[test]
    fn metadata_field_no_metadata_object_returns_none() {
        let event = StripeEventBuilder::new()
            .object(json!({"id": "pi_123"}))
            .build();

        assert_eq!(event.metadata_field("payment_id"), None);
    }

    #[test]
    fn payment_error_message_reads_last_payment_error() {
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.payment_failed")
            .object(json!({
                "id": "pi_123",
                "last_payment_error": {"message": "Card declined"}
            }))
            .build();

        assert_eq!(event.payment_error_message(), Some("Card declined"));
    }

    #[test]
    fn object_fields_read_dispute_attributes() {
        let event = StripeEventBuilder::new()
            .event_type("charge.dispute.created")
            .object(json!({
                "id": "dp_1",
                "charge": "ch_9",
                "amount": 5000,
                "reason": "fraudulent"
            }))
            .build();

        assert_eq!(event.object_field("charge"), Some("ch_9"));
        assert_eq!(event.object_int_field("amount"), Some(5000));
        assert_eq!(event.object_field("reason"), Some("fraudulent"));
    }

    // ══════════════════════════════════════════════════════════════
    // Event Type Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn event_type_roundtrip() {
        let types = [
            StripeEventType::PaymentIntentSucceeded,
            StripeEventType::CheckoutSessionCompleted,
            StripeEventType::PaymentIntentFailed,
            StripeEventType::ChargeRefunded,
            StripeEventType::ChargeDisputeCreated,
        ];

        for event_type in types {
            let s = event_type.as_str();
            assert_eq!(StripeEventType::from_type_str(s), event_type);
        }
    }

    #[test]
    fn event_type_unknown_for_unhandled() {
        assert_eq!(
            StripeEventType::from_type_str("customer.subscription.updated"),
            StripeEventType::Unknown
        );
    }

    #[test]
    fn parsed_type_returns_correct_variant() {
        let event = StripeEventBuilder::new()
            .event_type("charge.refunded")
            .build();

        assert_eq!(event.parsed_type(), StripeEventType::ChargeRefunded);
    }
}
