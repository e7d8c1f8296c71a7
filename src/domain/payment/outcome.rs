//! Classification of verified webhook events into payment outcomes.

use super::payment::PaymentStatus;
use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::WebhookError;

/// The domain outcome a processor event maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed { error: String },
    Refunded,
}

impl PaymentOutcome {
    /// The payment status this outcome drives the record toward.
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            PaymentOutcome::Succeeded => PaymentStatus::Completed,
            PaymentOutcome::Failed { .. } => PaymentStatus::Failed,
            PaymentOutcome::Refunded => PaymentStatus::Refunded,
        }
    }

    /// Error detail carried by failed outcomes.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            PaymentOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// A recognized event resolved to an outcome plus the identifiers it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub payment_id: String,
    pub order_id: Option<String>,
    pub outcome: PaymentOutcome,
}

/// What a dispute event reports about the contested charge.
///
/// Disputes drive no status transition; they only raise an admin alert,
/// so every field is best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeDetails {
    pub charge_id: Option<String>,
    pub amount: Option<i64>,
    pub reason: Option<String>,
}

/// Result of classifying a verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Event maps to a payment outcome and should be reconciled.
    Actionable(ClassifiedEvent),
    /// Payer contested a charge; alert the admins, touch nothing.
    Disputed(DisputeDetails),
    /// Event type is not acted on; acknowledge and move on.
    Ignored { reason: String },
}

/// Classify a verified Stripe event into a payment outcome.
///
/// Unrecognized event types are acknowledged without side effects so the
/// processor does not retry them indefinitely.
///
/// # Errors
///
/// Returns `WebhookError::MissingMetadata` when a recognized event lacks
/// the `payment_id` metadata field.
pub fn classify(event: &StripeEvent) -> Result<Classification, WebhookError> {
    let outcome = match event.parsed_type() {
        StripeEventType::PaymentIntentSucceeded | StripeEventType::CheckoutSessionCompleted => {
            PaymentOutcome::Succeeded
        }
        StripeEventType::PaymentIntentFailed => PaymentOutcome::Failed {
            error: event
                .payment_error_message()
                .unwrap_or("Payment failed")
                .to_string(),
        },
        StripeEventType::ChargeRefunded => PaymentOutcome::Refunded,
        StripeEventType::ChargeDisputeCreated => {
            return Ok(Classification::Disputed(DisputeDetails {
                charge_id: event.object_field("charge").map(str::to_string),
                amount: event.object_int_field("amount"),
                reason: event.object_field("reason").map(str::to_string),
            }));
        }
        StripeEventType::Unknown => {
            return Ok(Classification::Ignored {
                reason: format!("Unhandled event type: {}", event.event_type),
            });
        }
    };

    let payment_id = event
        .metadata_field("payment_id")
        .ok_or(WebhookError::MissingMetadata("payment_id"))?
        .to_string();
    let order_id = event.metadata_field("order_id").map(str::to_string);

    Ok(Classification::Actionable(ClassifiedEvent {
        payment_id,
        order_id,
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::stripe_event::StripeEventBuilder;
    use serde_json::json;

    fn object_with_metadata() -> serde_json::Value {
        json!({
            "id": "pi_123",
            "metadata": {"payment_id": "pay_123", "order_id": "order_456"}
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Outcome Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn payment_intent_succeeded_classifies_as_succeeded() {
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.succeeded")
            .object(object_with_metadata())
            .build();

        let classification = classify(&event).unwrap();

        match classification {
            Classification::Actionable(c) => {
                assert_eq!(c.payment_id, "pay_123");
                assert_eq!(c.order_id, Some("order_456".to_string()));
                assert_eq!(c.outcome, PaymentOutcome::Succeeded);
            }
            other => panic!("Expected actionable, got {:?}", other),
        }
    }

    #[test]
    fn checkout_session_completed_classifies_as_succeeded() {
        let event = StripeEventBuilder::new()
            .event_type("checkout.session.completed")
            .object(object_with_metadata())
            .build();

        let classification = classify(&event).unwrap();

        assert!(matches!(
            classification,
            Classification::Actionable(ClassifiedEvent {
                outcome: PaymentOutcome::Succeeded,
                ..
            })
        ));
    }

    #[test]
    fn payment_failed_carries_error_detail() {
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.payment_failed")
            .object(json!({
                "id": "pi_123",
                "metadata": {"payment_id": "pay_123"},
                "last_payment_error": {"message": "Card declined"}
            }))
            .build();

        let classification = classify(&event).unwrap();

        match classification {
            Classification::Actionable(c) => {
                assert_eq!(
                    c.outcome,
                    PaymentOutcome::Failed {
                        error: "Card declined".to_string()
                    }
                );
                assert_eq!(c.order_id, None);
            }
            other => panic!("Expected actionable, got {:?}", other),
        }
    }

    #[test]
    fn payment_failed_without_detail_uses_default() {
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.payment_failed")
            .object(json!({"id": "pi_123", "metadata": {"payment_id": "pay_123"}}))
            .build();

        let classification = classify(&event).unwrap();

        match classification {
            Classification::Actionable(c) => {
                assert_eq!(c.outcome.error_detail(), Some("Payment failed"));
            }
            other => panic!("Expected actionable, got {:?}", other),
        }
    }

    #[test]
    fn charge_refunded_classifies_as_refunded() {
        let event = StripeEventBuilder::new()
            .event_type("charge.refunded")
            .object(object_with_metadata())
            .build();

        let classification = classify(&event).unwrap();

        assert!(matches!(
            classification,
            Classification::Actionable(ClassifiedEvent {
                outcome: PaymentOutcome::Refunded,
                ..
            })
        ));
    }

    #[test]
    fn charge_dispute_classifies_with_details() {
        let event = StripeEventBuilder::new()
            .event_type("charge.dispute.created")
            .object(json!({
                "id": "dp_1",
                "charge": "ch_9",
                "amount": 5000,
                "reason": "fraudulent"
            }))
            .build();

        let classification = classify(&event).unwrap();

        assert_eq!(
            classification,
            Classification::Disputed(DisputeDetails {
                charge_id: Some("ch_9".to_string()),
                amount: Some(5000),
                reason: Some("fraudulent".to_string()),
            })
        );
    }

    #[test]
    fn charge_dispute_tolerates_sparse_object() {
        let event = StripeEventBuilder::new()
            .event_type("charge.dispute.created")
            .object(json!({"id": "dp_2"}))
            .build();

        let classification = classify(&event).unwrap();

        assert_eq!(
            classification,
            Classification::Disputed(DisputeDetails {
                charge_id: None,
                amount: None,
                reason: None,
            })
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Ignore / Error Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn unknown_event_type_is_ignored() {
        let event = StripeEventBuilder::new()
            .event_type("customer.subscription.updated")
            .build();

        let classification = classify(&event).unwrap();

        assert!(matches!(classification, Classification::Ignored { .. }));
    }

    #[test]
    fn recognized_event_without_payment_id_fails() {
        let event = StripeEventBuilder::new()
            .event_type("payment_intent.succeeded")
            .object(json!({"id": "pi_123", "metadata": {}}))
            .build();

        let result = classify(&event);

        assert!(matches!(
            result,
            Err(WebhookError::MissingMetadata("payment_id"))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Target Status Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn outcomes_map_to_target_statuses() {
        assert_eq!(
            PaymentOutcome::Succeeded.target_status(),
            PaymentStatus::Completed
        );
        assert_eq!(
            PaymentOutcome::Failed {
                error: "x".to_string()
            }
            .target_status(),
            PaymentStatus::Failed
        );
        assert_eq!(
            PaymentOutcome::Refunded.target_status(),
            PaymentStatus::Refunded
        );
    }
}
