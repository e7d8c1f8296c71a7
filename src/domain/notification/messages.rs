//! Message variants for payment lifecycle notifications.
//!
//! Maps a payment outcome to a subject line, a template, and the rendered
//! HTML/text bodies sent to the payer.

use serde_json::json;

use crate::domain::payment::{OrderSummary, Payment, PaymentOutcome};

use super::notification::NotificationType;
use super::template::{html_to_text, TemplateError, TemplateId, TemplateRegistry};

/// Subject line for payment confirmations.
pub const SUBJECT_CONFIRMATION: &str = "Potwierdzenie płatności - Oremus";

/// Subject line for payment failures.
pub const SUBJECT_FAILURE: &str = "Problem z płatnością - Oremus";

/// Subject line for refund confirmations.
pub const SUBJECT_REFUND: &str = "Potwierdzenie zwrotu płatności - Oremus";

/// A fully rendered outbound message.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
    pub notification_type: NotificationType,
}

/// Builds the message for an applied payment transition.
///
/// The failure variant embeds the processor's error detail verbatim.
/// Missing order display fields render as a dash rather than failing.
pub fn build_payment_message(
    registry: &TemplateRegistry,
    outcome: &PaymentOutcome,
    payment: &Payment,
    order: Option<&OrderSummary>,
) -> Result<RenderedMessage, TemplateError> {
    let (template_id, subject, notification_type) = match outcome {
        PaymentOutcome::Succeeded => (
            TemplateId::PaymentConfirmation,
            SUBJECT_CONFIRMATION,
            NotificationType::PaymentConfirmation,
        ),
        PaymentOutcome::Failed { .. } => (
            TemplateId::PaymentFailure,
            SUBJECT_FAILURE,
            NotificationType::PaymentFailure,
        ),
        PaymentOutcome::Refunded => (
            TemplateId::PaymentRefund,
            SUBJECT_REFUND,
            NotificationType::PaymentRefund,
        ),
    };

    let context = message_context(outcome, payment, order);
    let html = registry.render_page(template_id, subject, &context)?;
    let text = html_to_text(&html);

    Ok(RenderedMessage {
        subject: subject.to_string(),
        html,
        text,
        notification_type,
    })
}

fn message_context(
    outcome: &PaymentOutcome,
    payment: &Payment,
    order: Option<&OrderSummary>,
) -> serde_json::Value {
    let field = |f: fn(&OrderSummary) -> Option<&str>| {
        order.and_then(f).unwrap_or("-").to_string()
    };

    json!({
        "intention": order
            .and_then(|o| o.intention_text.as_deref())
            .or(payment.description.as_deref())
            .unwrap_or("-"),
        "mass_date": field(|o| o.mass_date.as_deref()),
        "mass_time": field(|o| o.mass_time.as_deref()),
        "amount": payment.amount_display(),
        "method": payment.method.display_name(),
        "error": outcome.error_detail().unwrap_or(""),
        "payment": {"id": payment.id},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{PaymentBuilder, PaymentMethod};

    fn test_order() -> OrderSummary {
        OrderSummary {
            id: "order_1".to_string(),
            contact_email: Some("jan@example.com".to_string()),
            intention_text: Some("Za zmarłych z rodziny".to_string()),
            mass_date: Some("2026-09-01".to_string()),
            mass_time: Some("18:00".to_string()),
        }
    }

    #[test]
    fn confirmation_message_includes_order_details() {
        let registry = TemplateRegistry::with_defaults();
        let payment = PaymentBuilder::new()
            .amount(5000)
            .method(PaymentMethod::Blik)
            .build();

        let message = build_payment_message(
            &registry,
            &PaymentOutcome::Succeeded,
            &payment,
            Some(&test_order()),
        )
        .unwrap();

        assert_eq!(message.subject, SUBJECT_CONFIRMATION);
        assert_eq!(message.notification_type, NotificationType::PaymentConfirmation);
        assert!(message.html.contains("Za zmarłych z rodziny"));
        assert!(message.html.contains("2026-09-01"));
        assert!(message.html.contains("18:00"));
        assert!(message.html.contains("50.00 zł"));
        assert!(message.html.contains("BLIK"));
        assert!(message.text.contains("Za zmarłych z rodziny"));
    }

    #[test]
    fn failure_message_embeds_error_verbatim() {
        let registry = TemplateRegistry::with_defaults();
        let payment = PaymentBuilder::new().build();

        let message = build_payment_message(
            &registry,
            &PaymentOutcome::Failed {
                error: "Card declined".to_string(),
            },
            &payment,
            Some(&test_order()),
        )
        .unwrap();

        assert!(message.subject.contains("Problem z płatnością"));
        assert!(message.html.contains("Card declined"));
        assert!(message.text.contains("Card declined"));
    }

    #[test]
    fn refund_message_has_refund_subject() {
        let registry = TemplateRegistry::with_defaults();
        let payment = PaymentBuilder::new().build();

        let message = build_payment_message(
            &registry,
            &PaymentOutcome::Refunded,
            &payment,
            Some(&test_order()),
        )
        .unwrap();

        assert!(message.subject.contains("Potwierdzenie zwrotu"));
        assert_eq!(message.notification_type, NotificationType::PaymentRefund);
    }

    #[test]
    fn missing_order_renders_dashes() {
        let registry = TemplateRegistry::with_defaults();
        let payment = PaymentBuilder::new().order_id(None).build();

        let message =
            build_payment_message(&registry, &PaymentOutcome::Succeeded, &payment, None).unwrap();

        // Falls back to payment description, then a dash
        assert!(message.html.contains("<td>-</td>"));
    }

    #[test]
    fn intention_falls_back_to_payment_description() {
        let registry = TemplateRegistry::with_defaults();
        let mut payment = PaymentBuilder::new().build();
        payment.description = Some("Świeca wirtualna".to_string());

        let message =
            build_payment_message(&registry, &PaymentOutcome::Succeeded, &payment, None).unwrap();

        assert!(message.html.contains("Świeca wirtualna"));
    }
}
