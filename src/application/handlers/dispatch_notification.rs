//! DispatchNotificationHandler - best-effort payer notification after an
//! applied payment transition.
//!
//! Everything in here is isolated from the webhook response: rendering,
//! persistence, and delivery failures are logged and swallowed. The caller
//! only ever learns the reconciler's outcome.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::notification::{
    build_payment_message, AdminAlert, Notification, TemplateRegistry,
};
use crate::domain::payment::{DisputeDetails, OrderSummary, Payment, PaymentOutcome};
use crate::ports::{MailSender, NotificationRepository, OrderRepository, OutboundEmail};

pub struct DispatchNotificationHandler {
    orders: Arc<dyn OrderRepository>,
    notifications: Arc<dyn NotificationRepository>,
    mailer: Arc<dyn MailSender>,
    templates: Arc<TemplateRegistry>,
}

impl DispatchNotificationHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        notifications: Arc<dyn NotificationRepository>,
        mailer: Arc<dyn MailSender>,
        templates: Arc<TemplateRegistry>,
    ) -> Self {
        Self {
            orders,
            notifications,
            mailer,
            templates,
        }
    }

    /// Send exactly one message attempt for an applied transition.
    ///
    /// Never called for duplicate or conflicting deliveries, so a payer
    /// receives at most one message per real status change.
    pub async fn handle(&self, payment: &Payment, outcome: &PaymentOutcome) {
        let order = self.load_order(payment).await;

        self.record_admin_alert(payment, outcome).await;

        let Some(recipient) = order.as_ref().and_then(|o| o.contact_email.clone()) else {
            warn!(
                payment_id = %payment.id,
                "No contact email for payment; skipping payer notification"
            );
            return;
        };

        let message = match build_payment_message(&self.templates, outcome, payment, order.as_ref())
        {
            Ok(message) => message,
            Err(err) => {
                warn!(payment_id = %payment.id, error = %err, "Notification rendering failed");
                return;
            }
        };

        let notification = Notification::pending(
            recipient,
            message.subject,
            message.html,
            message.text,
            message.notification_type,
        );

        if let Err(err) = self.notifications.save(&notification).await {
            warn!(
                notification_id = %notification.id,
                error = %err,
                "Failed to persist notification record"
            );
        }

        let email = OutboundEmail {
            to: notification.recipient.clone(),
            subject: notification.subject.clone(),
            html: notification.html_body.clone(),
            text: notification.text_body.clone(),
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                info!(
                    notification_id = %notification.id,
                    payment_id = %payment.id,
                    "Notification delivered"
                );
                if let Err(err) = self.notifications.mark_sent(notification.id).await {
                    warn!(notification_id = %notification.id, error = %err, "Failed to mark notification sent");
                }
            }
            Err(err) => {
                // The retry sweep picks this up later
                warn!(
                    notification_id = %notification.id,
                    payment_id = %payment.id,
                    error = %err,
                    "Notification delivery failed; queued for retry"
                );
                if let Err(mark_err) = self
                    .notifications
                    .mark_failed(notification.id, &err.to_string())
                    .await
                {
                    warn!(notification_id = %notification.id, error = %mark_err, "Failed to mark notification failed");
                }
            }
        }
    }

    /// Record an urgent admin alert for a contested charge.
    ///
    /// Disputes carry no payment transition and no payer message; the
    /// admins take it from here.
    pub async fn handle_dispute(&self, details: &DisputeDetails) {
        let charge = details.charge_id.as_deref().unwrap_or("nieznane");
        let mut message = format!("Obciążenie {} zostało zakwestionowane", charge);
        if let Some(amount) = details.amount {
            message.push_str(&format!(" na kwotę {}.{:02} zł", amount / 100, amount % 100));
        }
        if let Some(reason) = &details.reason {
            message.push_str(&format!(" (powód: {})", reason));
        }

        let alert = AdminAlert::new("payment_disputed", "Sporna płatność", message);
        if let Err(err) = self.notifications.save_admin_alert(&alert).await {
            warn!(charge_id = %charge, error = %err, "Failed to save dispute alert");
        }
    }

    async fn load_order(&self, payment: &Payment) -> Option<OrderSummary> {
        let order_id = payment.order_id.as_deref()?;
        match self.orders.find_summary(order_id).await {
            Ok(order) => order,
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "Failed to load order for notification");
                None
            }
        }
    }

    async fn record_admin_alert(&self, payment: &Payment, outcome: &PaymentOutcome) {
        let (alert_type, title) = match outcome {
            PaymentOutcome::Succeeded => ("payment_completed", "Nowa płatność"),
            PaymentOutcome::Failed { .. } => ("payment_failed", "Nieudana płatność"),
            PaymentOutcome::Refunded => ("payment_refunded", "Zwrot płatności"),
        };
        let message = match outcome.error_detail() {
            Some(error) => format!(
                "Płatność {} na kwotę {}: {}",
                payment.id,
                payment.amount_display(),
                error
            ),
            None => format!(
                "Płatność {} na kwotę {}",
                payment.id,
                payment.amount_display()
            ),
        };

        let alert = AdminAlert::new(alert_type, title, message);
        if let Err(err) = self.notifications.save_admin_alert(&alert).await {
            warn!(payment_id = %payment.id, error = %err, "Failed to save admin alert");
        }
    }
}
