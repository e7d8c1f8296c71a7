//! ProcessWebhookHandler - end-to-end handling of one webhook delivery.
//!
//! Pipeline: verify signature, record the event (insert-wins idempotency),
//! classify, reconcile, dispatch notification, record the result. The HTTP
//! layer maps the returned result or error onto a status code for Stripe.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::payment::{
    classify, Classification, ClassifiedEvent, PaymentStatus, StripeEvent, WebhookError,
    WebhookVerifier,
};
use crate::ports::{SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus};

use super::dispatch_notification::DispatchNotificationHandler;
use super::reconcile_payment::{ReconcileOutcome, ReconcilePaymentHandler};

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as signed by Stripe.
    pub payload: Vec<u8>,
    /// Value of the Stripe-Signature header.
    pub signature: String,
}

/// What processing did with the delivery. All variants are acknowledged
/// with a 2xx; errors carry their own status mapping.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// Transition applied and notification dispatched.
    Processed {
        payment_id: String,
        status: PaymentStatus,
    },
    /// Same event id already handled to completion; nothing done.
    Duplicate,
    /// Event acknowledged without action (unrecognized type, bad metadata).
    Ignored { reason: String },
    /// Charge contested by the payer; admin alert raised, no transition.
    Disputed,
    /// Payment already held the requested status.
    NoOp { payment_id: String },
    /// Payment held a different terminal status; kept as is.
    Conflict { payment_id: String },
    /// No payment matched the event's payment id.
    PaymentMissing { payment_id: String },
}

impl ProcessWebhookResult {
    /// Short result tag used in the response body and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed { .. } => "processed",
            Self::Duplicate => "duplicate",
            Self::Ignored { .. } => "ignored",
            Self::Disputed => "disputed",
            Self::NoOp { .. } => "no_op",
            Self::Conflict { .. } => "conflict",
            Self::PaymentMissing { .. } => "payment_missing",
        }
    }
}

pub struct ProcessWebhookHandler {
    verifier: WebhookVerifier,
    webhook_events: Arc<dyn WebhookEventRepository>,
    reconciler: ReconcilePaymentHandler,
    dispatcher: DispatchNotificationHandler,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        webhook_events: Arc<dyn WebhookEventRepository>,
        reconciler: ReconcilePaymentHandler,
        dispatcher: DispatchNotificationHandler,
    ) -> Self {
        Self {
            verifier,
            webhook_events,
            reconciler,
            dispatcher,
        }
    }

    /// Process one delivery.
    ///
    /// # Errors
    ///
    /// - Signature/parse failures (400): nothing was read or written.
    /// - `Database` (500): the primary payment update failed; Stripe
    ///   redelivers and the idempotency record tolerates the rerun.
    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        // 1. Authenticate before touching any state
        let event = self.verifier.verify_and_parse(&cmd.payload, &cmd.signature)?;

        // 2. Insert-wins idempotency on the event id
        let payload = serde_json::to_value(&event)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let record = WebhookEventRecord::received(&event.id, &event.event_type, payload);
        if self.webhook_events.save_received(record).await? == SaveResult::AlreadyExists {
            // A prior delivery may have answered 5xx and left the record
            // unfinished. Only a record that reached a final status
            // short-circuits; otherwise the redelivery runs the pipeline
            // again and the conditional payment update keeps it safe.
            let prior_status = self
                .webhook_events
                .find_by_event_id(&event.id)
                .await?
                .map(|r| r.status);
            match prior_status {
                Some(WebhookEventStatus::Processed) | Some(WebhookEventStatus::Ignored) => {
                    info!(event_id = %event.id, "Duplicate webhook delivery skipped");
                    return Ok(ProcessWebhookResult::Duplicate);
                }
                _ => {
                    info!(event_id = %event.id, "Redelivery of unfinished event; reprocessing");
                }
            }
        }

        // 3. Classify into a payment outcome
        let classified = match classify(&event) {
            Ok(Classification::Actionable(classified)) => classified,
            Ok(Classification::Disputed(details)) => {
                warn!(
                    event_id = %event.id,
                    charge_id = ?details.charge_id,
                    "Charge disputed; raising admin alert"
                );
                self.dispatcher.handle_dispute(&details).await;
                self.record_result(&event, WebhookEventStatus::Processed, None)
                    .await;
                return Ok(ProcessWebhookResult::Disputed);
            }
            Ok(Classification::Ignored { reason }) => {
                info!(event_id = %event.id, event_type = %event.event_type, %reason, "Webhook event ignored");
                self.record_result(&event, WebhookEventStatus::Ignored, Some(&reason))
                    .await;
                return Ok(ProcessWebhookResult::Ignored { reason });
            }
            Err(WebhookError::MissingMetadata(field)) => {
                // Authentic but malformed; acknowledge so Stripe stops redelivering
                let reason = format!("Missing metadata field: {}", field);
                warn!(event_id = %event.id, event_type = %event.event_type, %reason, "Webhook event unusable");
                self.record_result(&event, WebhookEventStatus::Failed, Some(&reason))
                    .await;
                return Ok(ProcessWebhookResult::Ignored { reason });
            }
            Err(err) => return Err(err),
        };

        // 4. Reconcile and dispatch
        self.reconcile(&event, classified).await
    }

    async fn reconcile(
        &self,
        event: &StripeEvent,
        classified: ClassifiedEvent,
    ) -> Result<ProcessWebhookResult, WebhookError> {
        let ClassifiedEvent {
            payment_id,
            outcome,
            ..
        } = classified;

        match self.reconciler.handle(&payment_id, &outcome).await {
            Ok(ReconcileOutcome::Applied(payment)) => {
                // One message attempt per real transition, never per duplicate
                self.dispatcher.handle(&payment, &outcome).await;
                info!(
                    event_id = %event.id,
                    payment_id = %payment.id,
                    status = %payment.status,
                    "Payment transition applied"
                );
                self.record_result(event, WebhookEventStatus::Processed, None)
                    .await;
                Ok(ProcessWebhookResult::Processed {
                    payment_id: payment.id.clone(),
                    status: payment.status,
                })
            }
            Ok(ReconcileOutcome::AlreadyApplied(payment)) => {
                let reason = format!("Payment already {}", payment.status);
                info!(event_id = %event.id, payment_id = %payment.id, "Idempotent no-op");
                self.record_result(event, WebhookEventStatus::Ignored, Some(&reason))
                    .await;
                Ok(ProcessWebhookResult::NoOp {
                    payment_id: payment.id.clone(),
                })
            }
            Ok(ReconcileOutcome::Conflict { payment, requested }) => {
                let reason = format!(
                    "Status conflict: payment is {}, event requested {}",
                    payment.status, requested
                );
                warn!(
                    event_id = %event.id,
                    payment_id = %payment.id,
                    current = %payment.status,
                    requested = %requested,
                    "Conflicting terminal status kept; event acknowledged"
                );
                self.record_result(event, WebhookEventStatus::Ignored, Some(&reason))
                    .await;
                Ok(ProcessWebhookResult::Conflict {
                    payment_id: payment.id.clone(),
                })
            }
            Ok(ReconcileOutcome::NotFound) => {
                // Possibly a cancelled/rolled-back order in a concurrent process
                let reason = format!("Payment not found: {}", payment_id);
                warn!(event_id = %event.id, %payment_id, "Webhook references unknown payment");
                self.record_result(event, WebhookEventStatus::Ignored, Some(&reason))
                    .await;
                Ok(ProcessWebhookResult::PaymentMissing { payment_id })
            }
            Err(err) => {
                self.record_result(event, WebhookEventStatus::Failed, Some(&err.to_string()))
                    .await;
                Err(err.into())
            }
        }
    }

    /// Best-effort audit update; a failure here must not change the response.
    async fn record_result(
        &self,
        event: &StripeEvent,
        status: WebhookEventStatus,
        error_message: Option<&str>,
    ) {
        if let Err(err) = self
            .webhook_events
            .mark_result(&event.id, status, error_message)
            .await
        {
            warn!(event_id = %event.id, error = %err, "Failed to record webhook result");
        }
    }
}
