//! Use-case handlers for the payment reconciliation core.

mod dispatch_notification;
mod process_webhook;
mod reconcile_payment;
mod retry_notifications;

pub use dispatch_notification::DispatchNotificationHandler;
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use reconcile_payment::{ReconcileOutcome, ReconcilePaymentHandler};
pub use retry_notifications::{NotificationRetryWorker, SweepStats};
