//! Ports - trait interfaces between the application core and the outside
//! world. Adapters implement these; handlers depend only on the traits.

mod mail_sender;
mod notification_repository;
mod order_repository;
mod payment_repository;
mod webhook_event_repository;

pub use mail_sender::{MailSender, OutboundEmail};
pub use notification_repository::NotificationRepository;
pub use order_repository::OrderRepository;
pub use payment_repository::PaymentRepository;
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus,
};
