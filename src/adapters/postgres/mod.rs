//! PostgreSQL adapters implementing the storage ports.

mod notification_repository;
mod order_repository;
mod payment_repository;
mod webhook_event_repository;

pub use notification_repository::PostgresNotificationRepository;
pub use order_repository::PostgresOrderRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;
