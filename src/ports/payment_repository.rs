//! PaymentRepository port - storage interface for payment records.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{NewPayment, Payment, PaymentStatus};

/// Port for reading and conditionally updating payment records.
///
/// The status transition is a compare-and-set: the update applies only while
/// the stored status is one of the expected source statuses. Two concurrent
/// deliveries of the same event cannot both win; the loser observes no rows
/// updated and re-reads to classify what happened.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist a new payment created at checkout.
    async fn create(&self, payment: NewPayment) -> Result<Payment, DomainError>;

    /// Find a payment by its identifier.
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, DomainError>;

    /// Find the payment attached to an order.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, DomainError>;

    /// Atomically transition a payment's status.
    ///
    /// Applies `status = to` only if the current status is in `from`, setting
    /// `updated_at` and, when provided, the error message. Returns the
    /// updated payment, or `None` if no row matched the predicate (missing
    /// payment or status outside `from`).
    async fn transition_status(
        &self,
        id: &str,
        from: &[PaymentStatus],
        to: PaymentStatus,
        error_message: Option<&str>,
    ) -> Result<Option<Payment>, DomainError>;
}
