//! OrderRepository port - read access and status mirroring for orders.
//!
//! Orders are owned by the order-management subsystem; this core only reads
//! contact/display fields and writes the denormalized status mirror.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::OrderSummary;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Contact and display fields for an order.
    async fn find_summary(&self, order_id: &str) -> Result<Option<OrderSummary>, DomainError>;

    /// Write the mirrored status onto the order row.
    ///
    /// Failures here are non-fatal to webhook processing; the payment record
    /// stays authoritative and the divergence is logged for repair.
    async fn update_status(&self, order_id: &str, status: &str) -> Result<(), DomainError>;
}
