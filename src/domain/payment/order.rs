//! Read model for the order/intention a payment belongs to.
//!
//! Orders are owned by the order-management subsystem. The reconciliation
//! core only reads contact and display fields and mirrors the payment
//! status onto the order row.

/// Contact and display fields of an order, as needed for notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: String,

    /// Where the confirmation/failure/refund message goes.
    pub contact_email: Option<String>,

    /// Intention text for mass-intention orders.
    pub intention_text: Option<String>,

    /// Scheduled mass date, already formatted for display.
    pub mass_date: Option<String>,

    /// Scheduled mass time, already formatted for display.
    pub mass_time: Option<String>,
}

impl OrderSummary {
    /// Status string mirrored onto the order row for a payment status.
    pub fn mirror_status(payment_status: crate::domain::payment::PaymentStatus) -> &'static str {
        use crate::domain::payment::PaymentStatus;
        match payment_status {
            PaymentStatus::Pending | PaymentStatus::Processing => "awaiting_payment",
            PaymentStatus::Completed => "paid",
            PaymentStatus::Failed => "payment_failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}
