//! ReconcilePaymentHandler - applies a classified outcome to a payment.
//!
//! The transition is a single conditional write keyed on the expected
//! current status. Two concurrent deliveries of the same event cannot both
//! apply it; the loser re-reads the row to find out what happened.

use std::sync::Arc;

use tracing::warn;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{OrderSummary, Payment, PaymentOutcome, PaymentStatus};
use crate::ports::{OrderRepository, PaymentRepository};

/// What reconciliation did to the payment.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Transition applied; the updated payment is returned.
    Applied(Payment),
    /// Payment already held the requested status (duplicate delivery).
    AlreadyApplied(Payment),
    /// Payment holds a different terminal status; nothing was overwritten.
    Conflict {
        payment: Payment,
        requested: PaymentStatus,
    },
    /// No payment with this id exists.
    NotFound,
}

pub struct ReconcilePaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl ReconcilePaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { payments, orders }
    }

    /// Apply `outcome` to the payment identified by `payment_id`.
    ///
    /// On an applied transition the order's mirrored status is updated in
    /// the same logical operation; a mirror failure is logged and swallowed
    /// because the payment row is the source of truth.
    ///
    /// # Errors
    ///
    /// Only data-store failures on the payment row itself propagate; the
    /// caller turns those into a 5xx so the processor redelivers.
    pub async fn handle(
        &self,
        payment_id: &str,
        outcome: &PaymentOutcome,
    ) -> Result<ReconcileOutcome, DomainError> {
        let target = outcome.target_status();
        let sources = PaymentStatus::transition_sources(target);

        let updated = self
            .payments
            .transition_status(payment_id, sources, target, outcome.error_detail())
            .await?;

        match updated {
            Some(payment) => {
                self.mirror_order_status(&payment, target).await;
                Ok(ReconcileOutcome::Applied(payment))
            }
            // The conditional write matched nothing; re-read to classify why
            None => match self.payments.find_by_id(payment_id).await? {
                None => Ok(ReconcileOutcome::NotFound),
                Some(payment) if payment.status == target => {
                    Ok(ReconcileOutcome::AlreadyApplied(payment))
                }
                Some(payment) => Ok(ReconcileOutcome::Conflict {
                    payment,
                    requested: target,
                }),
            },
        }
    }

    async fn mirror_order_status(&self, payment: &Payment, target: PaymentStatus) {
        let Some(order_id) = &payment.order_id else {
            return;
        };
        let mirror = OrderSummary::mirror_status(target);
        if let Err(err) = self.orders.update_status(order_id, mirror).await {
            warn!(
                payment_id = %payment.id,
                order_id = %order_id,
                error = %err,
                "Order status mirror update failed; payment row is authoritative"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::payment::{NewPayment, PaymentBuilder};

    /// Mock payment store with a single scripted payment.
    struct MockPayments {
        payment: Mutex<Option<Payment>>,
        transition_calls: Mutex<Vec<(String, PaymentStatus)>>,
        fail_transition: bool,
    }

    impl MockPayments {
        fn with_payment(payment: Payment) -> Self {
            Self {
                payment: Mutex::new(Some(payment)),
                transition_calls: Mutex::new(Vec::new()),
                fail_transition: false,
            }
        }

        fn empty() -> Self {
            Self {
                payment: Mutex::new(None),
                transition_calls: Mutex::new(Vec::new()),
                fail_transition: false,
            }
        }
    }

    #[async_trait]
    impl PaymentRepository for MockPayments {
        async fn create(&self, _payment: NewPayment) -> Result<Payment, DomainError> {
            unimplemented!("not used in these tests")
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, DomainError> {
            Ok(self
                .payment
                .lock()
                .unwrap()
                .clone()
                .filter(|p| p.id == id))
        }

        async fn find_by_order_id(&self, _order_id: &str) -> Result<Option<Payment>, DomainError> {
            Ok(None)
        }

        async fn transition_status(
            &self,
            id: &str,
            from: &[PaymentStatus],
            to: PaymentStatus,
            error_message: Option<&str>,
        ) -> Result<Option<Payment>, DomainError> {
            if self.fail_transition {
                return Err(DomainError::database("connection lost"));
            }
            self.transition_calls
                .lock()
                .unwrap()
                .push((id.to_string(), to));

            let mut guard = self.payment.lock().unwrap();
            match guard.as_mut() {
                Some(p) if p.id == id && from.contains(&p.status) => {
                    p.status = to;
                    if let Some(err) = error_message {
                        p.error_message = Some(err.to_string());
                    }
                    Ok(Some(p.clone()))
                }
                _ => Ok(None),
            }
        }
    }

    struct MockOrders {
        status_updates: Mutex<Vec<(String, String)>>,
        fail_update: bool,
    }

    impl MockOrders {
        fn new() -> Self {
            Self {
                status_updates: Mutex::new(Vec::new()),
                fail_update: false,
            }
        }

        fn failing() -> Self {
            Self {
                status_updates: Mutex::new(Vec::new()),
                fail_update: true,
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrders {
        async fn find_summary(
            &self,
            _order_id: &str,
        ) -> Result<Option<OrderSummary>, DomainError> {
            Ok(None)
        }

        async fn update_status(&self, order_id: &str, status: &str) -> Result<(), DomainError> {
            if self.fail_update {
                return Err(DomainError::database("mirror store down"));
            }
            self.status_updates
                .lock()
                .unwrap()
                .push((order_id.to_string(), status.to_string()));
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Applied Transition Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn succeeded_outcome_completes_pending_payment() {
        let payment = PaymentBuilder::new()
            .id("pay_1")
            .status(PaymentStatus::Pending)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let orders = Arc::new(MockOrders::new());
        let handler = ReconcilePaymentHandler::new(payments.clone(), orders.clone());

        let result = handler
            .handle("pay_1", &PaymentOutcome::Succeeded)
            .await
            .unwrap();

        match result {
            ReconcileOutcome::Applied(p) => assert_eq!(p.status, PaymentStatus::Completed),
            other => panic!("Expected Applied, got {:?}", other),
        }

        // Mirror update went through
        let updates = orders.status_updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, "paid");
    }

    #[tokio::test]
    async fn failed_outcome_stores_error_message() {
        let payment = PaymentBuilder::new()
            .id("pay_2")
            .status(PaymentStatus::Processing)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::new()));

        let result = handler
            .handle(
                "pay_2",
                &PaymentOutcome::Failed {
                    error: "Card declined".to_string(),
                },
            )
            .await
            .unwrap();

        match result {
            ReconcileOutcome::Applied(p) => {
                assert_eq!(p.status, PaymentStatus::Failed);
                assert_eq!(p.error_message, Some("Card declined".to_string()));
            }
            other => panic!("Expected Applied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refund_applies_only_to_completed_payment() {
        let payment = PaymentBuilder::new()
            .id("pay_3")
            .status(PaymentStatus::Completed)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::new()));

        let result = handler
            .handle("pay_3", &PaymentOutcome::Refunded)
            .await
            .unwrap();

        assert!(matches!(
            result,
            ReconcileOutcome::Applied(Payment {
                status: PaymentStatus::Refunded,
                ..
            })
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Idempotency and Conflict Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn duplicate_delivery_is_a_no_op() {
        let payment = PaymentBuilder::new()
            .id("pay_4")
            .status(PaymentStatus::Completed)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::new()));

        let result = handler
            .handle("pay_4", &PaymentOutcome::Succeeded)
            .await
            .unwrap();

        assert!(matches!(result, ReconcileOutcome::AlreadyApplied(_)));
    }

    #[tokio::test]
    async fn different_terminal_status_is_a_conflict() {
        let payment = PaymentBuilder::new()
            .id("pay_5")
            .status(PaymentStatus::Refunded)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::new()));

        let result = handler
            .handle(
                "pay_5",
                &PaymentOutcome::Failed {
                    error: "late failure".to_string(),
                },
            )
            .await
            .unwrap();

        match result {
            ReconcileOutcome::Conflict { payment, requested } => {
                // Existing terminal status kept, nothing overwritten
                assert_eq!(payment.status, PaymentStatus::Refunded);
                assert_eq!(requested, PaymentStatus::Failed);
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_payment_reports_not_found() {
        let payments = Arc::new(MockPayments::empty());
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::new()));

        let result = handler
            .handle("pay_missing", &PaymentOutcome::Succeeded)
            .await
            .unwrap();

        assert!(matches!(result, ReconcileOutcome::NotFound));
    }

    // ══════════════════════════════════════════════════════════════
    // Failure Semantics Tests
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn primary_store_failure_propagates() {
        let payment = PaymentBuilder::new().id("pay_6").build();
        let mut payments = MockPayments::with_payment(payment);
        payments.fail_transition = true;
        let handler =
            ReconcilePaymentHandler::new(Arc::new(payments), Arc::new(MockOrders::new()));

        let result = handler.handle("pay_6", &PaymentOutcome::Succeeded).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mirror_failure_is_swallowed() {
        let payment = PaymentBuilder::new()
            .id("pay_7")
            .status(PaymentStatus::Pending)
            .build();
        let payments = Arc::new(MockPayments::with_payment(payment));
        let handler = ReconcilePaymentHandler::new(payments, Arc::new(MockOrders::failing()));

        let result = handler
            .handle("pay_7", &PaymentOutcome::Succeeded)
            .await
            .unwrap();

        // Payment update still reported as applied
        assert!(matches!(result, ReconcileOutcome::Applied(_)));
    }
}
