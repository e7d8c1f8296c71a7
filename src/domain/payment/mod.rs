//! Payment domain - webhook verification, event classification, and the
//! payment status state machine.

mod order;
mod outcome;
#[allow(clippy::module_inception)]
mod payment;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use order::OrderSummary;
pub use outcome::{classify, Classification, ClassifiedEvent, DisputeDetails, PaymentOutcome};
pub use payment::{NewPayment, Payment, PaymentMethod, PaymentStatus, PaymentType};
pub use stripe_event::{StripeEvent, StripeEventData, StripeEventType};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use payment::PaymentBuilder;
#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
