//! Notification domain - email templates, message variants, and outbound
//! notification records.

mod messages;
#[allow(clippy::module_inception)]
mod notification;
mod template;

pub use messages::{
    build_payment_message, RenderedMessage, SUBJECT_CONFIRMATION, SUBJECT_FAILURE, SUBJECT_REFUND,
};
pub use notification::{AdminAlert, Notification, NotificationStatus, NotificationType};
pub use template::{
    html_to_text, substitute_placeholders, wrap_layout, TemplateError, TemplateId,
    TemplateRegistry,
};
