//! Email adapters implementing the MailSender port.

mod resend_mailer;

pub use resend_mailer::ResendMailer;
