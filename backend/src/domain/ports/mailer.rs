//! Port for outbound transactional email.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised while handing mail to a provider.
    pub enum MailerError {
        /// The provider could not be reached.
        Transport { message: String } => "mail transport failed: {message}",
        /// The provider refused the message.
        Rejected { status: u16 } => "mail provider rejected the message with status {status}",
    }
}

/// Single HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}
