//! Mailer that only logs, for development setups without a provider key.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{Mailer, MailerError, OutboundEmail};

/// Logs recipient and subject; bodies may carry reset links so they are
/// never written out.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        info!(to = %email.to, subject = %email.subject, "email not sent: no mail provider configured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;

    #[tokio::test]
    async fn always_accepts() {
        let email = OutboundEmail {
            to: EmailAddress::new("ada@example.com").expect("valid email"),
            subject: "Hello".into(),
            html_body: "<p>hi</p>".into(),
        };
        assert!(LogMailer.send(&email).await.is_ok());
    }
}
