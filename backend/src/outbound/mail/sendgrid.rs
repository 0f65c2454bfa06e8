//! Reqwest-backed SendGrid mailer.
//!
//! Only transport concerns live here: payload shape, bearer auth, timeout and
//! status mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value, json};
use tracing::warn;

use crate::domain::EmailAddress;
use crate::domain::ports::{Mailer, MailerError, OutboundEmail};

/// Production endpoint of the v3 mail send API.
pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Mailer posting to the SendGrid v3 API.
pub struct SendGridMailer {
    client: Client,
    endpoint: Url,
    api_key: String,
    from: EmailAddress,
}

impl SendGridMailer {
    /// Build a mailer with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        from: EmailAddress,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            from,
        })
    }
}

impl std::fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridMailer")
            .field("endpoint", &self.endpoint.as_str())
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&build_payload(&self.from, email))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(map_status_error(status, body.as_ref()))
    }
}

fn build_payload(from: &EmailAddress, email: &OutboundEmail) -> Value {
    json!({
        "personalizations": [{ "to": [{ "email": email.to.as_ref() }] }],
        "from": { "email": from.as_ref() },
        "subject": email.subject,
        "content": [{ "type": "text/html", "value": email.html_body }],
    })
}

fn map_transport_error(error: reqwest::Error) -> MailerError {
    if error.is_timeout() {
        MailerError::transport(format!("timed out: {error}"))
    } else {
        MailerError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MailerError {
    warn!(
        status = status.as_u16(),
        body = %body_preview(body),
        "mail provider rejected message"
    );
    MailerError::rejected(status.as_u16())
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
