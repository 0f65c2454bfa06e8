//! Outbound email adapters.
//!
//! - **sendgrid**: SendGrid v3 HTTP API over `reqwest`
//! - **log_mailer**: writes messages to the log instead of sending them

mod log_mailer;
mod sendgrid;

pub use log_mailer::LogMailer;
pub use sendgrid::{SENDGRID_ENDPOINT, SendGridMailer};
