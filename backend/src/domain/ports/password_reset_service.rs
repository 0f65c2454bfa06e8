//! Driving port for the password reset flow.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, NewPasswordRequest, ResetToken, UserId};

/// Result of asking for a reset link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// A link was emailed.
    Sent,
    /// No account uses the address.
    UnknownEmail,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Issue a one-hour token and email the reset link.
    async fn request_reset(&self, email: &EmailAddress) -> Result<ResetRequestOutcome, Error>;

    /// Resolve the user a still-valid token belongs to.
    async fn verify_token(&self, token: &ResetToken) -> Result<UserId, Error>;

    /// Replace the password and invalidate the token.
    async fn complete_reset(&self, request: &NewPasswordRequest) -> Result<(), Error>;
}
