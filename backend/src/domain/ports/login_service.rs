//! Driving port for login and per-request identity.
//!
//! Inbound adapters call it to authenticate credentials and to re-resolve the
//! session's user id on every request without importing persistence.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user.
    ///
    /// Unknown emails and wrong passwords fail identically.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Resolve a session's user id; `None` when the user no longer exists.
    async fn current_user(&self, id: &UserId) -> Result<Option<User>, Error>;
}
