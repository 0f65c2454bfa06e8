//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CountryId, EmailAddress, PasswordHash, ResetGrant, ResetTokenDigest, User, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        EmailTaken { email: String } => "email already registered: {email}",
        /// The country does not exist or already has an administrator.
        CountryUnavailable { country_id: String } => "country cannot be claimed: {country_id}",
    }
}

/// Account to create together with its country claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub country_id: CountryId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the user holding a reset grant for `digest` that is still valid
    /// at `now`.
    async fn find_by_reset_digest(
        &self,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Create the user and claim its country in one atomic step.
    ///
    /// Nothing is written when the email is taken or the country cannot be
    /// claimed.
    async fn register(&self, account: &NewAccount) -> Result<User, UserPersistenceError>;

    /// Store a reset grant, replacing any outstanding one.
    async fn store_reset_grant(
        &self,
        id: &UserId,
        grant: &ResetGrant,
    ) -> Result<(), UserPersistenceError>;

    /// Replace the password hash and clear the reset grant, provided the
    /// user still holds a grant for `digest` that is valid at `now`.
    ///
    /// The check and the write are one atomic step. Returns `false`, writing
    /// nothing, when the grant is gone, expired, or was already redeemed.
    async fn redeem_reset_grant(
        &self,
        id: &UserId,
        digest: &ResetTokenDigest,
        now: DateTime<Utc>,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError>;
}
