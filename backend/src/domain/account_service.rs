//! Account use-cases: login, signup and password reset.
//!
//! Implements the [`LoginService`], [`SignupService`] and
//! [`PasswordResetService`] driving ports on top of the user and country
//! repositories, a password hasher and a mailer.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use crate::domain::ports::{
    CountryPersistenceError, CountryRepository, LoginService, Mailer, NewAccount, OutboundEmail,
    PasswordHashError, PasswordHasher, PasswordResetService, ResetRequestOutcome, SignupService,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    CountrySummary, EmailAddress, Error, LoginCredentials, NewPasswordRequest, Password,
    PasswordHash, ResetGrant, ResetToken, SignupRequest, User, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";
const EMAIL_TAKEN: &str = "This email address already exists, please enter a different one";
const COUNTRY_UNAVAILABLE: &str = "That country is not available, please choose another one";
const INVALID_TOKEN: &str = "This password reset link is invalid or has expired";

/// Settings the account flows need from the outside world.
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    public_base_url: Url,
}

impl AccountServiceConfig {
    pub fn new(public_base_url: Url) -> Self {
        Self { public_base_url }
    }

    /// Link emailed to a user asking for a reset.
    pub fn reset_link(&self, token: &ResetToken) -> String {
        format!(
            "{}/reset-password/{}",
            self.public_base_url.as_str().trim_end_matches('/'),
            token.as_str()
        )
    }
}

/// Account service implementing the authentication driving ports.
#[derive(Clone)]
pub struct AccountService<U, C> {
    users: Arc<U>,
    countries: Arc<C>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: AccountServiceConfig,
}

impl<U, C> AccountService<U, C> {
    pub fn new(
        users: Arc<U>,
        countries: Arc<C>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: AccountServiceConfig,
    ) -> Self {
        Self {
            users,
            countries,
            hasher,
            mailer,
            clock,
            config,
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::EmailTaken { .. } => email_taken(),
        UserPersistenceError::CountryUnavailable { .. } => country_unavailable(),
    }
}

fn map_country_error(error: CountryPersistenceError) -> Error {
    match error {
        CountryPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("country repository unavailable: {message}"))
        }
        CountryPersistenceError::Query { message } => {
            Error::internal(format!("country repository error: {message}"))
        }
        CountryPersistenceError::NotFound { .. } => country_unavailable(),
        CountryPersistenceError::PopulationOverflow { .. } => Error::internal(error.to_string()),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn field_error(message: &str, field: &str, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn email_taken() -> Error {
    field_error(EMAIL_TAKEN, "email", "email_taken")
}

fn country_unavailable() -> Error {
    field_error(COUNTRY_UNAVAILABLE, "country", "country_unavailable")
}

fn invalid_or_expired_token() -> Error {
    field_error(INVALID_TOKEN, "passwordToken", "invalid_or_expired_token")
}

fn welcome_email(to: &EmailAddress) -> OutboundEmail {
    OutboundEmail {
        to: to.clone(),
        subject: "You have successfully signed up to Covid Tracker".to_owned(),
        html_body: "<h1>You have successfully signed up!</h1>".to_owned(),
    }
}

fn reset_email(to: &EmailAddress, link: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.clone(),
        subject: "Resetting the password to Covid Tracker".to_owned(),
        html_body: format!(
            "<p>You have requested to reset your password</p>\n\
             <p>Click this <a href=\"{link}\">link</a> to set a new password</p>"
        ),
    }
}

impl<U, C> AccountService<U, C>
where
    U: UserRepository,
    C: CountryRepository,
{
    async fn hash_password(&self, password: &Password) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(map_hash_error)
    }

    async fn verify_password(&self, password: &Password, hash: &PasswordHash) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
            .map_err(map_hash_error)
    }

    /// User whose reset grant `token` redeems right now.
    async fn user_for_token(&self, token: &ResetToken) -> Result<User, Error> {
        let digest = token.digest();
        let now = self.clock.utc();
        let user = self
            .users
            .find_by_reset_digest(&digest, now)
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_or_expired_token)?;
        let redeemable = user
            .reset_grant()
            .is_some_and(|grant| grant.accepts(&digest, now));
        if !redeemable {
            return Err(invalid_or_expired_token());
        }
        Ok(user)
    }
}

#[async_trait]
impl<U, C> LoginService for AccountService<U, C>
where
    U: UserRepository,
    C: CountryRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(user) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        if self
            .verify_password(credentials.password(), user.password_hash())
            .await?
        {
            Ok(user)
        } else {
            Err(Error::unauthorized(INVALID_CREDENTIALS))
        }
    }

    async fn current_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }
}

#[async_trait]
impl<U, C> SignupService for AccountService<U, C>
where
    U: UserRepository,
    C: CountryRepository,
{
    async fn unclaimed_countries(&self) -> Result<Vec<CountrySummary>, Error> {
        self.countries
            .list_unclaimed()
            .await
            .map_err(map_country_error)
    }

    async fn register(&self, request: &SignupRequest) -> Result<User, Error> {
        if self
            .users
            .find_by_email(request.email())
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(email_taken());
        }

        let password_hash = self.hash_password(request.password()).await?;
        let account = NewAccount {
            id: UserId::random(),
            email: request.email().clone(),
            password_hash,
            country_id: *request.country_id(),
        };
        let user = self
            .users
            .register(&account)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id(), country_id = %user.country_id(), "account registered");

        if let Err(err) = self.mailer.send(&welcome_email(user.email())).await {
            warn!(user_id = %user.id(), error = %err, "welcome email not sent");
        }
        Ok(user)
    }
}

#[async_trait]
impl<U, C> PasswordResetService for AccountService<U, C>
where
    U: UserRepository,
    C: CountryRepository,
{
    async fn request_reset(&self, email: &EmailAddress) -> Result<ResetRequestOutcome, Error> {
        let Some(user) = self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
        else {
            return Ok(ResetRequestOutcome::UnknownEmail);
        };

        let token = ResetToken::generate();
        let grant = ResetGrant::issue(&token, self.clock.utc());
        self.users
            .store_reset_grant(user.id(), &grant)
            .await
            .map_err(map_user_error)?;

        let link = self.config.reset_link(&token);
        self.mailer
            .send(&reset_email(user.email(), &link))
            .await
            .map_err(|err| {
                warn!(user_id = %user.id(), error = %err, "reset email not sent");
                Error::service_unavailable("could not send the password reset email")
            })?;
        info!(user_id = %user.id(), expires_at = %grant.expires_at(), "password reset issued");
        Ok(ResetRequestOutcome::Sent)
    }

    async fn verify_token(&self, token: &ResetToken) -> Result<UserId, Error> {
        self.user_for_token(token).await.map(|user| *user.id())
    }

    async fn complete_reset(&self, request: &NewPasswordRequest) -> Result<(), Error> {
        let user = self.user_for_token(request.token()).await?;
        let password_hash = self.hash_password(request.password()).await?;
        let redeemed = self
            .users
            .redeem_reset_grant(
                user.id(),
                &request.token().digest(),
                self.clock.utc(),
                &password_hash,
            )
            .await
            .map_err(map_user_error)?;
        if !redeemed {
            return Err(invalid_or_expired_token());
        }
        info!(user_id = %user.id(), "password reset completed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
