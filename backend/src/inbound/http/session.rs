//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The session cookie carries three values: the authenticated user id, the
//! CSRF token issued to page models, and a one-shot flash message. The user
//! record itself is never cached here.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const CSRF_TOKEN_KEY: &str = "csrf_token";
pub(crate) const FLASH_KEY: &str = "flash";

const CSRF_TOKEN_BYTES: usize = 32;

fn session_write_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

fn session_read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the authenticated user's id under a fresh session cookie.
    ///
    /// The CSRF token is dropped so the next page model issues a new one.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0.remove(CSRF_TOKEN_KEY);
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(session_write_error)
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let id = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(session_read_error)?;
        match id {
            Some(raw) => match UserId::new(raw) {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    warn!("invalid user id in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop every value and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Return the session's CSRF token, issuing one on first use.
    pub fn csrf_token(&self) -> Result<String, Error> {
        if let Some(token) = self
            .0
            .get::<String>(CSRF_TOKEN_KEY)
            .map_err(session_read_error)?
        {
            return Ok(token);
        }
        let mut bytes = [0_u8; CSRF_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.0
            .insert(CSRF_TOKEN_KEY, &token)
            .map_err(session_write_error)?;
        Ok(token)
    }

    /// Queue a message for the next page model.
    pub fn set_flash(&self, message: impl Into<String>) -> Result<(), Error> {
        self.0
            .insert(FLASH_KEY, message.into())
            .map_err(session_write_error)
    }

    /// Take the queued flash message, clearing it.
    pub fn take_flash(&self) -> Result<Option<String>, Error> {
        let message = self.0.get::<String>(FLASH_KEY).map_err(session_read_error)?;
        if message.is_some() {
            self.0.remove(FLASH_KEY);
        }
        Ok(message)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
