//! Request-scoped identity extractor.
//!
//! The session only stores a user id. Each authenticated request re-reads
//! the user through [`LoginService::current_user`]; a session pointing at a
//! user that no longer exists is purged and answered with `401`.
//!
//! [`LoginService::current_user`]: crate::domain::ports::LoginService::current_user

use std::ops::Deref;

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::info;

use crate::domain::{Error, User};

use super::session::SessionContext;
use super::state::HttpState;

/// The user behind the current session, freshly loaded.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(User);

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl Deref for AuthenticatedUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let session = SessionContext::new(session.await.map_err(Error::from)?);
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let user_id = session.require_user_id()?;
            match state.login.current_user(&user_id).await? {
                Some(user) => Ok(Self(user)),
                None => {
                    info!(%user_id, "session refers to a missing user; purging");
                    session.purge();
                    Err(Error::unauthorized("login required"))
                }
            }
        })
    }
}
