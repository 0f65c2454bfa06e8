//! CSRF protection for state-changing requests.
//!
//! `POST`, `PUT`, `PATCH` and `DELETE` must send the session's CSRF token in
//! the `x-csrf-token` header. Tokens are issued by the page-model handlers.
//! The middleware reads the session, so it must sit inside the session
//! middleware: `.wrap(CsrfProtection).wrap(session)`.

use std::task::{Context, Poll};

use actix_session::SessionExt as _;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{Error, ResponseError as _};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use subtle::ConstantTimeEq as _;
use tracing::warn;

use crate::domain::Error as DomainError;
use crate::inbound::http::session::CSRF_TOKEN_KEY;

/// Request header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Middleware factory rejecting unsafe requests without a matching token.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfProtection;

impl<S, B> Transform<S, ServiceRequest> for CsrfProtection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddleware { service }))
    }
}

/// Service wrapper produced by [`CsrfProtection`].
pub struct CsrfMiddleware<S> {
    service: S,
}

fn requires_token(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn tokens_match(expected: &str, presented: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
}

fn verify(req: &ServiceRequest) -> Result<(), DomainError> {
    let expected = req
        .get_session()
        .get::<String>(CSRF_TOKEN_KEY)
        .map_err(|err| DomainError::internal(format!("failed to read session: {err}")))?;
    let presented = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    match (expected, presented) {
        (Some(expected), Some(presented)) if tokens_match(&expected, presented) => Ok(()),
        _ => {
            warn!(path = %req.path(), "rejected request without a valid CSRF token");
            Err(DomainError::forbidden("invalid or missing CSRF token"))
        }
    }
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if requires_token(req.method()) {
            if let Err(error) = verify(&req) {
                let response = req.into_response(error.error_response());
                return Box::pin(async move { Ok(response.map_into_right_body()) });
            }
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
