//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;

use crate::domain::ports::{
    MockCountryReportService, MockCountryStatisticsCommand, MockCountryStatisticsQuery,
    MockLoginService, MockPasswordResetService, MockSignupService,
};

use super::state::HttpState;

/// Build a session middleware configured for tests.
///
/// Generates a fresh key per invocation and disables the `Secure` flag for
/// local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mock ports with no expectations; tests add the ones they need.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub signup: MockSignupService,
    pub password_reset: MockPasswordResetService,
    pub statistics_query: MockCountryStatisticsQuery,
    pub statistics_command: MockCountryStatisticsCommand,
    pub reports: MockCountryReportService,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            signup: Arc::new(self.signup),
            password_reset: Arc::new(self.password_reset),
            statistics_query: Arc::new(self.statistics_query),
            statistics_command: Arc::new(self.statistics_command),
            reports: Arc::new(self.reports),
        }
    }
}

/// Session cookie set by `response`, if any.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}
