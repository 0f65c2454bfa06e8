//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every page and form endpoint, the health probes,
//! their view models, and the session cookie security scheme. Swagger UI
//! serves it in debug builds.

use crate::domain::{
    Channel, ChannelOverview, CountrySummary, Error, ErrorCode, StatisticRecord,
};
use crate::inbound::http::auth::{LoginPage, LoginRequest, SignupForm, SignupPage};
use crate::inbound::http::countries::{ChannelPage, RecordForm};
use crate::inbound::http::password_reset::{
    NewPasswordForm, NewPasswordPage, ResetPasswordForm, ResetPasswordPage,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie issued by POST /login.",
            ))),
        );
    }
}

/// OpenAPI document for the tracker.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "COVID statistics tracker",
        description = "Country administrators record daily cases, deaths, recoveries and tests.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login_page,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::signup_page,
        crate::inbound::http::auth::signup,
        crate::inbound::http::auth::logout,
        crate::inbound::http::password_reset::reset_password_page,
        crate::inbound::http::password_reset::request_reset,
        crate::inbound::http::password_reset::new_password_page,
        crate::inbound::http::password_reset::new_password,
        crate::inbound::http::countries::channel_page_handler,
        crate::inbound::http::countries::record_statistic,
        crate::inbound::http::reports::download_report,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginPage,
        LoginRequest,
        SignupPage,
        SignupForm,
        ResetPasswordPage,
        ResetPasswordForm,
        NewPasswordPage,
        NewPasswordForm,
        ChannelPage,
        RecordForm,
        ChannelOverview,
        StatisticRecord,
        Channel,
        CountrySummary,
    )),
    tags(
        (name = "auth", description = "Login, signup and logout"),
        (name = "password-reset", description = "Emailed password reset flow"),
        (name = "statistics", description = "Per-channel statistics pages"),
        (name = "reports", description = "PDF country reports"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
