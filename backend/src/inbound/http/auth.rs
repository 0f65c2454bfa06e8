//! Login, signup and logout handlers.
//!
//! ```text
//! GET  /login    page model
//! POST /login    {"email":"ada@example.com","password":"abc123"}
//! GET  /signup   page model listing unclaimed countries
//! POST /signup   {"email":..,"password":..,"country":"<uuid>"}
//! POST /logout
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CountryId, CountrySummary, Error, LoginCredentials, SignupRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::{PageContext, see_other};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, auth_validation_error, parse_uuid};

/// Login page model.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPage {
    pub csrf_token: String,
    pub error_message: Option<String>,
    pub is_authenticated: bool,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup page model.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupPage {
    pub csrf_token: String,
    pub error_message: Option<String>,
    /// Countries nobody administers yet.
    pub countries: Vec<CountrySummary>,
}

/// Signup request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    /// Identifier of the country to administer.
    pub country: String,
}

#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login page model", body = LoginPage)),
    tags = ["auth"],
    operation_id = "loginPage",
    security([])
)]
#[get("/login")]
pub async fn login_page(session: SessionContext) -> ApiResult<web::Json<LoginPage>> {
    let context = PageContext::from_session(&session)?;
    Ok(web::Json(LoginPage {
        csrf_token: context.csrf_token,
        error_message: context.error_message,
        is_authenticated: session.user_id()?.is_some(),
    }))
}

/// Authenticate and start a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Logged in; redirect to /", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 403, description = "Missing or wrong CSRF token", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(auth_validation_error)?;
    let user = state.login.authenticate(&credentials).await?;
    session.persist_user(user.id())?;
    Ok(see_other("/"))
}

#[utoipa::path(
    get,
    path = "/signup",
    responses(
        (status = 200, description = "Signup page model", body = SignupPage),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signupPage",
    security([])
)]
#[get("/signup")]
pub async fn signup_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SignupPage>> {
    let countries = state.signup.unclaimed_countries().await?;
    let context = PageContext::from_session(&session)?;
    Ok(web::Json(SignupPage {
        csrf_token: context.csrf_token,
        error_message: context.error_message,
        countries,
    }))
}

/// Create an account that administers the chosen country.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupForm,
    responses(
        (status = 303, description = "Account created; redirect to /login"),
        (status = 400, description = "Invalid request, duplicate email or claimed country", body = Error),
        (status = 403, description = "Missing or wrong CSRF token", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupForm>,
) -> ApiResult<HttpResponse> {
    let SignupForm {
        email,
        password,
        country,
    } = payload.into_inner();
    let country_id = CountryId::from_uuid(parse_uuid(&country, FieldName::new("country"))?);
    let request = SignupRequest::try_from_parts(&email, &password, country_id)
        .map_err(auth_validation_error)?;
    let user = state.signup.register(&request).await?;
    info!(user_id = %user.id(), country_id = %user.country_id(), "account created");
    Ok(see_other("/login"))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session purged; redirect to /"),
        (status = 403, description = "Missing or wrong CSRF token", body = Error)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    see_other("/")
}
