//! Password reset handlers.
//!
//! ```text
//! GET  /reset-password           page model
//! POST /reset-password           {"email":"ada@example.com"}
//! GET  /reset-password/{token}   new-password page model
//! POST /new-password             {"password":"abc123","passwordToken":"<64 hex>"}
//! ```
//!
//! Token failures are flashed as well as returned, so the next page model
//! can show them.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::ResetRequestOutcome;
use crate::domain::{
    AuthValidationError, EmailAddress, Error, ErrorCode, NewPasswordRequest, ResetToken,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::pages::{PageContext, see_other};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::auth_validation_error;

/// Flash shown when a reset is requested for an unknown address.
pub const UNKNOWN_EMAIL_FLASH: &str = "No account with that email was found";

/// Reset request page model.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPage {
    pub csrf_token: String,
    pub error_message: Option<String>,
}

/// Reset request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub email: String,
}

/// New-password page model shown for a valid reset link.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordPage {
    pub csrf_token: String,
    pub error_message: Option<String>,
    pub user_id: String,
    /// Echo of the token, posted back with the new password.
    pub password_token: String,
}

/// New-password request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordForm {
    pub password: String,
    pub password_token: String,
}

fn flash_token_failure(session: &SessionContext, error: Error) -> Error {
    let is_token_failure = error.code() == ErrorCode::InvalidRequest
        && error
            .details()
            .and_then(|details| details.get("code"))
            .and_then(serde_json::Value::as_str)
            == Some(AuthValidationError::MalformedResetToken.code());
    if !is_token_failure {
        return error;
    }
    match session.set_flash(error.message()) {
        Ok(()) => error,
        Err(flash_error) => flash_error,
    }
}

#[utoipa::path(
    get,
    path = "/reset-password",
    responses((status = 200, description = "Reset request page model", body = ResetPasswordPage)),
    tags = ["password-reset"],
    operation_id = "resetPasswordPage",
    security([])
)]
#[get("/reset-password")]
pub async fn reset_password_page(
    session: SessionContext,
) -> ApiResult<web::Json<ResetPasswordPage>> {
    let context = PageContext::from_session(&session)?;
    Ok(web::Json(ResetPasswordPage {
        csrf_token: context.csrf_token,
        error_message: context.error_message,
    }))
}

/// Email a single-use reset link.
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordForm,
    responses(
        (status = 303, description = "Link sent (redirect to /) or unknown email (redirect to /reset-password)"),
        (status = 400, description = "Invalid email", body = Error),
        (status = 403, description = "Missing or wrong CSRF token", body = Error),
        (status = 503, description = "Store or mail provider unavailable", body = Error)
    ),
    tags = ["password-reset"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/reset-password")]
pub async fn request_reset(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ResetPasswordForm>,
) -> ApiResult<HttpResponse> {
    let email = EmailAddress::new(&payload.email)
        .map_err(|err| auth_validation_error(AuthValidationError::from(err)))?;
    match state.password_reset.request_reset(&email).await? {
        ResetRequestOutcome::Sent => Ok(see_other("/")),
        ResetRequestOutcome::UnknownEmail => {
            session.set_flash(UNKNOWN_EMAIL_FLASH)?;
            Ok(see_other("/reset-password"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/reset-password/{token}",
    params(("token" = String, Path, description = "Reset token from the emailed link")),
    responses(
        (status = 200, description = "New-password page model", body = NewPasswordPage),
        (status = 400, description = "Invalid or expired token", body = Error)
    ),
    tags = ["password-reset"],
    operation_id = "newPasswordPage",
    security([])
)]
#[get("/reset-password/{token}")]
pub async fn new_password_page(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NewPasswordPage>> {
    let raw = path.into_inner();
    let outcome = match ResetToken::parse(&raw) {
        Some(token) => state
            .password_reset
            .verify_token(&token)
            .await
            .map(|user_id| (user_id, token)),
        None => Err(auth_validation_error(
            AuthValidationError::MalformedResetToken,
        )),
    };
    let (user_id, token) = outcome.map_err(|err| flash_token_failure(&session, err))?;
    let context = PageContext::from_session(&session)?;
    Ok(web::Json(NewPasswordPage {
        csrf_token: context.csrf_token,
        error_message: context.error_message,
        user_id: user_id.to_string(),
        password_token: token.as_str().to_owned(),
    }))
}

/// Replace the password and invalidate the token.
#[utoipa::path(
    post,
    path = "/new-password",
    request_body = NewPasswordForm,
    responses(
        (status = 303, description = "Password replaced; redirect to /login"),
        (status = 400, description = "Invalid password or invalid/expired token", body = Error),
        (status = 403, description = "Missing or wrong CSRF token", body = Error)
    ),
    tags = ["password-reset"],
    operation_id = "completePasswordReset",
    security([])
)]
#[post("/new-password")]
pub async fn new_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NewPasswordForm>,
) -> ApiResult<HttpResponse> {
    let NewPasswordForm {
        password,
        password_token,
    } = payload.into_inner();
    let outcome = match NewPasswordRequest::try_from_parts(&password_token, &password) {
        Ok(request) => state.password_reset.complete_reset(&request).await,
        Err(err) => Err(auth_validation_error(err)),
    };
    outcome.map_err(|err| flash_token_failure(&session, err))?;
    Ok(see_other("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_session_middleware};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use serde_json::{Value, json};

    fn test_app(
        ports: MockPorts,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(ports.into_state()))
            .wrap(test_session_middleware())
            .service(reset_password_page)
            .service(request_reset)
            .service(new_password_page)
            .service(new_password)
    }

    fn invalid_token() -> Error {
        auth_validation_error(AuthValidationError::MalformedResetToken)
    }

    #[actix_web::test]
    async fn unknown_email_flashes_and_returns_to_form() {
        let mut ports = MockPorts::default();
        ports
            .password_reset
            .expect_request_reset()
            .returning(|_| Ok(ResetRequestOutcome::UnknownEmail));
        let app = test::init_service(test_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/reset-password")
                .set_json(json!({ "email": "ghost@example.com" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/reset-password")
        );
        let cookie = session_cookie(&response).expect("flash cookie");

        let page = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/reset-password")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let page: ResetPasswordPage = test::read_body_json(page).await;
        assert_eq!(page.error_message.as_deref(), Some(UNKNOWN_EMAIL_FLASH));
    }

    #[actix_web::test]
    async fn sent_link_redirects_home() {
        let mut ports = MockPorts::default();
        ports
            .password_reset
            .expect_request_reset()
            .returning(|_| Ok(ResetRequestOutcome::Sent));
        let app = test::init_service(test_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/reset-password")
                .set_json(json!({ "email": "ada@example.com" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[actix_web::test]
    async fn valid_token_renders_new_password_page() {
        let token = ResetToken::generate();
        let user_id = UserId::random();
        let mut ports = MockPorts::default();
        ports
            .password_reset
            .expect_verify_token()
            .returning(move |_| Ok(user_id));
        let app = test::init_service(test_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/reset-password/{}", token.as_str()))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page: NewPasswordPage = test::read_body_json(response).await;
        assert_eq!(page.user_id, user_id.to_string());
        assert_eq!(page.password_token, token.as_str());
    }

    #[actix_web::test]
    async fn malformed_token_is_rejected_without_lookup() {
        let app = test::init_service(test_app(MockPorts::default())).await;
        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/reset-password/not-a-token")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie(&response).is_some(), "failure is flashed");
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["details"]["code"], "invalid_or_expired_token");
    }

    #[actix_web::test]
    async fn expired_token_on_submit_is_rejected() {
        let mut ports = MockPorts::default();
        ports
            .password_reset
            .expect_complete_reset()
            .returning(|_| Err(invalid_token()));
        let app = test::init_service(test_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/new-password")
                .set_json(json!({
                    "password": "newpass1",
                    "passwordToken": ResetToken::generate().as_str(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn completed_reset_redirects_to_login() {
        let mut ports = MockPorts::default();
        ports
            .password_reset
            .expect_complete_reset()
            .times(1)
            .returning(|_| Ok(()));
        let app = test::init_service(test_app(ports)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/new-password")
                .set_json(json!({
                    "password": "newpass1",
                    "passwordToken": ResetToken::generate().as_str(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
