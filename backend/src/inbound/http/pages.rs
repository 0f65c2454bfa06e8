//! Pieces shared by page-model handlers: CSRF issue, flash pickup and
//! `303 See Other` redirects.

use actix_web::HttpResponse;
use actix_web::http::header;

use super::ApiResult;
use super::session::SessionContext;

/// Values every page model carries.
pub(crate) struct PageContext {
    pub csrf_token: String,
    pub error_message: Option<String>,
}

impl PageContext {
    /// Issue (or reuse) the CSRF token and consume any flash message.
    pub(crate) fn from_session(session: &SessionContext) -> ApiResult<Self> {
        Ok(Self {
            csrf_token: session.csrf_token()?,
            error_message: session.take_flash()?,
        })
    }
}

/// `303 See Other` pointing at `location`.
pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
