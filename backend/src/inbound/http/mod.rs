//! HTTP inbound adapter.
//!
//! Handlers answer with JSON page models; successful form posts answer
//! `303 See Other`. [`configure`] registers every route except the health
//! probes, which live outside the session scope.

pub mod auth;
pub mod countries;
pub mod error;
pub mod health;
pub mod identity;
mod pages;
pub mod password_reset;
pub mod reports;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register the session-backed routes.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use covid_tracker::inbound::http::configure;
///
/// let _app = App::new().service(web::scope("").configure(configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login_page)
        .service(auth::login)
        .service(auth::signup_page)
        .service(auth::signup)
        .service(auth::logout)
        .service(password_reset::reset_password_page)
        .service(password_reset::request_reset)
        .service(password_reset::new_password_page)
        .service(password_reset::new_password)
        .service(reports::download_report)
        .service(countries::channel_page_handler)
        .service(countries::record_statistic);
}
