//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CountryReportService, CountryStatisticsCommand, CountryStatisticsQuery, LoginService,
    PasswordResetService, SignupService,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use covid_tracker::domain::ports::{
///     CountryReportService, CountryStatisticsCommand, CountryStatisticsQuery, LoginService,
///     PasswordResetService, SignupService,
/// };
/// use covid_tracker::inbound::http::state::HttpState;
///
/// fn build<T>(service: Arc<T>) -> HttpState
/// where
///     T: LoginService
///         + SignupService
///         + PasswordResetService
///         + CountryStatisticsQuery
///         + CountryStatisticsCommand
///         + CountryReportService
///         + 'static,
/// {
///     HttpState {
///         login: service.clone(),
///         signup: service.clone(),
///         password_reset: service.clone(),
///         statistics_query: service.clone(),
///         statistics_command: service.clone(),
///         reports: service,
///     }
/// }
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub signup: Arc<dyn SignupService>,
    pub password_reset: Arc<dyn PasswordResetService>,
    pub statistics_query: Arc<dyn CountryStatisticsQuery>,
    pub statistics_command: Arc<dyn CountryStatisticsCommand>,
    pub reports: Arc<dyn CountryReportService>,
}
