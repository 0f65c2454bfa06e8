//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, hasher, mailer, report storage) are
//! implemented under `outbound`; driving ports are implemented by the domain
//! services and called from `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod country_report_service;
mod country_repository;
mod country_statistics;
mod login_service;
mod mailer;
mod password_hasher;
mod password_reset_service;
mod report_renderer;
mod signup_service;
mod user_repository;

#[cfg(test)]
pub use country_report_service::MockCountryReportService;
pub use country_report_service::{CountryReportService, RenderedReport};
#[cfg(test)]
pub use country_repository::MockCountryRepository;
pub use country_repository::{CountryPersistenceError, CountryRepository};
#[cfg(test)]
pub use country_statistics::{MockCountryStatisticsCommand, MockCountryStatisticsQuery};
pub use country_statistics::{CountryStatisticsCommand, CountryStatisticsQuery};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{Mailer, MailerError, OutboundEmail};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use password_reset_service::MockPasswordResetService;
pub use password_reset_service::{PasswordResetService, ResetRequestOutcome};
#[cfg(test)]
pub use report_renderer::{MockReportArchive, MockReportRenderer};
pub use report_renderer::{
    ReportArchive, ReportArchiveError, ReportRenderError, ReportRenderer,
};
#[cfg(test)]
pub use signup_service::MockSignupService;
pub use signup_service::SignupService;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{NewAccount, UserPersistenceError, UserRepository};
