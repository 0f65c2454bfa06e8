//! Domain primitives, aggregates and services.
//!
//! Purpose: model countries, their statistic channels and the user accounts
//! administering them, independent of HTTP and storage. Adapters reach the
//! domain through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Country / Channel / StatisticRecord: the statistics aggregate.
//! - User / EmailAddress / PasswordHash: account identity.
//! - AccountService / CountryService: use-case implementations.

pub mod account_service;
pub mod auth;
pub mod country;
pub mod country_service;
pub mod error;
pub mod ports;
pub mod report;
pub mod reset_token;
pub mod statistics;
pub mod trace_id;
pub mod user;

pub use self::account_service::{AccountService, AccountServiceConfig};
pub use self::auth::{
    AuthValidationError, LoginCredentials, NewPasswordRequest, PASSWORD_MAX, PASSWORD_MIN,
    Password, SignupRequest,
};
pub use self::country::{
    Channel, Country, CountryId, CountrySummary, InvalidAmount, NewStatisticRecord,
    RecordAmount, StatisticRecord, UnknownChannel,
};
pub use self::country_service::CountryService;
pub use self::error::{Error, ErrorCode};
pub use self::report::CountryReport;
pub use self::reset_token::{RESET_TOKEN_TTL_MINUTES, ResetGrant, ResetToken, ResetTokenDigest};
pub use self::statistics::{ChannelOverview, DEFAULT_MOVING_AVERAGE_WINDOW, StatisticsError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EMAIL_MAX, EmailAddress, PasswordHash, User, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use covid_tracker::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
