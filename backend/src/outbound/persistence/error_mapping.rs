//! Diesel and pool error mapping shared by the repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{CountryPersistenceError, UserPersistenceError};

use super::pool::PoolError;

const USERS_EMAIL_KEY: &str = "users_email_key";
const USERS_COUNTRY_KEY: &str = "users_country_id_key";

/// Coarse classification of a Diesel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection(&'static str),
    Query(&'static str),
    UniqueViolation { constraint: Option<String> },
}

pub(crate) fn classify(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        _ => DieselFailure::Query("database error"),
    }
}

pub(crate) fn user_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.message())
}

pub(crate) fn country_pool_error(error: PoolError) -> CountryPersistenceError {
    CountryPersistenceError::connection(error.message())
}

pub(crate) fn user_diesel_error(error: DieselError) -> UserPersistenceError {
    match classify(error) {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
        DieselFailure::UniqueViolation { constraint } => match constraint.as_deref() {
            Some(USERS_EMAIL_KEY) => UserPersistenceError::email_taken("email"),
            Some(USERS_COUNTRY_KEY) => UserPersistenceError::country_unavailable("country"),
            _ => UserPersistenceError::query("unique constraint violated"),
        },
    }
}

pub(crate) fn country_diesel_error(error: DieselError) -> CountryPersistenceError {
    match classify(error) {
        DieselFailure::Connection(message) => CountryPersistenceError::connection(message),
        DieselFailure::Query(message) => CountryPersistenceError::query(message),
        DieselFailure::UniqueViolation { .. } => {
            CountryPersistenceError::query("unique constraint violated")
        }
    }
}
