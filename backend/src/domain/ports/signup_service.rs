//! Driving port for account registration.

use async_trait::async_trait;

use crate::domain::{CountrySummary, Error, SignupRequest, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignupService: Send + Sync {
    /// Countries still available to claim.
    async fn unclaimed_countries(&self) -> Result<Vec<CountrySummary>, Error>;

    /// Create an account administering the requested country.
    async fn register(&self, request: &SignupRequest) -> Result<User, Error>;
}
