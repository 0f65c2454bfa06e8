//! Port abstraction for country persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Country, CountryId, CountrySummary, NewStatisticRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by country repository adapters.
    pub enum CountryPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "country repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "country repository query failed: {message}",
        /// The country does not exist.
        NotFound { country_id: String } => "country not found: {country_id}",
        /// Applying the record would overflow the stored population.
        PopulationOverflow { country_id: String } => "population of {country_id} would overflow",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryRepository: Send + Sync {
    /// Fetch a country with all four channels.
    async fn find_by_id(&self, id: &CountryId) -> Result<Option<Country>, CountryPersistenceError>;

    /// Countries without an administrator, ordered by name.
    async fn list_unclaimed(&self) -> Result<Vec<CountrySummary>, CountryPersistenceError>;

    /// Append one record atomically and return the updated country.
    ///
    /// Deaths lower the population in the same step.
    ///
    /// Fails with `PopulationOverflow`, writing nothing, when the record
    /// would push the population past the range of `i64`.
    async fn append_record(
        &self,
        id: &CountryId,
        record: &NewStatisticRecord,
    ) -> Result<Country, CountryPersistenceError>;
}
