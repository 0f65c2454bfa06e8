//! PostgreSQL-backed `CountryRepository` implementation using Diesel ORM.
//!
//! Statistic records live in the append-only `country_statistics` table.
//! Appending inserts one row and adjusts the population in the same
//! transaction, so concurrent submissions never overwrite each other.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{CountryPersistenceError, CountryRepository};
use crate::domain::{
    Channel, Country, CountryId, CountrySummary, NewStatisticRecord, StatisticRecord, UserId,
};

use super::error_mapping::{country_diesel_error, country_pool_error};
use super::models::{CountryRow, NewStatisticRow, StatisticRow};
use super::pool::DbPool;
use super::schema::{countries, country_statistics};

/// Diesel-backed implementation of the country repository port.
#[derive(Clone)]
pub struct DieselCountryRepository {
    pool: DbPool,
}

impl DieselCountryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

type CountryRows = (CountryRow, Vec<StatisticRow>);

#[derive(Debug)]
enum AppendError {
    Diesel(DieselError),
    Missing,
    Overflow,
}

impl From<DieselError> for AppendError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

async fn load_rows(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<CountryRows>, DieselError> {
    let Some(country) = countries::table
        .filter(countries::id.eq(id))
        .select(CountryRow::as_select())
        .first::<CountryRow>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let records = country_statistics::table
        .filter(country_statistics::country_id.eq(id))
        .order(country_statistics::id.asc())
        .select(StatisticRow::as_select())
        .load::<StatisticRow>(conn)
        .await?;
    Ok(Some((country, records)))
}

fn rows_to_country(rows: CountryRows) -> Result<Country, CountryPersistenceError> {
    let (row, records) = rows;
    let mut series: [Vec<StatisticRecord>; 4] = Default::default();
    for record in records {
        let channel: Channel = record
            .channel
            .parse()
            .map_err(|err| CountryPersistenceError::query(format!("{err}")))?;
        series[slot(channel)].push(StatisticRecord {
            amount: record.amount,
            day: record.recorded_at,
        });
    }

    let mut country = Country::new(CountryId::from_uuid(row.id), row.name, row.population);
    if let Some(admin) = row.admin_user_id {
        country = country.with_admin(UserId::from_uuid(admin));
    }
    for (channel, records) in Channel::ALL.into_iter().zip(series) {
        country = country.with_series(channel, records);
    }
    Ok(country)
}

/// Index of `channel` within [`Channel::ALL`].
fn slot(channel: Channel) -> usize {
    match channel {
        Channel::Cases => 0,
        Channel::Deaths => 1,
        Channel::Recoveries => 2,
        Channel::Tests => 3,
    }
}

#[async_trait]
impl CountryRepository for DieselCountryRepository {
    async fn find_by_id(&self, id: &CountryId) -> Result<Option<Country>, CountryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(country_pool_error)?;
        let rows = load_rows(&mut conn, *id.as_uuid())
            .await
            .map_err(country_diesel_error)?;
        rows.map(rows_to_country).transpose()
    }

    async fn list_unclaimed(&self) -> Result<Vec<CountrySummary>, CountryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(country_pool_error)?;
        let rows: Vec<(Uuid, String)> = countries::table
            .filter(countries::admin_user_id.is_null())
            .order(countries::name.asc())
            .select((countries::id, countries::name))
            .load(&mut conn)
            .await
            .map_err(country_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| CountrySummary {
                id: CountryId::from_uuid(id),
                name,
            })
            .collect())
    }

    async fn append_record(
        &self,
        id: &CountryId,
        record: &NewStatisticRecord,
    ) -> Result<Country, CountryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(country_pool_error)?;
        let country_id = *id.as_uuid();
        let row = NewStatisticRow {
            country_id,
            channel: record.channel.as_str(),
            amount: record.amount.get(),
            recorded_at: record.day,
        };

        // The row lock taken here serialises appends to one country.
        let rows = conn
            .transaction::<_, AppendError, _>(|conn| {
                async move {
                    let population = countries::table
                        .filter(countries::id.eq(country_id))
                        .select(countries::population)
                        .for_update()
                        .first::<i64>(conn)
                        .await
                        .optional()?
                        .ok_or(AppendError::Missing)?;
                    let adjusted = record
                        .adjust_population(population)
                        .map_err(|_| AppendError::Overflow)?;
                    if adjusted != population {
                        diesel::update(countries::table.filter(countries::id.eq(country_id)))
                            .set(countries::population.eq(adjusted))
                            .execute(conn)
                            .await?;
                    }
                    diesel::insert_into(country_statistics::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    load_rows(conn, country_id)
                        .await?
                        .ok_or(AppendError::Missing)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| match err {
                AppendError::Missing => CountryPersistenceError::not_found(id.to_string()),
                AppendError::Overflow => {
                    CountryPersistenceError::population_overflow(id.to_string())
                }
                AppendError::Diesel(error) => country_diesel_error(error),
            })?;
        rows_to_country(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn stat(channel: &str, amount: i64) -> StatisticRow {
        StatisticRow {
            channel: channel.into(),
            amount,
            recorded_at: Utc::now(),
        }
    }

    #[rstest]
    fn rows_are_grouped_by_channel_in_order() {
        let admin = Uuid::new_v4();
        let row = CountryRow {
            id: Uuid::new_v4(),
            name: "Japan".into(),
            population: 1_000,
            admin_user_id: Some(admin),
        };
        let records = vec![
            stat("cases", 5),
            stat("deaths", 1),
            stat("cases", 7),
            stat("tests", 40),
        ];

        let country = rows_to_country((row, records)).expect("valid rows");

        let cases: Vec<i64> = country
            .series(Channel::Cases)
            .iter()
            .map(|record| record.amount)
            .collect();
        assert_eq!(cases, vec![5, 7]);
        assert_eq!(country.series(Channel::Deaths).len(), 1);
        assert!(country.series(Channel::Recoveries).is_empty());
        assert_eq!(country.population(), 1_000);
        assert!(country.is_administered_by(&UserId::from_uuid(admin)));
    }

    #[rstest]
    fn unknown_channel_is_query_error() {
        let row = CountryRow {
            id: Uuid::new_v4(),
            name: "Japan".into(),
            population: 1_000,
            admin_user_id: None,
        };
        assert!(matches!(
            rows_to_country((row, vec![stat("vaccinations", 1)])),
            Err(CountryPersistenceError::Query { .. })
        ));
    }
}
