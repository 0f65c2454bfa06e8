//! Country statistics and report use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info};

use crate::domain::ports::{
    CountryPersistenceError, CountryReportService, CountryRepository, CountryStatisticsCommand,
    CountryStatisticsQuery, RenderedReport, ReportArchive, ReportRenderer,
};
use crate::domain::{
    Channel, ChannelOverview, Country, CountryId, CountryReport, DEFAULT_MOVING_AVERAGE_WINDOW,
    Error, NewStatisticRecord, RecordAmount, StatisticsError, UserId,
};

/// Country service implementing the statistics and report driving ports.
#[derive(Clone)]
pub struct CountryService<C> {
    countries: Arc<C>,
    renderer: Arc<dyn ReportRenderer>,
    archive: Arc<dyn ReportArchive>,
    clock: Arc<dyn Clock>,
}

impl<C> CountryService<C> {
    pub fn new(
        countries: Arc<C>,
        renderer: Arc<dyn ReportRenderer>,
        archive: Arc<dyn ReportArchive>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            countries,
            renderer,
            archive,
            clock,
        }
    }
}

fn country_not_found() -> Error {
    Error::not_found("country not found")
}

fn map_country_error(error: CountryPersistenceError) -> Error {
    match error {
        CountryPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("country repository unavailable: {message}"))
        }
        CountryPersistenceError::Query { message } => {
            Error::internal(format!("country repository error: {message}"))
        }
        CountryPersistenceError::NotFound { .. } => country_not_found(),
        CountryPersistenceError::PopulationOverflow { .. } => {
            Error::invalid_request("that amount would overflow the population").with_details(
                json!({
                    "field": "amount",
                    "code": "population_overflow",
                }),
            )
        }
    }
}

fn map_statistics_error(error: StatisticsError) -> Error {
    match error {
        StatisticsError::EmptyChannel { channel } => {
            Error::invalid_request(format!("no {channel} recorded yet")).with_details(json!({
                "channel": channel,
                "code": "empty_channel",
            }))
        }
        StatisticsError::ZeroTotal { channel } => {
            Error::invalid_request(format!("total {channel} is zero")).with_details(json!({
                "channel": channel,
                "code": "zero_total",
            }))
        }
        StatisticsError::Overflow { .. } => Error::internal(error.to_string()),
    }
}

impl<C> CountryService<C>
where
    C: CountryRepository,
{
    async fn load(&self, id: &CountryId) -> Result<Country, Error> {
        self.countries
            .find_by_id(id)
            .await
            .map_err(map_country_error)?
            .ok_or_else(country_not_found)
    }
}

fn overview(country: &Country, channel: Channel) -> Result<ChannelOverview, Error> {
    country
        .channel_overview(channel, DEFAULT_MOVING_AVERAGE_WINDOW)
        .map_err(map_statistics_error)
}

#[async_trait]
impl<C> CountryStatisticsQuery for CountryService<C>
where
    C: CountryRepository,
{
    async fn channel_overview(
        &self,
        country_id: &CountryId,
        channel: Channel,
    ) -> Result<ChannelOverview, Error> {
        let country = self.load(country_id).await?;
        overview(&country, channel)
    }
}

#[async_trait]
impl<C> CountryStatisticsCommand for CountryService<C>
where
    C: CountryRepository,
{
    async fn record(
        &self,
        country_id: &CountryId,
        channel: Channel,
        amount: RecordAmount,
    ) -> Result<ChannelOverview, Error> {
        let record = NewStatisticRecord {
            channel,
            amount,
            day: self.clock.utc(),
        };
        let country = self
            .countries
            .append_record(country_id, &record)
            .await
            .map_err(map_country_error)?;
        info!(%country_id, %channel, amount = amount.get(), "statistic recorded");
        overview(&country, channel)
    }
}

#[async_trait]
impl<C> CountryReportService for CountryService<C>
where
    C: CountryRepository,
{
    async fn generate(
        &self,
        requester: &UserId,
        country_id: &CountryId,
    ) -> Result<RenderedReport, Error> {
        let country = self.load(country_id).await?;
        if !country.is_administered_by(requester) {
            return Err(Error::forbidden(
                "only the country's administrator can download its report",
            ));
        }

        let report = CountryReport::from_country(&country).map_err(map_statistics_error)?;
        let bytes = self
            .renderer
            .render(&report)
            .map_err(|err| Error::internal(err.to_string()))?;
        let file_name = report.file_name();
        self.archive
            .store(&file_name, &bytes)
            .await
            .map_err(|err| {
                error!(%country_id, error = %err, "report archive failed");
                Error::internal(err.to_string())
            })?;
        Ok(RenderedReport { file_name, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockCountryRepository, MockReportArchive, MockReportRenderer, ReportArchiveError,
    };
    use crate::domain::{ErrorCode, StatisticRecord};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[fixture]
    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 5, 4, 18, 30, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    fn service(
        countries: MockCountryRepository,
        renderer: MockReportRenderer,
        archive: MockReportArchive,
        now: DateTime<Utc>,
    ) -> CountryService<MockCountryRepository> {
        CountryService::new(
            Arc::new(countries),
            Arc::new(renderer),
            Arc::new(archive),
            Arc::new(FixtureClock(now)),
        )
    }

    fn country_with_cases(owner: UserId, amounts: &[i64]) -> Country {
        let records = amounts
            .iter()
            .map(|amount| StatisticRecord {
                amount: *amount,
                day: Utc::now(),
            })
            .collect();
        Country::new(CountryId::random(), "Chile", 19_000_000)
            .with_admin(owner)
            .with_series(Channel::Cases, records)
    }

    #[rstest]
    #[tokio::test]
    async fn overview_for_missing_country_is_not_found(today: DateTime<Utc>) {
        let mut countries = MockCountryRepository::new();
        countries.expect_find_by_id().return_once(|_| Ok(None));

        let err = service(
            countries,
            MockReportRenderer::new(),
            MockReportArchive::new(),
            today,
        )
        .channel_overview(&CountryId::random(), Channel::Tests)
        .await
        .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn record_stamps_clock_time(today: DateTime<Utc>) {
        let owner = UserId::random();
        let mut countries = MockCountryRepository::new();
        countries
            .expect_append_record()
            .withf(move |_, record| {
                record.day == today && record.channel == Channel::Deaths && record.amount.get() == 3
            })
            .times(1)
            .returning(move |_, record| {
                let mut country = country_with_cases(owner, &[10]);
                country.append(record).expect("append");
                Ok(country)
            });

        let page = service(
            countries,
            MockReportRenderer::new(),
            MockReportArchive::new(),
            today,
        )
        .record(
            &CountryId::random(),
            Channel::Deaths,
            RecordAmount::new(3).expect("positive"),
        )
        .await
        .expect("recorded");
        assert_eq!(page.total, 3);
        assert_eq!(page.population, 19_000_000 - 3);
        assert_eq!(page.active_cases, 7);
    }

    #[rstest]
    #[tokio::test]
    async fn population_overflow_is_invalid_request(today: DateTime<Utc>) {
        let mut countries = MockCountryRepository::new();
        countries
            .expect_append_record()
            .returning(|id, _| Err(CountryPersistenceError::population_overflow(id.to_string())));

        let err = service(
            countries,
            MockReportRenderer::new(),
            MockReportArchive::new(),
            today,
        )
        .record(
            &CountryId::random(),
            Channel::Deaths,
            RecordAmount::new(i64::MAX).expect("positive"),
        )
        .await
        .expect_err("overflow");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
            Some("population_overflow")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn record_on_unknown_country_is_not_found(today: DateTime<Utc>) {
        let mut countries = MockCountryRepository::new();
        countries
            .expect_append_record()
            .returning(|id, _| Err(CountryPersistenceError::not_found(id.to_string())));

        let err = service(
            countries,
            MockReportRenderer::new(),
            MockReportArchive::new(),
            today,
        )
        .record(
            &CountryId::random(),
            Channel::Cases,
            RecordAmount::new(1).expect("positive"),
        )
        .await
        .expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn report_is_rendered_archived_and_returned(today: DateTime<Utc>) {
        let owner = UserId::random();
        let country = country_with_cases(owner, &[100, 150]);
        let country_id = *country.id();
        let expected_name = format!("invoice-{country_id}.pdf");

        let mut countries = MockCountryRepository::new();
        countries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(country)));
        let mut renderer = MockReportRenderer::new();
        renderer
            .expect_render()
            .withf(|report| report.lines()[2] == "New cases today: 150")
            .returning(|_| Ok(b"%PDF-1.3".to_vec()));
        let mut archive = MockReportArchive::new();
        let archived_name = expected_name.clone();
        archive
            .expect_store()
            .withf(move |name, bytes| name == archived_name && bytes.starts_with(b"%PDF"))
            .times(1)
            .returning(|_, _| Ok(()));

        let rendered = service(countries, renderer, archive, today)
            .generate(&owner, &country_id)
            .await
            .expect("report");
        assert_eq!(rendered.file_name, expected_name);
        assert_eq!(rendered.bytes, b"%PDF-1.3".to_vec());
    }

    #[rstest]
    #[tokio::test]
    async fn report_is_owner_only(today: DateTime<Utc>) {
        let country = country_with_cases(UserId::random(), &[5]);
        let country_id = *country.id();
        let mut countries = MockCountryRepository::new();
        countries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(country)));
        let mut renderer = MockReportRenderer::new();
        renderer.expect_render().never();

        let err = service(countries, renderer, MockReportArchive::new(), today)
            .generate(&UserId::random(), &country_id)
            .await
            .expect_err("not owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn report_without_cases_is_invalid_request(today: DateTime<Utc>) {
        let owner = UserId::random();
        let country = country_with_cases(owner, &[]);
        let country_id = *country.id();
        let mut countries = MockCountryRepository::new();
        countries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(country)));

        let err = service(
            countries,
            MockReportRenderer::new(),
            MockReportArchive::new(),
            today,
        )
        .generate(&owner, &country_id)
        .await
        .expect_err("no cases");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "no cases recorded yet");
    }

    #[rstest]
    #[tokio::test]
    async fn archive_failure_is_internal(today: DateTime<Utc>) {
        let owner = UserId::random();
        let country = country_with_cases(owner, &[5]);
        let country_id = *country.id();
        let mut countries = MockCountryRepository::new();
        countries
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(country)));
        let mut renderer = MockReportRenderer::new();
        renderer.expect_render().returning(|_| Ok(vec![1, 2, 3]));
        let mut archive = MockReportArchive::new();
        archive
            .expect_store()
            .returning(|name, _| Err(ReportArchiveError::write(name, "disk full")));

        let err = service(countries, renderer, archive, today)
            .generate(&owner, &country_id)
            .await
            .expect_err("archive failed");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
