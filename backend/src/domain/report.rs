//! Country case report content.

use super::{Channel, Country, CountryId, StatisticsError};

/// Text lines of a country case report, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryReport {
    country_id: CountryId,
    title: String,
    lines: Vec<String>,
}

impl CountryReport {
    /// Build the report for `country`.
    ///
    /// Fails with [`StatisticsError::EmptyChannel`] when no cases have been
    /// recorded, since the report leads with the latest case figure.
    pub fn from_country(country: &Country) -> Result<Self, StatisticsError> {
        let latest = country.latest(Channel::Cases)?.amount;
        let total = country.total(Channel::Cases)?;
        let per_million = country.per_million(Channel::Cases)?;
        let active = country.active_cases()?;
        Ok(Self {
            country_id: *country.id(),
            title: country.name().to_owned(),
            lines: vec![
                country.name().to_owned(),
                format!("Population: {}", country.population()),
                format!("New cases today: {latest}"),
                format!("Total cases: {total}"),
                format!("Cases per 1 million: {per_million}"),
                format!("Active cases: {active}"),
            ],
        })
    }

    pub fn country_id(&self) -> &CountryId {
        &self.country_id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Archive file name, `invoice-<countryId>.pdf`.
    pub fn file_name(&self) -> String {
        format!("invoice-{}.pdf", self.country_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatisticRecord;
    use chrono::Utc;
    use rstest::rstest;

    fn records(amounts: &[i64]) -> Vec<StatisticRecord> {
        amounts
            .iter()
            .map(|amount| StatisticRecord {
                amount: *amount,
                day: Utc::now(),
            })
            .collect()
    }

    #[rstest]
    fn report_lists_case_figures() {
        let country = Country::new(CountryId::random(), "Norway", 1_000_000)
            .with_series(Channel::Cases, records(&[200, 50]))
            .with_series(Channel::Deaths, records(&[10]))
            .with_series(Channel::Recoveries, records(&[20]));

        let report = CountryReport::from_country(&country).expect("report");

        assert_eq!(
            report.lines(),
            [
                "Norway",
                "Population: 1000000",
                "New cases today: 50",
                "Total cases: 250",
                "Cases per 1 million: 4000",
                "Active cases: 220",
            ]
        );
        assert_eq!(report.file_name(), format!("invoice-{}.pdf", country.id()));
    }

    #[rstest]
    fn report_requires_recorded_cases() {
        let country = Country::new(CountryId::random(), "Norway", 1_000_000);
        assert_eq!(
            CountryReport::from_country(&country),
            Err(StatisticsError::EmptyChannel {
                channel: Channel::Cases
            })
        );
    }
}
