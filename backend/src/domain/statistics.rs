//! Aggregations over a country's statistic channels.
//!
//! All arithmetic is checked. Empty channels are reported explicitly rather
//! than producing a sentinel, except where a zero result is well defined
//! (`active_cases`, `moving_average`).

use serde::Serialize;
use utoipa::ToSchema;

use super::{Channel, Country, StatisticRecord};

/// Window used for channel page moving averages.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

/// Failures raised by channel aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatisticsError {
    #[error("no {channel} recorded yet")]
    EmptyChannel { channel: Channel },
    #[error("total {channel} is zero")]
    ZeroTotal { channel: Channel },
    #[error("{channel} aggregation overflowed")]
    Overflow { channel: Channel },
}

impl Country {
    /// Sum of amounts on `channel`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use covid_tracker::domain::{Channel, Country, CountryId, NewStatisticRecord, RecordAmount};
    ///
    /// let mut country = Country::new(CountryId::random(), "Malta", 500_000);
    /// for amount in [10, 5] {
    ///     country.append(&NewStatisticRecord {
    ///         channel: Channel::Cases,
    ///         amount: RecordAmount::new(amount).unwrap(),
    ///         day: Utc::now(),
    ///     }).unwrap();
    /// }
    /// assert_eq!(country.total(Channel::Cases), Ok(15));
    /// ```
    pub fn total(&self, channel: Channel) -> Result<i64, StatisticsError> {
        let series = self.series(channel);
        if series.is_empty() {
            return Err(StatisticsError::EmptyChannel { channel });
        }
        sum(series, channel)
    }

    /// `floor(population / total(channel))`.
    pub fn per_million(&self, channel: Channel) -> Result<i64, StatisticsError> {
        let total = self.total(channel)?;
        if total == 0 {
            return Err(StatisticsError::ZeroTotal { channel });
        }
        floor_div(self.population(), total).ok_or(StatisticsError::Overflow { channel })
    }

    /// Cases minus deaths minus recoveries. Empty channels count as zero.
    pub fn active_cases(&self) -> Result<i64, StatisticsError> {
        let cases = sum(self.series(Channel::Cases), Channel::Cases)?;
        let deaths = sum(self.series(Channel::Deaths), Channel::Deaths)?;
        let recoveries = sum(self.series(Channel::Recoveries), Channel::Recoveries)?;
        cases
            .checked_sub(deaths)
            .and_then(|value| value.checked_sub(recoveries))
            .ok_or(StatisticsError::Overflow {
                channel: Channel::Cases,
            })
    }

    /// Mean of the last `min(window, len)` amounts, truncated toward zero.
    ///
    /// Returns 0 for an empty channel or a zero window.
    pub fn moving_average(&self, channel: Channel, window: usize) -> Result<i64, StatisticsError> {
        let series = self.series(channel);
        let taken = window.min(series.len());
        if taken == 0 {
            return Ok(0);
        }
        let recent = &series[series.len() - taken..];
        let total = sum(recent, channel)?;
        let count = i64::try_from(taken).map_err(|_| StatisticsError::Overflow { channel })?;
        Ok(total / count)
    }

    /// Most recently appended record on `channel`.
    pub fn latest(&self, channel: Channel) -> Result<&StatisticRecord, StatisticsError> {
        self.series(channel)
            .last()
            .ok_or(StatisticsError::EmptyChannel { channel })
    }

    /// Aggregated figures for a channel page.
    pub fn channel_overview(
        &self,
        channel: Channel,
        window: usize,
    ) -> Result<ChannelOverview, StatisticsError> {
        let total = match self.total(channel) {
            Ok(total) => total,
            Err(StatisticsError::EmptyChannel { .. }) => 0,
            Err(other) => return Err(other),
        };
        let per_million = match self.per_million(channel) {
            Ok(value) => Some(value),
            Err(StatisticsError::EmptyChannel { .. } | StatisticsError::ZeroTotal { .. }) => None,
            Err(other) => return Err(other),
        };
        Ok(ChannelOverview {
            country_id: self.id().to_string(),
            country_name: self.name().to_owned(),
            population: self.population(),
            channel,
            records: self.series(channel).to_vec(),
            total,
            per_million,
            active_cases: self.active_cases()?,
            moving_average: self.moving_average(channel, window)?,
            moving_average_window: window,
            latest: self.latest(channel).ok().copied(),
        })
    }
}

fn sum(records: &[StatisticRecord], channel: Channel) -> Result<i64, StatisticsError> {
    records.iter().try_fold(0_i64, |acc, record| {
        acc.checked_add(record.amount)
            .ok_or(StatisticsError::Overflow { channel })
    })
}

fn floor_div(numerator: i64, denominator: i64) -> Option<i64> {
    let quotient = numerator.checked_div(denominator)?;
    let remainder = numerator.checked_rem(denominator)?;
    if remainder != 0 && ((remainder < 0) != (denominator < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Channel page view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOverview {
    pub country_id: String,
    pub country_name: String,
    pub population: i64,
    pub channel: Channel,
    pub records: Vec<StatisticRecord>,
    pub total: i64,
    /// Absent while the channel has no records.
    pub per_million: Option<i64>,
    pub active_cases: i64,
    pub moving_average: i64,
    pub moving_average_window: usize,
    pub latest: Option<StatisticRecord>,
}
