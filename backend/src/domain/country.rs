//! Country aggregate and its statistic channels.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{StatisticsError, UserId};

/// Named time series tracked for every country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Cases,
    Deaths,
    Recoveries,
    Tests,
}

impl Channel {
    /// Every channel in storage order.
    pub const ALL: [Channel; 4] = [
        Channel::Cases,
        Channel::Deaths,
        Channel::Recoveries,
        Channel::Tests,
    ];

    /// Lower-case wire and storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cases => "cases",
            Self::Deaths => "deaths",
            Self::Recoveries => "recoveries",
            Self::Tests => "tests",
        }
    }

    /// Whether recording on this channel lowers the country's population.
    pub const fn decrements_population(self) -> bool {
        matches!(self, Self::Deaths)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a [`Channel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown statistic channel: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_owned()))
    }
}

/// Stable country identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CountryId(Uuid);

impl CountryId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CountryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Single reported figure on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatisticRecord {
    pub amount: i64,
    pub day: DateTime<Utc>,
}

/// Raised when a submitted amount is not a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("amount must be a whole number of at least 1, got {0}")]
pub struct InvalidAmount(pub i64);

/// Validated amount for a new statistic record (always `>= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordAmount(i64);

impl RecordAmount {
    /// Validate a submitted amount.
    pub fn new(amount: i64) -> Result<Self, InvalidAmount> {
        if amount < 1 {
            return Err(InvalidAmount(amount));
        }
        Ok(Self(amount))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Statistic to append to a country's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewStatisticRecord {
    pub channel: Channel,
    pub amount: RecordAmount,
    pub day: DateTime<Utc>,
}

impl NewStatisticRecord {
    /// Population once this record is applied. Only deaths lower it, and the
    /// result is not clamped at zero.
    pub fn adjust_population(&self, population: i64) -> Result<i64, StatisticsError> {
        if !self.channel.decrements_population() {
            return Ok(population);
        }
        population
            .checked_sub(self.amount.get())
            .ok_or(StatisticsError::Overflow {
                channel: self.channel,
            })
    }

    pub fn record(&self) -> StatisticRecord {
        StatisticRecord {
            amount: self.amount.get(),
            day: self.day,
        }
    }
}

/// Identifier and display name of a country, used for signup choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountrySummary {
    pub id: CountryId,
    pub name: String,
}

/// Country aggregate with its four append-only statistic channels.
///
/// ## Invariants
/// - Records on each channel are kept in the order they were appended.
/// - `population` is lowered by every recorded death and may go negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    id: CountryId,
    name: String,
    population: i64,
    admin: Option<UserId>,
    cases: Vec<StatisticRecord>,
    deaths: Vec<StatisticRecord>,
    recoveries: Vec<StatisticRecord>,
    tests: Vec<StatisticRecord>,
}

impl Country {
    /// Build a country with empty channels and no administrator.
    pub fn new(id: CountryId, name: impl Into<String>, population: i64) -> Self {
        Self {
            id,
            name: name.into(),
            population,
            admin: None,
            cases: Vec::new(),
            deaths: Vec::new(),
            recoveries: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// Assign the administrating user.
    pub fn with_admin(mut self, admin: UserId) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Replace a channel's records without touching the population.
    ///
    /// Used by adapters rehydrating a stored country.
    pub fn with_series(mut self, channel: Channel, records: Vec<StatisticRecord>) -> Self {
        *self.series_mut(channel) = records;
        self
    }

    pub fn id(&self) -> &CountryId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn population(&self) -> i64 {
        self.population
    }

    pub fn admin(&self) -> Option<&UserId> {
        self.admin.as_ref()
    }

    /// Whether `user` administers this country.
    pub fn is_administered_by(&self, user: &UserId) -> bool {
        self.admin.as_ref() == Some(user)
    }

    /// Records on `channel`, oldest first.
    pub fn series(&self, channel: Channel) -> &[StatisticRecord] {
        match channel {
            Channel::Cases => &self.cases,
            Channel::Deaths => &self.deaths,
            Channel::Recoveries => &self.recoveries,
            Channel::Tests => &self.tests,
        }
    }

    fn series_mut(&mut self, channel: Channel) -> &mut Vec<StatisticRecord> {
        match channel {
            Channel::Cases => &mut self.cases,
            Channel::Deaths => &mut self.deaths,
            Channel::Recoveries => &mut self.recoveries,
            Channel::Tests => &mut self.tests,
        }
    }

    /// Append a record, lowering the population for deaths.
    ///
    /// Nothing changes when the population would overflow.
    pub fn append(&mut self, record: &NewStatisticRecord) -> Result<(), StatisticsError> {
        self.population = record.adjust_population(self.population)?;
        self.series_mut(record.channel).push(record.record());
        Ok(())
    }

    pub fn summary(&self) -> CountrySummary {
        CountrySummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}
