//! Driving ports for reading and recording country statistics.

use async_trait::async_trait;

use crate::domain::{Channel, ChannelOverview, CountryId, Error, RecordAmount};

/// Read side of a channel page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryStatisticsQuery: Send + Sync {
    async fn channel_overview(
        &self,
        country_id: &CountryId,
        channel: Channel,
    ) -> Result<ChannelOverview, Error>;
}

/// Write side: append a figure to a channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryStatisticsCommand: Send + Sync {
    /// Record `amount` on `channel` for today and return the refreshed page.
    async fn record(
        &self,
        country_id: &CountryId,
        channel: Channel,
        amount: RecordAmount,
    ) -> Result<ChannelOverview, Error>;
}
