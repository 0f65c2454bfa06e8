//! Driving port for downloadable country reports.

use async_trait::async_trait;

use crate::domain::{CountryId, Error, UserId};

/// Rendered PDF ready to stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryReportService: Send + Sync {
    /// Render, archive and return the report for a country `requester` owns.
    async fn generate(
        &self,
        requester: &UserId,
        country_id: &CountryId,
    ) -> Result<RenderedReport, Error>;
}
