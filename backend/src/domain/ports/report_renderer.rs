//! Ports for rendering country reports and archiving the result.

use async_trait::async_trait;

use crate::domain::CountryReport;

use super::define_port_error;

define_port_error! {
    /// Errors raised by report renderers.
    pub enum ReportRenderError {
        Render { message: String } => "report rendering failed: {message}",
    }
}

define_port_error! {
    /// Errors raised by report archives.
    pub enum ReportArchiveError {
        Write { file_name: String, message: String } => "could not archive {file_name}: {message}",
    }
}

/// Turns report lines into a printable document.
#[cfg_attr(test, mockall::automock)]
pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &CountryReport) -> Result<Vec<u8>, ReportRenderError>;
}

/// Persists rendered reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportArchive: Send + Sync {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<(), ReportArchiveError>;
}
