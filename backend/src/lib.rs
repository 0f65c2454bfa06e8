//! COVID statistics tracker library.
//!
//! Country administrators sign up by claiming an unclaimed country, then
//! record daily cases, deaths, recoveries and tests and download PDF reports.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
