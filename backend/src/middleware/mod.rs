//! Request middleware: trace identifiers, CSRF checks and hardening headers.

pub mod csrf;
pub mod headers;
pub mod trace;

pub use csrf::{CSRF_HEADER, CsrfProtection};
pub use headers::security_headers;
pub use trace::Trace;
