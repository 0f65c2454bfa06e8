//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every validation failure becomes `invalid_request` with
//! `details { field, code }` naming the first rule that failed.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{AuthValidationError, Error, InvalidAmount};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidAmount,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidAmount => "invalid_amount",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName) -> Error {
    let field = field.as_str();
    field_error(
        field,
        ErrorCode::InvalidUuid.as_str(),
        format!("{field} must be a valid UUID"),
    )
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| invalid_uuid_error(field))
}

pub(crate) fn invalid_amount_error(field: FieldName, err: InvalidAmount) -> Error {
    field_error(field.as_str(), ErrorCode::InvalidAmount.as_str(), err.to_string())
}

/// Map an authentication payload failure onto its request field.
pub(crate) fn auth_validation_error(err: AuthValidationError) -> Error {
    field_error(err.field(), err.code(), err.to_string())
}
