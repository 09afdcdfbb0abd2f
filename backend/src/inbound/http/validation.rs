//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejection is an `invalid_request` error whose `details` name the
//! offending `field` and a machine-readable `code`, so clients can attach the
//! message to the right form input.

use std::fmt::Display;

use actix_web::web::{JsonConfig, PathConfig, QueryConfig};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::inventory::{ITEM_QUANTITY_MAX, NOTES_MAX};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidBody,
    InvalidValue,
    InvalidUuid,
    OutOfRange,
    TooLong,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidBody => "invalid_body",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::TooLong => "too_long",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
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

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// Wrap a domain validation failure for `field`.
pub(crate) fn invalid_field(field: FieldName, err: impl Display) -> Error {
    field_error(field, ErrorCode::InvalidValue, err.to_string())
}

/// Wrap a validation failure for one element of a list field.
pub(crate) fn invalid_list_entry(field: FieldName, index: usize, err: impl Display) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": field.as_str(),
        "index": index,
        "code": ErrorCode::InvalidValue.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        let field_name = field.as_str();
        Error::invalid_request(format!("{field_name} must be a valid UUID")).with_details(json!({
            "field": field_name,
            "value": value,
            "code": ErrorCode::InvalidUuid.as_str(),
        }))
    })
}

/// Parse a UUID path or body value into an identifier newtype.
pub(crate) fn parse_id<T: From<Uuid>>(value: &str, field: FieldName) -> Result<T, Error> {
    parse_uuid(value, field).map(T::from)
}

/// Reject inventory quantities above the supported maximum.
pub(crate) fn ensure_item_quantity(quantity: u32, field: FieldName) -> Result<u32, Error> {
    if quantity > ITEM_QUANTITY_MAX {
        return Err(field_error(
            field,
            ErrorCode::OutOfRange,
            format!("{} must be at most {ITEM_QUANTITY_MAX}", field.as_str()),
        ));
    }
    Ok(quantity)
}

/// Trim optional free text, dropping blanks and rejecting overly long input.
pub(crate) fn optional_text(
    value: Option<String>,
    field: FieldName,
    max: usize,
) -> Result<Option<String>, Error> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(field_error(
            field,
            ErrorCode::TooLong,
            format!("{} must be at most {max} characters", field.as_str()),
        ));
    }
    Ok(Some(trimmed.to_owned()))
}

/// Notes share one limit across items, merchants and orders.
pub(crate) fn optional_notes(value: Option<String>) -> Result<Option<String>, Error> {
    optional_text(value, FieldName::new("notes"), NOTES_MAX)
}

fn body_error(message: String) -> actix_web::Error {
    Error::invalid_request(message)
        .with_details(json!({ "code": ErrorCode::InvalidBody.as_str() }))
        .into()
}

/// JSON extractor settings that report malformed bodies as domain errors.
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| body_error(err.to_string()))
}

/// Query extractor settings that report bad parameters as domain errors.
pub fn query_config() -> QueryConfig {
    QueryConfig::default().error_handler(|err, _req| body_error(err.to_string()))
}

/// Path extractor settings that report bad segments as domain errors.
pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err, _req| body_error(err.to_string()))
}
