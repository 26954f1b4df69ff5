//! Repository utilities.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::result::DatabaseErrorInformation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::pool::DieselError;

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> DieselError {
    DieselError::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

fn decode_error(what: &str, value: &str) -> DieselError {
    DieselError::DeserializationError(format!("Invalid {}: '{}'", what, value).into())
}

/// Dates are stored as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, DieselError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| decode_error("date", s))
}

pub fn parse_date_opt(s: Option<&str>) -> Result<Option<NaiveDate>, DieselError> {
    s.map(parse_date).transpose()
}

/// Timestamps are stored as RFC 3339.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DieselError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| decode_error("timestamp", s))
}

/// Encode a list-valued column.
pub fn to_json_column<T: Serialize>(value: &T) -> Result<String, DieselError> {
    serde_json::to_string(value).map_err(|e| DieselError::SerializationError(Box::new(e)))
}

/// Decode a list-valued column.
pub fn from_json_column<T: DeserializeOwned>(s: &str) -> Result<T, DieselError> {
    serde_json::from_str(s).map_err(|e| DieselError::DeserializationError(Box::new(e)))
}

/// Store an unsigned count in an INTEGER column.
pub fn count_to_db(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

pub fn count_from_db(n: i32) -> u32 {
    u32::try_from(n).unwrap_or(0)
}
