//! HTTP handlers for the JSON API and the admin listing.

pub mod admin;
pub mod course;
pub mod student;

use crate::error::AppError;

/// Record ids in paths are integers; anything else cannot name a record.
pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::NotFound(id_str.to_string()))
}
