//! HTTP handlers, one module per resource.

pub mod articles;
pub mod authors;
pub mod health;
pub mod json;

use crate::{error::ApiError, types::id::Id};

/// Path ids that are not integers cannot name a record.
pub(crate) fn parse_id(model: &'static str, raw: &str) -> Result<Id, ApiError> {
    raw.parse::<Id>().map_err(|_| ApiError::not_found(model, raw))
}
