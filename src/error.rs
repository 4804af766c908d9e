//! Errors surfaced by the HTTP layer and how they are rendered.

use std::{collections::BTreeMap, fmt::Display};

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Field name to the list of problems found with that field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// The cleaned value if nothing was recorded, otherwise the collected
    /// errors. Cleaning only yields `None` after recording a message.
    pub fn into_result<T>(self, value: Option<T>) -> Result<T, ApiError> {
        match value {
            Some(value) if self.is_empty() => Ok(value),
            _ => Err(ApiError::Validation(self)),
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields = self.0.iter().peekable();
        while let Some((field, messages)) = fields.next() {
            write!(f, "{field}: {}", messages.join(" "))?;
            if fields.peek().is_some() {
                write!(f, "; ")?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid input ({0})")]
    Validation(ValidationErrors),

    #[error("JSON parse error - {0}")]
    MalformedJson(String),

    /// The body could not be read at all, e.g. it exceeds the size limit.
    #[error(transparent)]
    Body(#[from] BytesRejection),

    #[error("{model} {id} not found")]
    NotFound { model: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(model: &'static str, id: impl Display) -> Self {
        ApiError::NotFound {
            model,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::MalformedJson(_) => json!({ "detail": self.to_string() }),
            ApiError::Body(rejection) => json!({ "detail": rejection.body_text() }),
            ApiError::NotFound { .. } => json!({ "detail": "Not found." }),
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!("Request failed: {:#}", self);
                json!({ "detail": "Internal server error." })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = ValidationErrors::default();
        errors.add("last_name", "This field is required.");
        errors.add("first_name", "This field may not be blank.");
        errors.add("first_name", "Something else.");

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({
                "first_name": ["This field may not be blank.", "Something else."],
                "last_name": ["This field is required."],
            })
        );
        assert_eq!(
            errors.to_string(),
            "first_name: This field may not be blank. Something else.; last_name: This field is required."
        );
        assert!(errors.messages("title").is_empty());
    }

    #[test]
    fn maps_to_status_codes() {
        assert_eq!(
            ApiError::Validation(ValidationErrors::default()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedJson("expected value".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("author", 3).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn empty_errors_pass_the_value_through() {
        assert_eq!(ValidationErrors::default().into_result(Some(5)).unwrap(), 5);
        let mut errors = ValidationErrors::default();
        errors.add("title", "This field is required.");
        assert!(matches!(
            errors.into_result(Some(5)),
            Err(ApiError::Validation(_))
        ));
    }
}
