//! Request body extraction with per-field error reporting.

use axum::{
    async_trait,
    body::{Bytes, HttpBody},
    extract::FromRequest,
    http::Request,
    BoxError,
};
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;

use crate::error::{ApiError, ValidationErrors};

/// Key used for problems that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Like `axum::Json`, but the body is parsed whatever the content type and
/// type mismatches are reported against the offending field.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for JsonBody<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        Ok(JsonBody(parse(&bytes)?))
    }
}

pub fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let field = match err.path().iter().next() {
            Some(Segment::Map { key }) => key.clone(),
            _ => NON_FIELD_ERRORS.to_string(),
        };
        let inner = err.into_inner();
        let message = inner.to_string();
        let message = message
            .strip_suffix(&format!(" at line {} column {}", inner.line(), inner.column()))
            .unwrap_or(message.as_str())
            .to_string();
        if inner.is_data() {
            let mut errors = ValidationErrors::default();
            errors.add(field, message);
            ApiError::Validation(errors)
        } else {
            ApiError::MalformedJson(message)
        }
    })
}
