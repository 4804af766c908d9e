use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::{
    api::{
        json::{self, JsonBody},
        parse_id,
    },
    error::{ApiError, ValidationErrors},
    server::AppState,
    traits::*,
    types::author::{Author, AuthorPayload},
};

/// GET /authors
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Author>>, ApiError> {
    let authors = Author::get_all(&state.conn).await?;
    debug!("Listing {} authors.", authors.len());
    Ok(Json(authors))
}

/// POST /authors
pub async fn create(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AuthorPayload>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let mut errors = ValidationErrors::default();
    let author = payload.create(&mut errors);
    let mut author = errors.into_result(author)?;

    let mut conn = state.conn.acquire().await?;
    author.id = author.insert(&mut conn).await?;
    info!("Created author {}.", author);
    Ok((StatusCode::CREATED, Json(author)))
}

/// GET /authors/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let id = parse_id(Author::NAME_SINGULAR, &id)?;
    match Author::get_by_id(&state.conn, &id).await? {
        Some(author) => Ok(Json(author)),
        None => Err(ApiError::not_found(Author::NAME_SINGULAR, id)),
    }
}

/// PUT /authors/:id
///
/// The body is only parsed once the author is known to exist.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Author>, ApiError> {
    let id = parse_id(Author::NAME_SINGULAR, &id)?;
    let old = Author::get_by_id(&state.conn, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(Author::NAME_SINGULAR, id))?;
    let payload: AuthorPayload = json::parse(&body?)?;

    let mut errors = ValidationErrors::default();
    let author = payload.update(&old, &mut errors);
    let author = errors.into_result(author)?;

    let mut conn = state.conn.acquire().await?;
    if !author.update(&mut conn).await? {
        return Err(ApiError::not_found(Author::NAME_SINGULAR, id));
    }
    info!("Updated author {}.", author);
    Ok(Json(author))
}

/// DELETE /authors/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(Author::NAME_SINGULAR, &id)?;
    let mut conn = state.conn.acquire().await?;
    if !Author::remove(&mut conn, &id).await? {
        return Err(ApiError::not_found(Author::NAME_SINGULAR, id));
    }
    info!("Removed author {}.", id);
    Ok(StatusCode::OK)
}
