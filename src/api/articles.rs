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
    types::article::{check_authors_exist, Article, ArticlePayload},
};

/// GET /articles
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = Article::get_all(&state.conn).await?;
    debug!("Listing {} articles.", articles.len());
    Ok(Json(articles))
}

/// POST /articles
///
/// The row and its author links are written in one transaction, an unknown
/// author id leaves nothing behind.
pub async fn create(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ArticlePayload>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let mut tx = state.conn.begin().await?;

    let mut errors = ValidationErrors::default();
    if let Some(authors) = &payload.authors {
        check_authors_exist(&mut tx, authors, &mut errors).await?;
    }
    let article = payload.create(&mut errors);
    let mut article = errors.into_result(article)?;

    article.id = article.insert(&mut tx).await?;
    tx.commit().await?;
    info!(
        "Created article {} with {} authors.",
        article.id,
        article.authors.len()
    );
    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /articles/:id
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let id = parse_id(Article::NAME_SINGULAR, &id)?;
    match Article::get_by_id(&state.conn, &id).await? {
        Some(article) => Ok(Json(article)),
        None => Err(ApiError::not_found(Article::NAME_SINGULAR, id)),
    }
}

/// PUT /articles/:id
///
/// The body is only parsed once the article is known to exist.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Article>, ApiError> {
    let id = parse_id(Article::NAME_SINGULAR, &id)?;
    let old = Article::get_by_id(&state.conn, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(Article::NAME_SINGULAR, id))?;
    let payload: ArticlePayload = json::parse(&body?)?;

    let mut tx = state.conn.begin().await?;
    let mut errors = ValidationErrors::default();
    if let Some(authors) = &payload.authors {
        check_authors_exist(&mut tx, authors, &mut errors).await?;
    }
    let article = payload.update(&old, &mut errors);
    let article = errors.into_result(article)?;

    if !article.update(&mut tx).await? {
        return Err(ApiError::not_found(Article::NAME_SINGULAR, id));
    }
    tx.commit().await?;
    info!("Updated article {}.", article.id);
    Ok(Json(article))
}

/// DELETE /articles/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(Article::NAME_SINGULAR, &id)?;
    let mut conn = state.conn.acquire().await?;
    if !Article::remove(&mut conn, &id).await? {
        return Err(ApiError::not_found(Article::NAME_SINGULAR, id));
    }
    info!("Removed article {}.", id);
    Ok(StatusCode::OK)
}
