use std::net::SocketAddr;

use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{articles, authors, health::health};

#[derive(Clone)]
pub struct AppState {
    pub conn: sqlx::SqlitePool,
}

impl AppState {
    pub fn new(conn: sqlx::SqlitePool) -> Self {
        Self { conn }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authors", get(authors::list).post(authors::create))
        .route(
            "/authors/:id",
            get(authors::retrieve)
                .put(authors::update)
                .delete(authors::remove),
        )
        .route("/articles", get(articles::list).post(articles::create))
        .route(
            "/articles/:id",
            get(articles::retrieve)
                .put(articles::update)
                .delete(articles::remove),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until ctrl-c is received.
pub async fn start(addr: SocketAddr, conn: &sqlx::SqlitePool) -> Result<()> {
    let app = build_router(AppState::new(conn.clone()));

    info!("Listening on http://{addr}.");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Couldn't listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down.");
}
