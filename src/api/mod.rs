//! REST API surface.
//!
//! One router per resource group, merged under a shared [`AppState`].
//! Handler errors map onto the conventional status codes through
//! [`ApiError`]; every error body is `{"message": ...}`.

pub mod analytics;
pub mod auth;
pub mod daily;
pub mod notifications;
pub mod projects;
pub mod team;
pub mod tracking;
pub mod weekly;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::OpsConfig;
use crate::connectors::{FileStore, GitHubFileStore, GraphClient, MemoryFileStore, TokenProvider};
use crate::store::{Documents, Storage};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub storage: Storage,
    pub graph: GraphClient,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .merge(auth::router())
        .merge(team::router())
        .merge(projects::router())
        .merge(notifications::router())
        .merge(daily::router())
        .merge(weekly::router())
        .merge(tracking::router())
        .merge(analytics::router())
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "ok"
}

/// Wire up state from config. `offline` swaps the GitHub store for the
/// in-memory one so the API runs without network access.
pub fn build_state(config: &OpsConfig, offline: bool) -> SharedState {
    let tokens = Arc::new(TokenProvider::from_config(&config.connector));
    let store: Arc<dyn FileStore> = if offline {
        Arc::new(MemoryFileStore::new())
    } else {
        Arc::new(GitHubFileStore::new(
            tokens.clone(),
            config.repo.owner.clone(),
            config.repo.name.clone(),
        ))
    };
    let docs = Documents::new(store);
    let graph = GraphClient::new(tokens, config.attendance.share_link.clone());
    Arc::new(AppState {
        storage: Storage::new(docs),
        graph,
    })
}

pub fn build_router(state: SharedState, dev: bool) -> Router {
    let mut app = api_router().with_state(state);
    if dev {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Start the HTTP API and serve until ctrl-c.
pub async fn start_server(config: OpsConfig, offline: bool) -> Result<()> {
    let state = build_state(&config, offline);
    state.storage.seed().await;

    let app = build_router(state, config.server.dev);

    let host = if config.server.dev { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!("opsboard API running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
        return;
    }
    info!("shutting down");
}


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn health_via_full_router() {
        let (app, _) = test_util::test_app(None).await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn api_error_bodies_carry_message() {
        let resp = ApiError::NotFound("Team member not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Team member not found");
    }
}
