//! Notification routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde_json::json;

use super::{ApiError, SharedState};
use crate::models::InsertNotification;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route("/api/notifications/read-all", patch(mark_all_read))
        .route("/api/notifications/{id}/read", patch(mark_read))
}

async fn list_notifications(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.mem.notifications().await)
}

async fn create_notification(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let insert: InsertNotification = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("Invalid request data".into()))?;
    let notification = state.storage.mem.create_notification(insert).await;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn mark_read(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.storage.mem.mark_notification_read(&id).await;
    Json(json!({ "success": true }))
}

async fn mark_all_read(State(state): State<SharedState>) -> impl IntoResponse {
    state.storage.mem.mark_all_notifications_read().await;
    Json(json!({ "success": true }))
}
