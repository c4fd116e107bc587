//! Project and project-comment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use super::{ApiError, SharedState};
use crate::models::{InsertComment, InsertProject};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", get(get_project))
        .route(
            "/api/projects/{projectId}/comments",
            get(list_comments).post(create_comment),
        )
}

/// Active work first (in_progress, at_risk), then by progress descending.
async fn list_projects(State(state): State<SharedState>) -> impl IntoResponse {
    let mut projects = state.storage.projects_with_progress().await;
    projects.sort_by(|a, b| {
        a.status
            .sort_weight()
            .cmp(&b.status.sort_weight())
            .then(b.progress.cmp(&a.progress))
    });
    Json(projects)
}

async fn get_project(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .storage
        .mem
        .project(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))
}

async fn create_project(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let insert: InsertProject = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("Invalid request data".into()))?;
    let project = state.storage.mem.create_project(insert).await;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_comments(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    Json(state.storage.mem.comments_by_project(&project_id).await)
}

async fn create_comment(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let insert: InsertComment = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("Invalid request data".into()))?;
    let comment = state.storage.mem.create_comment(insert, project_id).await;
    Ok((StatusCode::CREATED, Json(comment)))
}
