//! Engineer daily-task routes: the daily board, completion flags, custom
//! activities, and target tasks.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;

use super::SharedState;
use crate::store;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/engineer-daily-tasks", get(daily_tasks))
        .route(
            "/api/engineer-daily-tasks/{engineer}/{project}",
            patch(update_completion),
        )
        .route("/api/engineer-daily-activities/{engineer}", post(add_activity))
        .route(
            "/api/engineer-daily-activities/{engineer}/{activityId}",
            delete(delete_activity),
        )
        .route("/api/engineer-target-tasks/{engineer}", post(add_target_task))
        .route(
            "/api/engineer-target-tasks/{engineer}/{taskId}",
            delete(delete_target_task),
        )
        .route("/api/pending-tasks/{engineer}", get(pending_tasks))
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionRequest {
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct ActivityRequest {
    activity: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct TargetTaskRequest {
    task: String,
    date: String,
}

#[derive(Debug, Deserialize)]
struct DateBody {
    date: String,
}

async fn daily_tasks(
    State(state): State<SharedState>,
    Query(query): Query<DateQuery>,
) -> impl IntoResponse {
    let date = query.date.unwrap_or_else(store::today);
    Json(state.storage.engineer_daily_tasks(&date).await)
}

/// Completion flags are keyed to today; the board only edits the current day.
async fn update_completion(
    State(state): State<SharedState>,
    Path((engineer, project)): Path<(String, String)>,
    Json(req): Json<CompletionRequest>,
) -> impl IntoResponse {
    let date = store::today();
    state
        .storage
        .mem
        .set_task_completion(&engineer, &project, &date, req.completed)
        .await;
    Json(json!({ "success": true }))
}

async fn add_activity(
    State(state): State<SharedState>,
    Path(engineer): Path<String>,
    Json(req): Json<ActivityRequest>,
) -> impl IntoResponse {
    let id = state
        .storage
        .add_engineer_activity(&engineer, &req.activity, &req.date)
        .await;
    Json(json!({ "id": id, "success": true }))
}

async fn delete_activity(
    State(state): State<SharedState>,
    Path((engineer, activity_id)): Path<(String, String)>,
    Json(req): Json<DateBody>,
) -> impl IntoResponse {
    state
        .storage
        .delete_engineer_activity(&engineer, &activity_id, &req.date)
        .await;
    Json(json!({ "success": true }))
}

async fn add_target_task(
    State(state): State<SharedState>,
    Path(engineer): Path<String>,
    Json(req): Json<TargetTaskRequest>,
) -> impl IntoResponse {
    let id = state
        .storage
        .set_engineer_target_task(&engineer, &req.task, &req.date)
        .await;
    Json(json!({ "id": id, "success": true }))
}

async fn delete_target_task(
    State(state): State<SharedState>,
    Path((engineer, task_id)): Path<(String, String)>,
    Json(req): Json<DateBody>,
) -> impl IntoResponse {
    state
        .storage
        .delete_engineer_target_task(&engineer, &task_id, &req.date)
        .await;
    Json(json!({ "success": true }))
}

/// Target tasks left over from days before today.
async fn pending_tasks(
    State(state): State<SharedState>,
    Path(engineer): Path<String>,
) -> impl IntoResponse {
    let today = store::today();
    Json(state.storage.pending_tasks(&engineer, &today).await)
}
