//! Weekly assignment routes, including the nested task collection.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, SharedState};
use crate::models::{AssignmentStatus, TaskStatus, WeeklyAssignment, WeeklyAssignmentTask};
use crate::store::documents::Documents;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/weekly-assignments",
            get(list_assignments).post(create_assignment),
        )
        .route("/api/weekly-assignments/save-all", post(save_all))
        .route(
            "/api/weekly-assignments/{id}",
            axum::routing::patch(update_assignment).delete(delete_assignment),
        )
        .route("/api/weekly-assignments/{assignmentId}/tasks", post(add_task))
        .route(
            "/api/weekly-assignments/{assignmentId}/tasks/{taskId}",
            axum::routing::patch(update_task).delete(delete_task),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeekQuery {
    week_start: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssignmentRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    engineer_name: String,
    #[serde(default)]
    week_start: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    project_target_date: Option<String>,
    #[serde(default)]
    resource_locked_from: Option<String>,
    #[serde(default)]
    resource_locked_till: Option<String>,
    #[serde(default)]
    internal_target: Option<String>,
    #[serde(default)]
    customer_target: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<WeeklyAssignmentTask>>,
    #[serde(default)]
    current_status: Option<AssignmentStatus>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    constraint: Option<String>,
}

/// Partial update; absent fields keep the stored values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAssignmentRequest {
    #[serde(default)]
    engineer_name: Option<String>,
    #[serde(default)]
    week_start: Option<String>,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    project_target_date: Option<String>,
    #[serde(default)]
    resource_locked_from: Option<String>,
    #[serde(default)]
    resource_locked_till: Option<String>,
    #[serde(default)]
    internal_target: Option<String>,
    #[serde(default)]
    customer_target: Option<String>,
    #[serde(default)]
    tasks: Option<Vec<WeeklyAssignmentTask>>,
    #[serde(default)]
    current_status: Option<AssignmentStatus>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    constraint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    #[serde(default)]
    task_name: String,
    #[serde(default)]
    target_date: Option<String>,
    #[serde(default)]
    completion_date: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskRequest {
    #[serde(default)]
    task_name: Option<String>,
    #[serde(default)]
    target_date: Option<String>,
    #[serde(default)]
    completion_date: Option<String>,
    #[serde(default)]
    status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveAllRequest {
    #[serde(default)]
    week_start: Option<String>,
}

async fn list_assignments(
    State(state): State<SharedState>,
    Query(query): Query<WeekQuery>,
) -> impl IntoResponse {
    Json(
        state
            .storage
            .docs
            .weekly_assignments(query.week_start.as_deref())
            .await,
    )
}

async fn create_assignment(
    State(state): State<SharedState>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.engineer_name.is_empty() || req.week_start.is_empty() || req.project_name.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: engineerName, weekStart, projectName".into(),
        ));
    }

    let id = req
        .id
        .unwrap_or_else(|| Documents::assignment_id(&req.engineer_name, &req.week_start));
    let assignment = WeeklyAssignment {
        id,
        engineer_name: req.engineer_name,
        week_start: req.week_start,
        project_name: req.project_name,
        project_target_date: req.project_target_date,
        resource_locked_from: req.resource_locked_from,
        resource_locked_till: req.resource_locked_till,
        internal_target: req.internal_target,
        customer_target: req.customer_target,
        tasks: req.tasks.unwrap_or_default(),
        current_status: req.current_status.unwrap_or(AssignmentStatus::NotStarted),
        notes: req.notes,
        constraint: req.constraint,
    };

    if state
        .storage
        .docs
        .upsert_weekly_assignment(assignment.clone())
        .await
    {
        Ok(Json(assignment))
    } else {
        Err(ApiError::Internal("Failed to save assignment".into()))
    }
}

async fn update_assignment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAssignmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state.storage.docs.weekly_assignments(None).await;
    let Some(existing) = assignments.into_iter().find(|a| a.id == id) else {
        return Err(ApiError::NotFound("Assignment not found".into()));
    };

    let updated = WeeklyAssignment {
        id: existing.id,
        engineer_name: req.engineer_name.unwrap_or(existing.engineer_name),
        week_start: req.week_start.unwrap_or(existing.week_start),
        project_name: req.project_name.unwrap_or(existing.project_name),
        project_target_date: req.project_target_date.or(existing.project_target_date),
        resource_locked_from: req.resource_locked_from.or(existing.resource_locked_from),
        resource_locked_till: req.resource_locked_till.or(existing.resource_locked_till),
        internal_target: req.internal_target.or(existing.internal_target),
        customer_target: req.customer_target.or(existing.customer_target),
        tasks: req.tasks.unwrap_or(existing.tasks),
        current_status: req.current_status.unwrap_or(existing.current_status),
        notes: req.notes.or(existing.notes),
        constraint: req.constraint.or(existing.constraint),
    };

    if state
        .storage
        .docs
        .upsert_weekly_assignment(updated.clone())
        .await
    {
        Ok(Json(updated))
    } else {
        Err(ApiError::Internal("Failed to update assignment".into()))
    }
}

async fn delete_assignment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.storage.docs.delete_weekly_assignment(&id).await {
        Ok(Json(json!({ "message": "Assignment deleted" })))
    } else {
        Err(ApiError::NotFound("Assignment not found".into()))
    }
}

async fn add_task(
    State(state): State<SharedState>,
    Path(assignment_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.task_name.is_empty() {
        return Err(ApiError::BadRequest("Task name is required".into()));
    }

    let task = WeeklyAssignmentTask {
        id: Documents::task_id(),
        task_name: req.task_name,
        target_date: req.target_date,
        completion_date: req.completion_date,
        status: req.status.unwrap_or(TaskStatus::NotStarted),
    };

    if state
        .storage
        .docs
        .update_assignment_task(&assignment_id, task.clone())
        .await
    {
        Ok(Json(task))
    } else {
        Err(ApiError::Internal("Failed to add task".into()))
    }
}

async fn update_task(
    State(state): State<SharedState>,
    Path((assignment_id, task_id)): Path<(String, String)>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = state.storage.docs.weekly_assignments(None).await;
    let Some(assignment) = assignments.into_iter().find(|a| a.id == assignment_id) else {
        return Err(ApiError::NotFound("Assignment not found".into()));
    };
    let Some(existing) = assignment.tasks.into_iter().find(|t| t.id == task_id) else {
        return Err(ApiError::NotFound("Task not found".into()));
    };

    let updated = WeeklyAssignmentTask {
        id: existing.id,
        task_name: req.task_name.unwrap_or(existing.task_name),
        target_date: req.target_date.or(existing.target_date),
        completion_date: req.completion_date.or(existing.completion_date),
        status: req.status.unwrap_or(existing.status),
    };

    if state
        .storage
        .docs
        .update_assignment_task(&assignment_id, updated.clone())
        .await
    {
        Ok(Json(updated))
    } else {
        Err(ApiError::Internal("Failed to update task".into()))
    }
}

async fn delete_task(
    State(state): State<SharedState>,
    Path((assignment_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    if state
        .storage
        .docs
        .delete_assignment_task(&assignment_id, &task_id)
        .await
    {
        Ok(Json(json!({ "message": "Task deleted" })))
    } else {
        Err(ApiError::NotFound("Task not found".into()))
    }
}

/// Explicit save action: re-save every assignment for a week so the remote
/// document is current.
async fn save_all(
    State(state): State<SharedState>,
    Json(req): Json<SaveAllRequest>,
) -> impl IntoResponse {
    let assignments = state
        .storage
        .docs
        .weekly_assignments(req.week_start.as_deref())
        .await;
    for assignment in assignments.clone() {
        state.storage.docs.upsert_weekly_assignment(assignment).await;
    }
    Json(json!({
        "success": true,
        "message": "All assignments saved",
        "count": assignments.len(),
        "assignments": assignments,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::super::test_util::test_app;
    use super::*;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn create_assignment(app: &Router, id: &str) -> serde_json::Value {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments",
                json!({
                    "id": id,
                    "engineerName": "Keerthi",
                    "weekStart": "2025-01-06",
                    "projectName": "Spot welding line",
                    "tasks": [],
                    "currentStatus": "not_started"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    #[tokio::test]
    async fn create_requires_core_fields() {
        let (app, _) = test_app(None).await;
        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments",
                json!({"engineerName": "Keerthi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_defaults_id_and_status() {
        let (app, _) = test_app(None).await;
        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments",
                json!({
                    "engineerName": "Keerthi",
                    "weekStart": "2025-01-06",
                    "projectName": "Spot welding line"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let value = body_json(resp).await;
        assert!(value["id"].as_str().unwrap().starts_with("Keerthi-2025-01-06-"));
        assert_eq!(value["currentStatus"], "not_started");
    }

    #[tokio::test]
    async fn upsert_by_id_overwrites_not_duplicates() {
        let (app, state) = test_app(None).await;
        create_assignment(&app, "a1").await;
        create_assignment(&app, "a1").await;
        assert_eq!(state.storage.docs.weekly_assignments(None).await.len(), 1);
    }

    #[tokio::test]
    async fn list_filters_by_week_start() {
        let (app, _) = test_app(None).await;
        create_assignment(&app, "a1").await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/weekly-assignments?weekStart=2025-01-06")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(resp).await;
        assert_eq!(value.as_array().unwrap().len(), 1);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/weekly-assignments?weekStart=2025-01-13")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(resp).await;
        assert!(value.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_merges_partial_update() {
        let (app, _) = test_app(None).await;
        create_assignment(&app, "a1").await;

        let resp = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/weekly-assignments/a1",
                json!({"currentStatus": "in_progress", "notes": "ramping up"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let value = body_json(resp).await;
        assert_eq!(value["currentStatus"], "in_progress");
        assert_eq!(value["notes"], "ramping up");
        assert_eq!(value["engineerName"], "Keerthi");
    }

    #[tokio::test]
    async fn patch_unknown_assignment_is_404() {
        let (app, _) = test_app(None).await;
        let resp = app
            .oneshot(json_request(
                "PATCH",
                "/api/weekly-assignments/missing",
                json!({"notes": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_lifecycle() {
        let (app, _) = test_app(None).await;
        create_assignment(&app, "a1").await;

        // Missing name is rejected.
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments/a1/tasks",
                json!({"targetDate": "2025-01-08"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments/a1/tasks",
                json!({"taskName": "Wire cell R1J1"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let task = body_json(resp).await;
        assert!(task["id"].as_str().unwrap().starts_with("task-"));
        assert_eq!(task["status"], "not_started");
        let task_id = task["id"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/weekly-assignments/a1/tasks/{}", task_id),
                json!({"status": "completed", "completionDate": "2025-01-09"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = body_json(resp).await;
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["taskName"], "Wire cell R1J1");

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/weekly-assignments/a1/tasks/{}", task_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/weekly-assignments/a1/tasks/{}", task_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_assignment_then_404() {
        let (app, _) = test_app(None).await;
        create_assignment(&app, "a1").await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/weekly-assignments/a1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/weekly-assignments/a1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn save_all_reports_count() {
        let (app, _) = test_app(None).await;
        create_assignment(&app, "a1").await;

        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/weekly-assignments/save-all",
                json!({"weekStart": "2025-01-06"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let value = body_json(resp).await;
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 1);
    }
}
