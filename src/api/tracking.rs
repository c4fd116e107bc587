//! Project status-tracking, activity-log, and roster-config routes.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, SharedState};
use crate::metrics;
use crate::models::{DAY_STATUSES, PROJECT_STAGES};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/project-status-tracking",
            get(status_tracking).post(update_status),
        )
        .route("/api/project-assignments", get(assignments))
        .route(
            "/api/project-activities",
            get(activities).post(update_activity),
        )
        .route("/api/project-activities/status", post(update_stage))
        .route("/api/project-names", get(project_names))
        .route("/api/engineer-daily-tasks-config", get(roster_config))
        .route(
            "/api/engineer-daily-tasks-config/initialize",
            post(initialize_roster_config),
        )
        .route(
            "/api/engineers-master-list/initialize",
            post(initialize_master_list),
        )
        .route("/api/engineers-master-list", put(replace_master_list))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdateRequest {
    #[serde(default)]
    engineer_name: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityUpdateRequest {
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    activity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageUpdateRequest {
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct MasterListEntry {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    initials: Option<String>,
}

fn is_iso_date(date: &str) -> bool {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() && date.len() == 10
}

async fn status_tracking(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.docs.project_status_tracking().await)
}

async fn update_status(
    State(state): State<SharedState>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.engineer_name.is_empty()
        || req.project_name.is_empty()
        || !is_iso_date(&req.date)
        || !DAY_STATUSES.contains(&req.status.as_str())
    {
        return Err(ApiError::BadRequest("Validation failed".into()));
    }
    if !metrics::in_tracking_window(&req.date) {
        return Err(ApiError::BadRequest(
            "Date must be between December 5, 2024 and February 28, 2025".into(),
        ));
    }

    let success = state
        .storage
        .docs
        .update_project_status(&req.engineer_name, &req.project_name, &req.date, &req.status)
        .await;
    Ok(Json(json!({ "success": success })))
}

async fn assignments(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.docs.project_assignments().await)
}

async fn activities(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.docs.project_activities().await)
}

async fn update_activity(
    State(state): State<SharedState>,
    Json(req): Json<ActivityUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.project_name.is_empty() || !is_iso_date(&req.date) || req.activity.is_none() {
        return Err(ApiError::BadRequest("Validation failed".into()));
    }
    let activity = req.activity.unwrap_or_default();

    let success = state
        .storage
        .docs
        .update_project_activity(&req.project_name, &req.date, &activity)
        .await;
    Ok(Json(json!({ "success": success })))
}

async fn update_stage(
    State(state): State<SharedState>,
    Json(req): Json<StageUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.project_name.is_empty() || !PROJECT_STAGES.contains(&req.status.as_str()) {
        return Err(ApiError::BadRequest("Validation failed".into()));
    }

    let success = state
        .storage
        .docs
        .update_project_current_status(&req.project_name, &req.status)
        .await;
    Ok(Json(json!({ "success": success })))
}

async fn project_names(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.docs.project_names().await)
}

async fn roster_config(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.docs.daily_tasks_config().await)
}

async fn initialize_roster_config(State(state): State<SharedState>) -> impl IntoResponse {
    let success = state.storage.docs.initialize_daily_tasks_file().await;
    Json(json!({ "success": success }))
}

async fn initialize_master_list(State(state): State<SharedState>) -> impl IntoResponse {
    let success = state.storage.docs.initialize_master_list().await;
    Json(json!({ "success": success }))
}

async fn replace_master_list(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(engineers) = body.get("engineers").and_then(|v| v.as_array()) else {
        return Err(ApiError::BadRequest("Engineers must be an array".into()));
    };
    let entries: Vec<MasterListEntry> = engineers
        .iter()
        .map(|v| serde_json::from_value(v.clone()))
        .collect::<Result<_, _>>()
        .map_err(|_| ApiError::BadRequest("Engineers must be an array".into()))?;

    let doc = state
        .storage
        .docs
        .replace_master_list(
            entries
                .into_iter()
                .map(|e| (e.id, e.name, e.initials))
                .collect(),
        )
        .await;
    Ok(Json(json!({ "success": true, "engineers": doc.engineers })))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::super::test_util::test_app;
    use super::*;

    const SHEET: &str = r#"{"assignments": [
        {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"}
    ], "data": [
        {"projectName": "Roof line"},
        {"projectName": "Bailer assembly"}
    ]}"#;

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

    #[tokio::test]
    async fn status_update_inside_window_lands_on_grid() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/project-status-tracking",
                json!({
                    "engineerName": "Sachin",
                    "projectName": "Roof line",
                    "date": "2025-01-15",
                    "status": "Completed"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["success"], true);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/project-status-tracking")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(resp).await;
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["statuses"]["2025-01-15"], "Completed");
        // One completed day out of the fixed 86-day window.
        assert_eq!(rows[0]["completionPercentage"], 1);
    }

    #[tokio::test]
    async fn status_update_outside_window_is_rejected() {
        let (app, _) = test_app(Some(SHEET)).await;
        for date in ["2024-12-04", "2025-03-01"] {
            let resp = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/project-status-tracking",
                    json!({
                        "engineerName": "Sachin",
                        "projectName": "Roof line",
                        "date": date,
                        "status": "Completed"
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert!(
                body_json(resp)
                    .await["message"]
                    .as_str()
                    .unwrap()
                    .contains("December 5, 2024")
            );
        }
    }

    #[tokio::test]
    async fn status_update_rejects_unknown_status() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/project-status-tracking",
                json!({
                    "engineerName": "Sachin",
                    "projectName": "Roof line",
                    "date": "2025-01-15",
                    "status": "Done-ish"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_status_clears_a_day() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/project-status-tracking",
                json!({
                    "engineerName": "Sachin",
                    "projectName": "Roof line",
                    "date": "2025-01-15",
                    "status": ""
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn activity_update_and_listing() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/project-activities",
                json!({
                    "projectName": "Roof line",
                    "date": "2025-01-15",
                    "activity": "@Sachin finished panel wiring"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/project-activities")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(resp).await;
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["activities"]["2025-01-15"], "@Sachin finished panel wiring");
    }

    #[tokio::test]
    async fn stage_update_validates_against_stage_list() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/project-activities/status",
                json!({"projectName": "Roof line", "status": "Half Done"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(json_request(
                "POST",
                "/api/project-activities/status",
                json!({"projectName": "Roof line", "status": "Trials Stage"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn project_names_from_data_rows() {
        let (app, _) = test_app(Some(SHEET)).await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/project-names")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(resp).await;
        assert_eq!(
            value.as_array().unwrap().len(),
            2,
            "unique names from the data rows"
        );
    }

    #[tokio::test]
    async fn roster_config_autoinitializes() {
        let (app, _) = test_app(None).await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/engineer-daily-tasks-config")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value = body_json(resp).await;
        assert_eq!(value.as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn master_list_replace_derives_ids_and_initials() {
        let (app, _) = test_app(None).await;
        let resp = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/engineers-master-list",
                json!({"engineers": [
                    {"name": "Sachin Kumar"},
                    {"name": "Rajesh R (PAES)", "id": "eng-7"}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let value = body_json(resp).await;
        assert_eq!(value["engineers"][0]["id"], "eng-1");
        assert_eq!(value["engineers"][0]["initials"], "SK");
        assert_eq!(value["engineers"][1]["id"], "eng-7");
        assert_eq!(value["engineers"][1]["initials"], "RR");

        let resp = app
            .oneshot(json_request(
                "PUT",
                "/api/engineers-master-list",
                json!({"engineers": "not-an-array"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
