//! Team member routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use super::{ApiError, SharedState};
use crate::models::InsertTeamMember;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/team-members", get(list_members).post(create_member))
        .route("/api/team-members/{id}", get(get_member).patch(update_member))
}

#[derive(Debug, Deserialize)]
struct UpdateMemberRequest {
    #[serde(default)]
    name: Option<String>,
}

async fn list_members(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.mem.team_members().await)
}

async fn get_member(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .storage
        .mem
        .team_member(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Team member not found".into()))
}

async fn create_member(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let insert: InsertTeamMember = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("Invalid request data".into()))?;
    let member = state.storage.mem.create_team_member(insert).await;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Only the name is updatable; everything else in the body is ignored.
async fn update_member(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .storage
        .mem
        .update_team_member_name(&id, req.name)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Team member not found".into()))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    use super::super::test_util::test_app;
    use super::*;

    #[tokio::test]
    async fn list_and_get_member() {
        let (app, state) = test_app(None).await;
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/api/team-members").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let members: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let members = members.as_array().unwrap();
        assert!(!members.is_empty());

        let id = state.storage.mem.team_members().await[0].id.clone();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/team-members/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_member_is_404() {
        let (app, _) = test_app(None).await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/team-members/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_member_validates_body() {
        let (app, _) = test_app(None).await;
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/team-members")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"name": "New Engineer"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/team-members")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "New Engineer",
                            "role": "Engineer",
                            "email": "new.engineer@drbtechverse.in",
                            "department": "Engineering"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let member: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(member["status"], "active");
    }

    #[tokio::test]
    async fn patch_updates_only_name() {
        let (app, state) = test_app(None).await;
        let before = state.storage.mem.team_members().await[0].clone();

        let resp = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/team-members/{}", before.id))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"name": "Renamed", "department": "Hacked"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let after = state.storage.mem.team_member(&before.id).await.unwrap();
        assert_eq!(after.name, "Renamed");
        assert_eq!(after.department, before.department);
    }
}
