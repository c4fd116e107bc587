//! Dashboard stats, analytics, workload, and performance routes.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Datelike, Months, Utc};
use serde::Serialize;
use serde_json::json;

use super::SharedState;
use crate::metrics;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/stats", get(stats))
        .route("/api/analytics", get(analytics))
        .route("/api/analytics/engineer-workload", get(engineer_workload))
        .route("/api/analytics/performance", get(performance))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkloadProject {
    project_name: String,
    status: String,
    scope_of_work: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineerWorkload {
    name: String,
    projects: Vec<WorkloadProject>,
    project_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkloadView {
    current_month: String,
    next_month: String,
    engineers: Vec<EngineerWorkload>,
    total_engineers: usize,
    total_assignments: usize,
}

#[derive(Debug, Serialize)]
struct DataSources {
    sharepoint: bool,
    github: bool,
    activities: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceDetails {
    attendance_rate: u32,
    completed_projects: u32,
    at_mentions: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceEntry {
    engineer_name: String,
    attendance_score: u32,
    task_completion_score: u32,
    projects_completed_score: u32,
    data_entry_score: u32,
    overall_score: u32,
    details: PerformanceDetails,
}

async fn stats(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.dashboard_stats().await)
}

async fn analytics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.storage.analytics().await)
}

/// Current and next-month workload: one row per engineer, projects deduped
/// by name, heaviest load first.
async fn engineer_workload(State(state): State<SharedState>) -> impl IntoResponse {
    let assignments = state.storage.docs.project_assignments().await;

    let now = Utc::now().date_naive();
    let current_month = now.format("%B %Y").to_string();
    let next_month = now
        .checked_add_months(Months::new(1))
        .unwrap_or(now)
        .with_day(1)
        .unwrap_or(now)
        .format("%B %Y")
        .to_string();

    let mut engineers: Vec<EngineerWorkload> = Vec::new();
    for assignment in assignments {
        if assignment.engineer.is_empty() {
            continue;
        }
        let index = engineers
            .iter()
            .position(|e| e.name == assignment.engineer)
            .unwrap_or_else(|| {
                engineers.push(EngineerWorkload {
                    name: assignment.engineer.clone(),
                    projects: Vec::new(),
                    project_count: 0,
                });
                engineers.len() - 1
            });
        let entry = &mut engineers[index];
        if !entry
            .projects
            .iter()
            .any(|p| p.project_name == assignment.project_name)
        {
            entry.projects.push(WorkloadProject {
                project_name: assignment.project_name,
                status: assignment.status,
                scope_of_work: if assignment.notes.is_empty() {
                    "Not specified".to_string()
                } else {
                    assignment.notes
                },
            });
            entry.project_count += 1;
        }
    }
    engineers.sort_by(|a, b| b.project_count.cmp(&a.project_count));

    let total_assignments = engineers.iter().map(|e| e.project_count).sum();
    Json(WorkloadView {
        current_month,
        next_month,
        total_engineers: engineers.len(),
        total_assignments,
        engineers,
    })
}

/// Weighted per-engineer performance scores. Attendance only contributes
/// when the workbook connector is reachable; with no external data at all
/// the endpoint reports 503 so the dashboard can show its outage state.
async fn performance(State(state): State<SharedState>) -> Response {
    let is_connected = state.graph.is_connected().await;
    let members = state.storage.mem.team_members().await;
    let activity_views = state.storage.docs.project_activities().await;
    let assignments = state.storage.docs.project_assignments().await;

    let mut mention_counts: HashMap<String, u32> = HashMap::new();
    for view in &activity_views {
        for text in view.activities.values() {
            for member in &members {
                let count = metrics::count_mentions(text, &member.name) as u32;
                if count > 0 {
                    *mention_counts.entry(member.name.clone()).or_insert(0) += count;
                }
            }
        }
    }

    let mut completed_counts: HashMap<String, u32> = HashMap::new();
    for assignment in &assignments {
        if assignment.status == "Completed" && !assignment.engineer.is_empty() {
            *completed_counts.entry(assignment.engineer.clone()).or_insert(0) += 1;
        }
    }

    let attendance = if is_connected {
        state.graph.attendance_stats().await
    } else {
        Vec::new()
    };

    let data: Vec<PerformanceEntry> = members
        .iter()
        .map(|member| {
            let attendance_rate = attendance
                .iter()
                .find(|a| a.engineer_name == member.name)
                .map(|a| a.update_rate)
                .unwrap_or(0);
            let completed_projects = completed_counts.get(&member.name).copied().unwrap_or(0);
            let at_mentions = mention_counts.get(&member.name).copied().unwrap_or(0);
            let task_completion_rate = metrics::task_completion_rate(completed_projects);

            PerformanceEntry {
                engineer_name: member.name.clone(),
                attendance_score: metrics::attendance_score(f64::from(attendance_rate)),
                task_completion_score: metrics::task_completion_score(task_completion_rate),
                projects_completed_score: metrics::projects_completed_score(completed_projects),
                data_entry_score: metrics::data_entry_score(at_mentions),
                overall_score: metrics::performance_score(
                    f64::from(attendance_rate),
                    task_completion_rate,
                    completed_projects,
                    at_mentions,
                ),
                details: PerformanceDetails {
                    attendance_rate,
                    completed_projects,
                    at_mentions,
                },
            }
        })
        .collect();

    let data_sources = DataSources {
        sharepoint: is_connected && !attendance.is_empty(),
        github: !assignments.is_empty(),
        activities: !activity_views.is_empty(),
    };

    if !data_sources.github && !data_sources.activities {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "message": "Unable to fetch performance data - external services unavailable",
                "connected": false,
                "dataSources": data_sources,
            })),
        )
            .into_response();
    }

    let message = if data_sources.sharepoint {
        "Full performance data available"
    } else {
        "Partial data - attendance unavailable from SharePoint"
    };
    Json(json!({
        "connected": is_connected,
        "message": message,
        "dataSources": data_sources,
        "data": data,
    }))
    .into_response()
}
