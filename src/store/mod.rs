//! Storage facade.
//!
//! `Storage` mediates between the session-scoped in-memory store and the
//! remote JSON documents: seeding pulls team members and projects out of the
//! assignment sheet (falling back to a built-in list when the store is
//! unreachable), daily-task reads sync the remote day into memory first, and
//! the derived dashboard numbers are computed over the combined picture.

pub mod documents;
pub mod memory;

use std::collections::HashMap;

use chrono::{Months, Utc};
use tracing::info;

pub use documents::Documents;
pub use memory::{DatedEntry, MemStore};

use crate::metrics;
use crate::models::{
    AnalyticsData, DashboardStats, EngineerDayView, MemberStatus, MonthlyProgressRow, Priority,
    PriorityCount, Project, ProjectStatus, ProjectTaskView, StatusCount, TeamMember,
    TeamPerformanceRow, TrendPoint,
};
use documents::new_id;

const FALLBACK_ENGINEERS: &[&str] = &[
    "Susanth",
    "Keerthi",
    "Eswanth",
    "Dyumith",
    "Sachin",
    "Rajesh R",
    "Prakash",
    "Deekshitha",
    "Praveen Kumar",
    "Harikrishnan",
    "Anand",
    "Shubam Shirke",
    "Veeresh",
];

/// (project name, status, end date) rows used when the assignment sheet is
/// unreachable at startup.
const FALLBACK_PROJECTS: &[(&str, &str, &str)] = &[
    (
        "3A-S03-25066 - D8 Press-in Blind Hole Receptacle - Auto Assembly - SouthCo",
        "In Progress",
        "2025-12-31",
    ),
    ("3W-TT3-25051 - 560B Spot welding line", "In Progress", "2025-11-21"),
    ("3W2401_MRA ROOF SPOT WELDING LINE TKM", "In Progress", "2025-11-20"),
    (
        "3DBTT202_JIG MODIFICATION AND 48605 CELL INSTALLTION",
        "In Progress",
        "2026-01-21",
    ),
    ("3W-TT4-25073_EXISTINH JIG POKAYOKE ADDITION", "Completed", "2025-10-17"),
    ("3W-TT4-25072_NOZZLE CLEANER INSTALLATION", "Completed", "2025-09-22"),
    (
        "3W-TT3-25051_ROBOTIC SPOT WELDING CELL R1J1,R1J2,BOLTING JIG",
        "In Progress",
        "2025-11-20",
    ),
    ("3W-SA1-25078_R1J1 ROBOTIC CELL + JIG", "In Progress", "2025-11-21"),
    ("3A-SO1-25025_Bailer_Assembly", "In Progress", "2025-11-30"),
];

/// Today's date key (UTC), matching the documents' YYYY-MM-DD keys.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn status_color(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Completed => "#22c55e",
        ProjectStatus::InProgress => "#3b82f6",
        ProjectStatus::Pending => "#f59e0b",
        ProjectStatus::AtRisk => "#ef4444",
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "#ef4444",
        Priority::Medium => "#f59e0b",
        Priority::Low => "#22c55e",
    }
}

pub struct Storage {
    pub mem: MemStore,
    pub docs: Documents,
}

impl Storage {
    pub fn new(docs: Documents) -> Self {
        Self {
            mem: MemStore::new(),
            docs,
        }
    }

    // ── seeding ──────────────────────────────────────────────────────

    /// Populate team members and projects from the assignment sheet, with
    /// built-in fallbacks when the store is unreachable.
    pub async fn seed(&self) {
        self.seed_team_members().await;
        self.seed_projects().await;
    }

    async fn seed_team_members(&self) {
        let engineers = self.docs.unique_engineers().await;
        let (names, source): (Vec<String>, &str) = if engineers.is_empty() {
            (
                FALLBACK_ENGINEERS.iter().map(|n| n.to_string()).collect(),
                "fallback list",
            )
        } else {
            (engineers, "assignment sheet")
        };

        let members: Vec<TeamMember> = names
            .iter()
            .enumerate()
            .map(|(index, name)| TeamMember {
                id: new_id(),
                name: name.trim().to_string(),
                role: "Engineer".to_string(),
                email: format!(
                    "{}@drbtechverse.in",
                    name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(".")
                ),
                department: "Engineering".to_string(),
                status: match index % 10 {
                    0..=6 => MemberStatus::Active,
                    7 | 8 => MemberStatus::Away,
                    _ => MemberStatus::Busy,
                },
                avatar: None,
            })
            .collect();

        info!(count = members.len(), source, "seeded team members");
        self.mem.set_team_members(members).await;
    }

    async fn seed_projects(&self) {
        let assignments = self.docs.project_assignments().await;

        // First status/end-date per distinct project name wins.
        let mut rows: Vec<(String, String, String)> = Vec::new();
        for assignment in assignments {
            if rows.iter().any(|(name, _, _)| *name == assignment.project_name) {
                continue;
            }
            rows.push((assignment.project_name, assignment.status, assignment.end_date));
        }
        if rows.is_empty() {
            rows = FALLBACK_PROJECTS
                .iter()
                .map(|(name, status, end)| (name.to_string(), status.to_string(), end.to_string()))
                .collect();
            info!(count = rows.len(), "assignment sheet empty; seeding fallback projects");
        }

        let projects: Vec<Project> = rows
            .into_iter()
            .enumerate()
            .map(|(index, (name, status, end_date))| {
                let status = match status.as_str() {
                    "Completed" => ProjectStatus::Completed,
                    _ => ProjectStatus::InProgress,
                };
                Project {
                    id: new_id(),
                    name,
                    description: Some("Project assignment and tracking".to_string()),
                    status,
                    progress: if status == ProjectStatus::Completed {
                        100
                    } else {
                        20 + ((index as u32 * 13) % 80)
                    },
                    priority: match index % 4 {
                        0 => Priority::High,
                        1 | 2 => Priority::Medium,
                        _ => Priority::Low,
                    },
                    due_date: if end_date.is_empty() { None } else { Some(end_date) },
                }
            })
            .collect();

        self.mem.set_projects(projects).await;
    }

    // ── daily tasks ──────────────────────────────────────────────────

    /// One row per engineer for the daily board. The remote day entries are
    /// synced into memory first, then joined with the assignment sheet and
    /// the session completion flags.
    pub async fn engineer_daily_tasks(&self, date: &str) -> Vec<EngineerDayView> {
        for item in self.docs.engineer_data_by_date(date).await {
            self.mem
                .replace_day_activities(&item.engineer_name, date, item.completed_activities)
                .await;
            self.mem
                .replace_day_target_tasks(&item.engineer_name, date, item.target_tasks)
                .await;
        }

        let assignments = self.docs.project_assignments().await;
        let members = self.mem.team_members().await;

        let mut order: Vec<String> = members.iter().map(|m| m.name.clone()).collect();
        let mut tasks_by_engineer: HashMap<String, Vec<ProjectTaskView>> =
            order.iter().map(|name| (name.clone(), Vec::new())).collect();

        for assignment in assignments {
            if assignment.engineer.is_empty() || assignment.project_name.is_empty() {
                continue;
            }
            if !tasks_by_engineer.contains_key(&assignment.engineer) {
                order.push(assignment.engineer.clone());
                tasks_by_engineer.insert(assignment.engineer.clone(), Vec::new());
            }
            // Assignments referencing unknown projects carry no checkbox row.
            if let Some(project) = self.mem.project_by_name(&assignment.project_name).await {
                let completed = self
                    .mem
                    .task_completed(&assignment.engineer, &project.id, date)
                    .await;
                if let Some(tasks) = tasks_by_engineer.get_mut(&assignment.engineer) {
                    tasks.push(ProjectTaskView {
                        project_id: project.id,
                        project_name: assignment.project_name,
                        completed,
                    });
                }
            }
        }

        let mut views = Vec::with_capacity(order.len());
        for name in order {
            let tasks = tasks_by_engineer.remove(&name).unwrap_or_default();
            let completed = tasks.iter().filter(|t| t.completed).count();
            let in_progress = tasks.len().saturating_sub(completed).saturating_sub(1);
            views.push(EngineerDayView {
                planned: tasks.len(),
                completed,
                in_progress,
                tasks,
                custom_activities: self.mem.activities_for(&name, date).await,
                target_tasks: self.mem.target_tasks_for(&name, date).await,
                engineer_name: name,
            });
        }
        views
    }

    /// Record an activity in memory and mirror it to the remote day entry.
    /// The returned id is the session one; the document keeps its own.
    pub async fn add_engineer_activity(&self, engineer: &str, activity: &str, date: &str) -> String {
        let id = new_id();
        self.mem
            .add_activity(
                engineer,
                DatedEntry {
                    id: id.clone(),
                    text: activity.to_string(),
                    date: date.to_string(),
                },
            )
            .await;
        self.docs.add_engineer_activity(engineer, activity, date).await;
        id
    }

    pub async fn delete_engineer_activity(&self, engineer: &str, activity_id: &str, date: &str) {
        self.mem.delete_activity(engineer, activity_id, date).await;
        self.docs
            .delete_engineer_activity(engineer, activity_id, date)
            .await;
    }

    pub async fn set_engineer_target_task(&self, engineer: &str, task: &str, date: &str) -> String {
        let id = new_id();
        self.mem
            .add_target_task(
                engineer,
                DatedEntry {
                    id: id.clone(),
                    text: task.to_string(),
                    date: date.to_string(),
                },
            )
            .await;
        self.docs.set_engineer_target_task(engineer, task, date).await;
        id
    }

    pub async fn delete_engineer_target_task(&self, engineer: &str, task_id: &str, date: &str) {
        self.mem.delete_target_task(engineer, task_id, date).await;
        self.docs
            .delete_engineer_target_task(engineer, task_id, date)
            .await;
    }

    pub async fn pending_tasks(&self, engineer: &str, before_date: &str) -> Vec<DatedEntry> {
        self.mem.pending_target_tasks(engineer, before_date).await
    }

    // ── projects with derived progress ───────────────────────────────

    /// Projects with progress recomputed from today's engineer updates.
    /// When nobody has logged anything today, the seeded numbers stand.
    pub async fn projects_with_progress(&self) -> Vec<Project> {
        let projects = self.mem.projects().await;
        let engineer_tasks = self.engineer_daily_tasks(&today()).await;

        let active: Vec<&EngineerDayView> = engineer_tasks
            .iter()
            .filter(|t| !t.custom_activities.is_empty() || !t.target_tasks.is_empty())
            .collect();
        let total_target: usize = active.iter().map(|t| t.target_tasks.len()).sum();
        let total_completed: usize = active.iter().map(|t| t.completed).sum();

        projects
            .into_iter()
            .map(|mut project| {
                if !active.is_empty() && total_target > 0 {
                    let progress = metrics::completion_rate(total_completed, total_target).min(100);
                    project.progress = progress;
                    if progress == 100 {
                        project.status = ProjectStatus::Completed;
                    } else if progress > 0 {
                        project.status = ProjectStatus::InProgress;
                    }
                }
                project
            })
            .collect()
    }

    // ── dashboard numbers ────────────────────────────────────────────

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let projects = self.projects_with_progress().await;
        let members = self.mem.team_members().await;

        let completed = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count();

        DashboardStats {
            total_projects: projects.len(),
            active_members: members
                .iter()
                .filter(|m| m.status == MemberStatus::Active)
                .count(),
            completion_rate: metrics::completion_rate(completed, projects.len()),
            recent_activities: 24,
        }
    }

    pub async fn analytics(&self) -> AnalyticsData {
        let projects = self.projects_with_progress().await;
        let members = self.mem.team_members().await;

        // Status/priority slices keep first-occurrence order.
        let mut status_counts: Vec<(ProjectStatus, usize)> = Vec::new();
        for project in &projects {
            match status_counts.iter().position(|(s, _)| *s == project.status) {
                Some(index) => status_counts[index].1 += 1,
                None => status_counts.push((project.status, 1)),
            }
        }
        let projects_by_status = status_counts
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: title_case(&status.as_str().replace('_', " ")),
                count,
                color: status_color(status).to_string(),
            })
            .collect();

        let mut priority_counts: Vec<(Priority, usize)> = Vec::new();
        for project in &projects {
            match priority_counts.iter().position(|(p, _)| *p == project.priority) {
                Some(index) => priority_counts[index].1 += 1,
                None => priority_counts.push((project.priority, 1)),
            }
        }
        let projects_by_priority = priority_counts
            .into_iter()
            .map(|(priority, count)| PriorityCount {
                priority: title_case(priority.as_str()),
                count,
                color: priority_color(priority).to_string(),
            })
            .collect();

        // Mentions in project-activity texts count toward engineer output.
        let activity_views = self.docs.project_activities().await;
        let mut mention_counts: HashMap<String, usize> = HashMap::new();
        for view in &activity_views {
            for text in view.activities.values() {
                for member in &members {
                    let count = metrics::count_mentions(text, &member.name);
                    if count > 0 {
                        *mention_counts.entry(member.name.clone()).or_insert(0) += count;
                    }
                }
            }
        }

        let engineer_tasks = self.engineer_daily_tasks(&today()).await;
        let team_performance: Vec<TeamPerformanceRow> = members
            .iter()
            .map(|member| {
                let completed = engineer_tasks
                    .iter()
                    .find(|t| t.engineer_name == member.name)
                    .map(|t| t.completed)
                    .unwrap_or(0);
                let mentions = mention_counts.get(&member.name).copied().unwrap_or(0);
                TeamPerformanceRow {
                    name: member.name.clone(),
                    tasks_completed: completed + mentions,
                    department: member.department.clone(),
                }
            })
            .collect();

        let completed_count = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count();
        let in_progress_count = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::InProgress)
            .count();
        let pending_count = projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Pending || p.status == ProjectStatus::AtRisk)
            .count();

        let now = Utc::now().date_naive();
        let mut monthly_progress = Vec::with_capacity(4);
        for i in (0..4u32).rev() {
            let month = now
                .checked_sub_months(Months::new(i))
                .unwrap_or(now)
                .format("%b")
                .to_string();
            let scale = f64::from(4 - i) / 4.0;
            monthly_progress.push(MonthlyProgressRow {
                month,
                completed: (completed_count as f64 * scale).round() as usize,
                in_progress: ((in_progress_count as f64 * (1.0 - scale * 0.3)).round() as usize)
                    .max(1),
                pending: (pending_count as f64 * (1.0 - scale * 0.5)).round() as usize,
            });
        }

        let total_tasks: usize = team_performance.iter().map(|t| t.tasks_completed).sum();
        let avg_per_week = ((total_tasks as f64 / 4.0).ceil() as usize).max(1);
        let completion_trend = [0.4, 0.6, 0.8, 1.0]
            .iter()
            .enumerate()
            .map(|(index, factor)| TrendPoint {
                week: format!("Week {}", index + 1),
                rate: (((avg_per_week as f64 * factor) / (total_tasks.max(1) as f64)) * 100.0)
                    .round()
                    .min(100.0) as u32,
            })
            .collect();

        AnalyticsData {
            projects_by_status,
            projects_by_priority,
            team_performance,
            monthly_progress,
            completion_trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connectors::MemoryFileStore;
    use crate::store::documents::DATA_FILE;

    async fn seeded_storage_with_files(data_json: Option<&str>) -> (Storage, Arc<MemoryFileStore>) {
        let store = Arc::new(MemoryFileStore::new());
        if let Some(content) = data_json {
            store.seed(DATA_FILE, content).await;
        }
        let storage = Storage::new(Documents::new(store.clone()));
        storage.seed().await;
        (storage, store)
    }

    async fn seeded_storage(data_json: Option<&str>) -> Storage {
        seeded_storage_with_files(data_json).await.0
    }

    #[tokio::test]
    async fn seeds_fallback_members_when_sheet_missing() {
        let storage = seeded_storage(None).await;
        let members = storage.mem.team_members().await;
        assert_eq!(members.len(), FALLBACK_ENGINEERS.len());
        assert!(members.iter().all(|m| m.role == "Engineer"));
        assert!(members.iter().any(|m| m.email == "praveen.kumar@drbtechverse.in"));
    }

    #[tokio::test]
    async fn seeds_members_and_projects_from_sheet() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress", "endDate": "2025-11-20"},
                {"projectName": "Roof line", "engineer": "Keerthi", "status": "Completed", "endDate": "2025-11-20"},
                {"projectName": "Bailer assembly", "engineer": "Susanth", "status": "Completed", "endDate": "2025-11-30"}
            ]}"#,
        ))
        .await;

        let members = storage.mem.team_members().await;
        assert_eq!(members.len(), 3);

        let projects = storage.mem.projects().await;
        assert_eq!(projects.len(), 2);

        let roof = projects.iter().find(|p| p.name == "Roof line").unwrap();
        // First row's status wins for a duplicated project name.
        assert_eq!(roof.status, ProjectStatus::InProgress);
        assert_eq!(roof.due_date.as_deref(), Some("2025-11-20"));

        let bailer = projects.iter().find(|p| p.name == "Bailer assembly").unwrap();
        assert_eq!(bailer.status, ProjectStatus::Completed);
        assert_eq!(bailer.progress, 100);
    }

    #[tokio::test]
    async fn daily_tasks_cover_every_member() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        let views = storage.engineer_daily_tasks("2025-01-10").await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].engineer_name, "Sachin");
        assert_eq!(views[0].planned, 1);
        assert_eq!(views[0].completed, 0);
    }

    #[tokio::test]
    async fn daily_tasks_include_engineers_missing_from_members() {
        let (storage, files) = seeded_storage_with_files(Some(
            r#"{"assignments": [
                {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        // An assignment appears later for someone not in the seeded members.
        files
            .seed(
                DATA_FILE,
                r#"{"assignments": [
                    {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"},
                    {"projectName": "Roof line", "engineer": "Contractor X", "status": "In Progress"}
                ]}"#,
            )
            .await;

        let views = storage.engineer_daily_tasks("2025-01-10").await;
        assert!(views.iter().any(|v| v.engineer_name == "Contractor X"));
    }

    #[tokio::test]
    async fn completion_flag_rolls_up_into_counts() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        let project = storage.mem.project_by_name("Roof line").await.unwrap();
        storage
            .mem
            .set_task_completion("Sachin", &project.id, "2025-01-10", true)
            .await;

        let views = storage.engineer_daily_tasks("2025-01-10").await;
        assert_eq!(views[0].completed, 1);
        assert!(views[0].tasks[0].completed);
    }

    #[tokio::test]
    async fn daily_sync_pulls_remote_entries() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "Roof line", "engineer": "Sachin", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        storage
            .docs
            .add_engineer_activity("Sachin", "Panel wiring finished", "2025-01-10")
            .await;
        storage
            .docs
            .set_engineer_target_task("Sachin", "Dress robot cables", "2025-01-10")
            .await;

        let views = storage.engineer_daily_tasks("2025-01-10").await;
        assert_eq!(views[0].custom_activities.len(), 1);
        assert_eq!(views[0].target_tasks.len(), 1);
    }

    #[tokio::test]
    async fn dashboard_stats_counts() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "A", "engineer": "Sachin", "status": "Completed"},
                {"projectName": "B", "engineer": "Keerthi", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        let stats = storage.dashboard_stats().await;
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.recent_activities, 24);
    }

    #[tokio::test]
    async fn analytics_shape_is_complete() {
        let storage = seeded_storage(Some(
            r#"{"assignments": [
                {"projectName": "A", "engineer": "Sachin", "status": "Completed"},
                {"projectName": "B", "engineer": "Keerthi", "status": "In Progress"}
            ]}"#,
        ))
        .await;

        let analytics = storage.analytics().await;
        assert!(!analytics.projects_by_status.is_empty());
        assert!(!analytics.projects_by_priority.is_empty());
        assert_eq!(analytics.team_performance.len(), 2);
        assert_eq!(analytics.monthly_progress.len(), 4);
        assert_eq!(analytics.completion_trend.len(), 4);
        assert!(analytics.completion_trend.iter().all(|t| t.rate <= 100));
    }

    #[test]
    fn title_case_labels() {
        assert_eq!(title_case("in progress"), "In Progress");
        assert_eq!(title_case("at risk"), "At Risk");
        assert_eq!(title_case("high"), "High");
    }
}
