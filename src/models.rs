//! Domain and document data shapes.
//!
//! Everything here serializes to the camelCase wire format used both by the
//! REST API and by the JSON documents kept in the remote repository, so the
//! same types flow through handlers and the document store.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Roles and statuses ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Away,
    Busy,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Away => "away",
            Self::Busy => "busy",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InProgress,
    Completed,
    Pending,
    AtRisk,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::AtRisk => "at_risk",
        }
    }

    /// Sort weight used by the project listing: active work first.
    pub fn sort_weight(&self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::AtRisk => 1,
            Self::Completed => 2,
            Self::Pending => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Status of a single task inside a weekly assignment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

/// Status of a weekly assignment as a whole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Blocked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialRole {
    Admin,
    Engineer,
}

impl CredentialRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Engineer => "engineer",
        }
    }
}

// ── Session-scoped entities (in-memory store) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub department: String,
    pub status: MemberStatus,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTeamMember {
    pub name: String,
    pub role: String,
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub progress: u32,
    pub priority: Priority,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// The `read` flag is a stringly "true"/"false" on the wire; the original
/// documents store it that way and the client depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: String,
    pub created_at: String,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub project_id: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub mentions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertComment {
    pub content: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    #[serde(default)]
    pub mentions: Option<String>,
}

// ── Document entities (remote JSON store) ─────────────────────────────

/// One row of the project-assignment sheet in `data.json`. Field aliases
/// absorb the historical column-name drift in that document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAssignment {
    #[serde(alias = "project", default)]
    pub project_name: String,
    #[serde(alias = "engineerName", default)]
    pub engineer: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub days_assigned: i64,
    #[serde(default)]
    pub remaining_days: i64,
    #[serde(default = "default_assignment_status")]
    pub status: String,
    #[serde(default)]
    pub notes: String,
}

fn default_assignment_status() -> String {
    "In Progress".to_string()
}

/// A free-text entry (target task or completed activity) with its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: String,
    pub text: String,
}

/// Per engineer-per-date bag of target tasks and completed activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDailyData {
    pub engineer_name: String,
    pub date: String,
    #[serde(default)]
    pub target_tasks: Vec<TaskEntry>,
    #[serde(default)]
    pub completed_activities: Vec<TaskEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivitiesDoc {
    #[serde(default)]
    pub engineer_daily_data: Vec<EngineerDailyData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusEntry {
    pub engineer_name: String,
    pub project_name: String,
    /// date (YYYY-MM-DD) → day status text
    #[serde(default)]
    pub statuses: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusDoc {
    #[serde(default)]
    pub project_statuses: Vec<ProjectStatusEntry>,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivityEntry {
    pub project_name: String,
    pub current_status: String,
    /// date (YYYY-MM-DD) → activity text
    #[serde(default)]
    pub activities: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivitiesDoc {
    #[serde(default)]
    pub project_activities: Vec<ProjectActivityEntry>,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAssignmentTask {
    pub id: String,
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    pub status: TaskStatus,
}

/// An engineer-project pairing scoped to a calendar week, with nested tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAssignment {
    pub id: String,
    pub engineer_name: String,
    /// ISO date of the week's Monday.
    pub week_start: String,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_target_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_locked_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_locked_till: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_target: Option<String>,
    #[serde(default)]
    pub tasks: Vec<WeeklyAssignmentTask>,
    pub current_status: AssignmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAssignmentsDoc {
    #[serde(default)]
    pub assignments: Vec<WeeklyAssignment>,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub initials: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDoc {
    #[serde(default)]
    pub engineers: Vec<RosterEntry>,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerCredential {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    pub role: CredentialRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

/// Credential view with the password stripped, for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeCredential {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: CredentialRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl From<EngineerCredential> for SafeCredential {
    fn from(cred: EngineerCredential) -> Self {
        Self {
            id: cred.id,
            name: cred.name,
            username: cred.username,
            role: cred.role,
            company: cred.company,
            is_active: cred.is_active,
            created_at: cred.created_at,
            last_login: cred.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsDoc {
    #[serde(default)]
    pub engineers: Vec<EngineerCredential>,
    #[serde(default)]
    pub last_updated: String,
}

/// Upsert payload for an engineer credential. Everything except the name is
/// optional; missing fields keep their current values on update and get
/// derived defaults on create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpsert {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<CredentialRole>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ── API view types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTaskView {
    pub project_id: String,
    pub project_name: String,
    pub completed: bool,
}

/// One engineer's row on the daily-tasks board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerDayView {
    pub engineer_name: String,
    pub planned: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub tasks: Vec<ProjectTaskView>,
    pub custom_activities: Vec<TaskEntry>,
    pub target_tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusTracking {
    pub engineer_name: String,
    pub project_name: String,
    pub current_status: String,
    pub statuses: BTreeMap<String, String>,
    pub completion_percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectActivityView {
    pub project_name: String,
    pub current_status: String,
    pub activities: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_members: usize,
    pub completion_rate: u32,
    pub recent_activities: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityCount {
    pub priority: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPerformanceRow {
    pub name: String,
    pub tasks_completed: usize,
    pub department: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProgressRow {
    pub month: String,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub week: String,
    pub rate: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub projects_by_status: Vec<StatusCount>,
    pub projects_by_priority: Vec<PriorityCount>,
    pub team_performance: Vec<TeamPerformanceRow>,
    pub monthly_progress: Vec<MonthlyProgressRow>,
    pub completion_trend: Vec<TrendPoint>,
}

/// Stage labels used by the project-activities status selector.
pub const PROJECT_STAGES: &[&str] = &[
    "Design Stage",
    "Procurement Stage",
    "Mechanical Assembly Stage",
    "Electrical Assembly Stage",
    "PLC Power Up Stage",
    "IO Check Stage",
    "Trials Stage",
    "Completed",
    "Dispatch Stage",
];

/// Day-status values accepted by the status-tracking grid. The empty string
/// clears a day.
pub const DAY_STATUSES: &[&str] = &[
    "",
    "Not Started",
    "In Progress",
    "On Hold",
    "Blocked",
    "Completed",
    "Cancelled",
];
