//! Typed read-modify-write helpers over the remote JSON documents.
//!
//! Every operation here follows the same pattern the dashboard has always
//! used: read the whole document, mutate it in memory, write it back with
//! the last-seen revision marker. Reads that fail for any reason are logged
//! and degrade to the empty document; write failures are logged and
//! reported as `false`. There is deliberately no retry and no conflict
//! resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};
use uuid::Uuid;

use crate::connectors::FileStore;
use crate::errors::StoreError;
use crate::metrics;
use crate::models::{
    CredentialRole, CredentialUpsert, CredentialsDoc, DailyActivitiesDoc, EngineerCredential,
    EngineerDailyData, ProjectActivitiesDoc, ProjectActivityEntry, ProjectActivityView,
    ProjectAssignment, ProjectStatusDoc, ProjectStatusEntry, ProjectStatusTracking, RosterDoc,
    RosterEntry, TaskEntry, WeeklyAssignment, WeeklyAssignmentTask, WeeklyAssignmentsDoc,
};

pub const DATA_FILE: &str = "data.json";
pub const DAILY_ACTIVITIES_FILE: &str = "daily-activities.json";
pub const PROJECT_STATUS_FILE: &str = "project-status.json";
pub const PROJECT_ACTIVITIES_FILE: &str = "project-activities.json";
pub const WEEKLY_ASSIGNMENTS_FILE: &str = "weekly-assignments.json";
pub const MASTER_LIST_FILE: &str = "engineers_master_list.json";
pub const DAILY_TASKS_CONFIG_FILE: &str = "engineer-daily-tasks.json";
pub const CREDENTIALS_FILE: &str = "engineers_auth.json";

const DEFAULT_ENGINEER_PASSWORD: &str = "drb@123";
const DEFAULT_ADMIN_PASSWORD: &str = "admin@drb";

/// Current UTC timestamp in the millisecond ISO form the documents carry.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Drop parenthetical company tags from a roster name.
fn strip_parentheticals(name: &str) -> String {
    let mut out = String::new();
    let mut depth = 0u32;
    for ch in name.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Company tag from the first parenthetical in a roster name, if any.
fn company_of(name: &str) -> Option<String> {
    let open = name.find('(')?;
    let close = name[open + 1..].find(')')? + open + 1;
    let company = name[open + 1..close].trim();
    if company.is_empty() {
        None
    } else {
        Some(company.to_string())
    }
}

/// `"Sachin Kumar (PAES)"` → `"sachin.kumar"`.
pub fn derive_username(name: &str) -> String {
    strip_parentheticals(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".")
}

/// Upper-cased first letters of the cleaned name parts.
pub fn derive_initials(name: &str) -> String {
    strip_parentheticals(name)
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .collect::<String>()
        .to_uppercase()
}

fn default_roster() -> Vec<RosterEntry> {
    let seed: &[(&str, &str, &str)] = &[
        ("1", "Susanth", "S"),
        ("2", "Keerthi", "K"),
        ("4", "Dyumith", "D"),
        ("5", "Sachin", "S"),
        ("7", "Prakash", "P"),
        ("8", "Deekshitha", "D"),
        ("9", "Praveen", "PK"),
        ("10", "Harikrishnan", "H"),
        ("12", "Shubam", "SS"),
        ("13", "Veeresh", "V"),
    ];
    seed.iter()
        .map(|(id, name, initials)| RosterEntry {
            id: (*id).to_string(),
            name: (*name).to_string(),
            initials: (*initials).to_string(),
        })
        .collect()
}

/// Document-layer facade over the backing [`FileStore`].
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn FileStore>,
}

impl Documents {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(path).await? {
            Some(file) => serde_json::from_str(&file.content)
                .map(Some)
                .map_err(|source| StoreError::Parse {
                    path: path.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Read a document, degrading to `fallback()` on missing file or any
    /// failure.
    async fn read_or<T, F>(&self, path: &str, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.read_json(path).await {
            Ok(Some(doc)) => doc,
            Ok(None) => fallback(),
            Err(err) => {
                error!(path, error = %err, "failed to read document; using empty default");
                fallback()
            }
        }
    }

    /// Write a document back. Fetches the current sha first so existing
    /// files update in place and missing files are created.
    async fn write_json<T: Serialize>(&self, path: &str, doc: &T, message: &str) -> bool {
        let prior_sha = match self.store.get(path).await {
            Ok(Some(file)) => Some(file.sha),
            Ok(None) => None,
            Err(err) => {
                error!(path, error = %err, "failed to read document before write");
                return false;
            }
        };

        let content = match serde_json::to_string_pretty(doc) {
            Ok(content) => content,
            Err(err) => {
                error!(path, error = %err, "failed to serialize document");
                return false;
            }
        };

        match self
            .store
            .put(path, &content, message, prior_sha.as_deref())
            .await
        {
            Ok(()) => true,
            Err(err) => {
                error!(path, error = %err, "failed to write document");
                false
            }
        }
    }

    // ── data.json (assignment sheet, read-only) ──────────────────────

    /// All project assignments. The sheet has drifted through several field
    /// names over time, so a handful of container keys are tried in order.
    pub async fn project_assignments(&self) -> Vec<ProjectAssignment> {
        let value: serde_json::Value = self
            .read_or(DATA_FILE, || serde_json::Value::Null)
            .await;

        let container = ["assignments", "projectAssignments", "projects", "data"]
            .iter()
            .find_map(|key| value.get(*key))
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        let Some(items) = container.as_array() else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                serde_json::from_value::<ProjectAssignment>(item.clone())
                    .map_err(|err| {
                        warn!(error = %err, "skipping malformed assignment row");
                        err
                    })
                    .ok()
            })
            .collect()
    }

    /// Distinct engineer names on the assignment sheet, sorted.
    pub async fn unique_engineers(&self) -> Vec<String> {
        let value: serde_json::Value = self
            .read_or(DATA_FILE, || serde_json::Value::Null)
            .await;
        let assignments: Vec<ProjectAssignment> = value
            .get("assignments")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        let names: BTreeSet<String> = assignments
            .into_iter()
            .map(|a| a.engineer.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.into_iter().collect()
    }

    /// Distinct project names from the sheet's `data` rows, sorted.
    pub async fn project_names(&self) -> Vec<String> {
        let value: serde_json::Value = self
            .read_or(DATA_FILE, || serde_json::Value::Null)
            .await;
        let names: BTreeSet<String> = value
            .get("data")
            .and_then(|v| v.as_array())
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("projectName"))
                    .filter_map(|name| name.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        names.into_iter().collect()
    }

    // ── daily-activities.json ────────────────────────────────────────

    pub async fn read_daily_activities(&self) -> DailyActivitiesDoc {
        self.read_or(DAILY_ACTIVITIES_FILE, DailyActivitiesDoc::default)
            .await
    }

    pub async fn write_daily_activities(&self, doc: &DailyActivitiesDoc) -> bool {
        let message = format!("Update engineer daily activities - {}", now_iso());
        self.write_json(DAILY_ACTIVITIES_FILE, doc, &message).await
    }

    pub async fn engineer_data_by_date(&self, date: &str) -> Vec<EngineerDailyData> {
        self.read_daily_activities()
            .await
            .engineer_daily_data
            .into_iter()
            .filter(|entry| entry.date == date)
            .collect()
    }

    fn day_entry<'a>(
        doc: &'a mut DailyActivitiesDoc,
        engineer: &str,
        date: &str,
    ) -> &'a mut EngineerDailyData {
        let index = doc
            .engineer_daily_data
            .iter()
            .position(|entry| entry.engineer_name == engineer && entry.date == date)
            .unwrap_or_else(|| {
                doc.engineer_daily_data.push(EngineerDailyData {
                    engineer_name: engineer.to_string(),
                    date: date.to_string(),
                    target_tasks: Vec::new(),
                    completed_activities: Vec::new(),
                });
                doc.engineer_daily_data.len() - 1
            });
        &mut doc.engineer_daily_data[index]
    }

    /// Append a completed activity for an engineer's day; returns the new id.
    pub async fn add_engineer_activity(&self, engineer: &str, activity: &str, date: &str) -> String {
        let mut doc = self.read_daily_activities().await;
        let id = new_id();
        Self::day_entry(&mut doc, engineer, date)
            .completed_activities
            .push(TaskEntry {
                id: id.clone(),
                text: activity.to_string(),
            });
        self.write_daily_activities(&doc).await;
        id
    }

    pub async fn delete_engineer_activity(&self, engineer: &str, activity_id: &str, date: &str) {
        let mut doc = self.read_daily_activities().await;
        if let Some(entry) = doc
            .engineer_daily_data
            .iter_mut()
            .find(|entry| entry.engineer_name == engineer && entry.date == date)
        {
            entry.completed_activities.retain(|a| a.id != activity_id);
        }
        self.write_daily_activities(&doc).await;
    }

    /// Add a target task for an engineer's day; returns the new id.
    pub async fn set_engineer_target_task(&self, engineer: &str, task: &str, date: &str) -> String {
        let mut doc = self.read_daily_activities().await;
        let id = new_id();
        Self::day_entry(&mut doc, engineer, date)
            .target_tasks
            .push(TaskEntry {
                id: id.clone(),
                text: task.to_string(),
            });
        self.write_daily_activities(&doc).await;
        id
    }

    pub async fn delete_engineer_target_task(&self, engineer: &str, task_id: &str, date: &str) {
        let mut doc = self.read_daily_activities().await;
        if let Some(entry) = doc
            .engineer_daily_data
            .iter_mut()
            .find(|entry| entry.engineer_name == engineer && entry.date == date)
        {
            entry.target_tasks.retain(|t| t.id != task_id);
        }
        self.write_daily_activities(&doc).await;
    }

    // ── project-status.json ──────────────────────────────────────────

    pub async fn read_project_status(&self) -> ProjectStatusDoc {
        self.read_or(PROJECT_STATUS_FILE, || ProjectStatusDoc {
            project_statuses: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_project_status(&self, doc: &ProjectStatusDoc) -> bool {
        let message = format!("Update project status tracking - {}", now_iso());
        self.write_json(PROJECT_STATUS_FILE, doc, &message).await
    }

    /// Set one day's status for an engineer-project pair. An empty status is
    /// stored as-is (it clears the cell on the grid).
    pub async fn update_project_status(
        &self,
        engineer: &str,
        project: &str,
        date: &str,
        status: &str,
    ) -> bool {
        let mut doc = self.read_project_status().await;
        let index = doc
            .project_statuses
            .iter()
            .position(|p| p.engineer_name == engineer && p.project_name == project)
            .unwrap_or_else(|| {
                doc.project_statuses.push(ProjectStatusEntry {
                    engineer_name: engineer.to_string(),
                    project_name: project.to_string(),
                    statuses: Default::default(),
                });
                doc.project_statuses.len() - 1
            });
        doc.project_statuses[index]
            .statuses
            .insert(date.to_string(), status.to_string());
        doc.last_updated = now_iso();
        self.write_project_status(&doc).await
    }

    /// Per-assignment status grid with a completion percentage computed
    /// against the fixed tracking window, not the assignment's own span.
    pub async fn project_status_tracking(&self) -> Vec<ProjectStatusTracking> {
        let assignments = self.project_assignments().await;
        let status_doc = self.read_project_status().await;

        assignments
            .into_iter()
            .map(|assignment| {
                let statuses = status_doc
                    .project_statuses
                    .iter()
                    .find(|p| {
                        p.engineer_name == assignment.engineer
                            && p.project_name == assignment.project_name
                    })
                    .map(|p| p.statuses.clone())
                    .unwrap_or_default();

                let completed_days = statuses
                    .values()
                    .filter(|s| s.as_str() == "Completed" || s.as_str() == "Done")
                    .count();

                ProjectStatusTracking {
                    engineer_name: assignment.engineer,
                    project_name: assignment.project_name,
                    current_status: assignment.status,
                    statuses,
                    completion_percentage: metrics::window_completion_percentage(completed_days),
                }
            })
            .collect()
    }

    // ── project-activities.json ──────────────────────────────────────

    pub async fn read_project_activities(&self) -> ProjectActivitiesDoc {
        self.read_or(PROJECT_ACTIVITIES_FILE, || ProjectActivitiesDoc {
            project_activities: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_project_activities(&self, doc: &ProjectActivitiesDoc) -> bool {
        let message = format!("Update project activities - {}", now_iso());
        self.write_json(PROJECT_ACTIVITIES_FILE, doc, &message).await
    }

    /// One row per distinct assigned project, joined with its activity log.
    /// The sheet's status stands in until an explicit stage has been set.
    pub async fn project_activities(&self) -> Vec<ProjectActivityView> {
        let assignments = self.project_assignments().await;
        let doc = self.read_project_activities().await;

        let mut seen = BTreeSet::new();
        let mut views = Vec::new();
        for assignment in assignments {
            if !seen.insert(assignment.project_name.clone()) {
                continue;
            }
            let entry = doc
                .project_activities
                .iter()
                .find(|p| p.project_name == assignment.project_name);
            views.push(ProjectActivityView {
                project_name: assignment.project_name,
                current_status: entry
                    .map(|e| e.current_status.clone())
                    .unwrap_or(assignment.status),
                activities: entry.map(|e| e.activities.clone()).unwrap_or_default(),
            });
        }
        views
    }

    fn activity_entry<'a>(
        doc: &'a mut ProjectActivitiesDoc,
        project: &str,
        initial_status: &str,
    ) -> &'a mut ProjectActivityEntry {
        let index = doc
            .project_activities
            .iter()
            .position(|p| p.project_name == project)
            .unwrap_or_else(|| {
                doc.project_activities.push(ProjectActivityEntry {
                    project_name: project.to_string(),
                    current_status: initial_status.to_string(),
                    activities: Default::default(),
                });
                doc.project_activities.len() - 1
            });
        &mut doc.project_activities[index]
    }

    /// Set or clear the activity text on one day for a project.
    pub async fn update_project_activity(&self, project: &str, date: &str, activity: &str) -> bool {
        let mut doc = self.read_project_activities().await;
        let entry = Self::activity_entry(&mut doc, project, "In Progress");
        if activity.is_empty() {
            entry.activities.remove(date);
        } else {
            entry
                .activities
                .insert(date.to_string(), activity.to_string());
        }
        doc.last_updated = now_iso();
        self.write_project_activities(&doc).await
    }

    pub async fn update_project_current_status(&self, project: &str, status: &str) -> bool {
        let mut doc = self.read_project_activities().await;
        let entry = Self::activity_entry(&mut doc, project, status);
        entry.current_status = status.to_string();
        doc.last_updated = now_iso();
        self.write_project_activities(&doc).await
    }

    // ── weekly-assignments.json ──────────────────────────────────────

    pub async fn read_weekly_assignments(&self) -> WeeklyAssignmentsDoc {
        self.read_or(WEEKLY_ASSIGNMENTS_FILE, || WeeklyAssignmentsDoc {
            assignments: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_weekly_assignments(&self, doc: &WeeklyAssignmentsDoc) -> bool {
        self.write_json(WEEKLY_ASSIGNMENTS_FILE, doc, "Update weekly assignments")
            .await
    }

    pub async fn weekly_assignments(&self, week_start: Option<&str>) -> Vec<WeeklyAssignment> {
        let doc = self.read_weekly_assignments().await;
        match week_start {
            Some(week) => doc
                .assignments
                .into_iter()
                .filter(|a| a.week_start == week)
                .collect(),
            None => doc.assignments,
        }
    }

    /// Insert or replace an assignment by id.
    pub async fn upsert_weekly_assignment(&self, assignment: WeeklyAssignment) -> bool {
        let mut doc = self.read_weekly_assignments().await;
        match doc.assignments.iter().position(|a| a.id == assignment.id) {
            Some(index) => doc.assignments[index] = assignment,
            None => doc.assignments.push(assignment),
        }
        doc.last_updated = now_iso();
        self.write_weekly_assignments(&doc).await
    }

    pub async fn delete_weekly_assignment(&self, id: &str) -> bool {
        let mut doc = self.read_weekly_assignments().await;
        let before = doc.assignments.len();
        doc.assignments.retain(|a| a.id != id);
        if doc.assignments.len() == before {
            return false;
        }
        doc.last_updated = now_iso();
        self.write_weekly_assignments(&doc).await
    }

    /// Insert or replace a task inside an assignment.
    pub async fn update_assignment_task(
        &self,
        assignment_id: &str,
        task: WeeklyAssignmentTask,
    ) -> bool {
        let mut doc = self.read_weekly_assignments().await;
        let Some(assignment) = doc.assignments.iter_mut().find(|a| a.id == assignment_id) else {
            return false;
        };
        match assignment.tasks.iter().position(|t| t.id == task.id) {
            Some(index) => assignment.tasks[index] = task,
            None => assignment.tasks.push(task),
        }
        doc.last_updated = now_iso();
        self.write_weekly_assignments(&doc).await
    }

    pub async fn delete_assignment_task(&self, assignment_id: &str, task_id: &str) -> bool {
        let mut doc = self.read_weekly_assignments().await;
        let Some(assignment) = doc.assignments.iter_mut().find(|a| a.id == assignment_id) else {
            return false;
        };
        let before = assignment.tasks.len();
        assignment.tasks.retain(|t| t.id != task_id);
        if assignment.tasks.len() == before {
            return false;
        }
        doc.last_updated = now_iso();
        self.write_weekly_assignments(&doc).await
    }

    /// Id for a new weekly assignment when the client did not pick one.
    pub fn assignment_id(engineer: &str, week_start: &str) -> String {
        format!("{}-{}-{}", engineer, week_start, epoch_millis())
    }

    /// Id for a new task inside an assignment.
    pub fn task_id() -> String {
        format!("task-{}", epoch_millis())
    }

    // ── engineer roster documents ────────────────────────────────────

    pub async fn read_master_list(&self) -> RosterDoc {
        self.read_or(MASTER_LIST_FILE, || RosterDoc {
            engineers: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_master_list(&self, doc: &RosterDoc) -> bool {
        let message = format!("Update engineers master list - {}", now_iso());
        self.write_json(MASTER_LIST_FILE, doc, &message).await
    }

    /// Seed the master list with the default roster if it is empty.
    pub async fn initialize_master_list(&self) -> bool {
        let existing = self.read_master_list().await;
        if !existing.engineers.is_empty() {
            return true;
        }
        let doc = RosterDoc {
            engineers: default_roster(),
            last_updated: now_iso(),
        };
        self.write_master_list(&doc).await
    }

    /// The roster used by the daily-tasks board. The master list is the
    /// source of truth; it is initialized on first use.
    pub async fn daily_tasks_config(&self) -> Vec<RosterEntry> {
        let master = self.read_master_list().await;
        if !master.engineers.is_empty() {
            return master.engineers;
        }
        self.initialize_master_list().await;
        self.read_master_list().await.engineers
    }

    pub async fn read_daily_tasks_file(&self) -> RosterDoc {
        self.read_or(DAILY_TASKS_CONFIG_FILE, || RosterDoc {
            engineers: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_daily_tasks_file(&self, doc: &RosterDoc) -> bool {
        let message = format!("Update engineer daily tasks config - {}", now_iso());
        self.write_json(DAILY_TASKS_CONFIG_FILE, doc, &message).await
    }

    /// Seed the legacy daily-tasks roster file if it is empty.
    pub async fn initialize_daily_tasks_file(&self) -> bool {
        let existing = self.read_daily_tasks_file().await;
        if !existing.engineers.is_empty() {
            return true;
        }
        let doc = RosterDoc {
            engineers: default_roster(),
            last_updated: now_iso(),
        };
        self.write_daily_tasks_file(&doc).await
    }

    pub async fn remove_engineers_from_config(&self, names: &[String]) -> bool {
        let existing = self.read_daily_tasks_file().await;
        let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let doc = RosterDoc {
            engineers: existing
                .engineers
                .into_iter()
                .filter(|e| !lower.contains(&e.name.to_lowercase()))
                .collect(),
            last_updated: now_iso(),
        };
        self.write_daily_tasks_file(&doc).await
    }

    /// Replace the master list wholesale, deriving missing ids and initials.
    pub async fn replace_master_list(&self, engineers: Vec<(Option<String>, String, Option<String>)>) -> RosterDoc {
        let doc = RosterDoc {
            engineers: engineers
                .into_iter()
                .enumerate()
                .map(|(index, (id, name, initials))| RosterEntry {
                    id: id.unwrap_or_else(|| format!("eng-{}", index + 1)),
                    initials: initials.unwrap_or_else(|| derive_initials(&name)),
                    name,
                })
                .collect(),
            last_updated: now_iso(),
        };
        self.write_master_list(&doc).await;
        doc
    }

    // ── engineers_auth.json ──────────────────────────────────────────

    pub async fn read_credentials(&self) -> CredentialsDoc {
        self.read_or(CREDENTIALS_FILE, || CredentialsDoc {
            engineers: Vec::new(),
            last_updated: now_iso(),
        })
        .await
    }

    pub async fn write_credentials(&self, doc: &CredentialsDoc) -> bool {
        let message = format!("Update engineer credentials - {}", now_iso());
        self.write_json(CREDENTIALS_FILE, doc, &message).await
    }

    /// Username/password check against the credentials document. A match
    /// stamps `lastLogin` and persists it.
    pub async fn authenticate_engineer(
        &self,
        username: &str,
        password: &str,
    ) -> Option<EngineerCredential> {
        let mut doc = self.read_credentials().await;
        let found = doc.engineers.iter_mut().find(|e| {
            e.username.eq_ignore_ascii_case(username) && e.password == password && e.is_active
        })?;

        found.last_login = Some(now_iso());
        let result = found.clone();
        self.write_credentials(&doc).await;
        Some(result)
    }

    pub async fn update_engineer_password(&self, username: &str, new_password: &str) -> bool {
        let mut doc = self.read_credentials().await;
        let Some(engineer) = doc
            .engineers
            .iter_mut()
            .find(|e| e.username.eq_ignore_ascii_case(username))
        else {
            return false;
        };
        engineer.password = new_password.to_string();
        doc.last_updated = now_iso();
        self.write_credentials(&doc).await
    }

    /// Create credentials for every master-list engineer that has none yet,
    /// plus the default admin account. Returns (success, created count).
    pub async fn initialize_credentials(&self) -> (bool, usize) {
        let master = self.read_master_list().await;
        let mut doc = self.read_credentials().await;

        let existing: BTreeSet<String> = doc
            .engineers
            .iter()
            .map(|e| e.username.to_lowercase())
            .collect();

        let mut created = 0;
        for engineer in &master.engineers {
            let username = derive_username(&engineer.name);
            if existing.contains(&username) {
                continue;
            }
            doc.engineers.push(EngineerCredential {
                id: engineer.id.clone(),
                name: engineer.name.clone(),
                username,
                password: DEFAULT_ENGINEER_PASSWORD.to_string(),
                role: CredentialRole::Engineer,
                company: company_of(&engineer.name),
                is_active: true,
                created_at: now_iso(),
                last_login: None,
            });
            created += 1;
        }

        if !existing.contains("admin") {
            doc.engineers.push(EngineerCredential {
                id: "admin-1".to_string(),
                name: "Admin".to_string(),
                username: "admin".to_string(),
                password: DEFAULT_ADMIN_PASSWORD.to_string(),
                role: CredentialRole::Admin,
                company: None,
                is_active: true,
                created_at: now_iso(),
                last_login: None,
            });
            created += 1;
        }

        doc.last_updated = now_iso();
        let success = self.write_credentials(&doc).await;
        (success, created)
    }

    /// Update a credential matched by id or username, or create a new one
    /// with derived defaults. Returns the stored credential when the write
    /// succeeded.
    pub async fn upsert_credential(&self, input: CredentialUpsert) -> Option<EngineerCredential> {
        let mut doc = self.read_credentials().await;

        let position = doc.engineers.iter().position(|e| {
            input.id.as_deref() == Some(e.id.as_str())
                || input
                    .username
                    .as_deref()
                    .is_some_and(|u| u.eq_ignore_ascii_case(&e.username))
        });

        let result = match position {
            Some(index) => {
                let existing = &mut doc.engineers[index];
                existing.name = input.name;
                if let Some(username) = input.username {
                    existing.username = username;
                }
                if let Some(password) = input.password {
                    existing.password = password;
                }
                if let Some(role) = input.role {
                    existing.role = role;
                }
                if let Some(company) = input.company {
                    existing.company = Some(company);
                }
                if let Some(is_active) = input.is_active {
                    existing.is_active = is_active;
                }
                existing.clone()
            }
            None => {
                let username = input
                    .username
                    .unwrap_or_else(|| derive_username(&input.name));
                let credential = EngineerCredential {
                    id: input.id.unwrap_or_else(|| format!("eng-{}", epoch_millis())),
                    name: input.name,
                    username,
                    password: input
                        .password
                        .unwrap_or_else(|| DEFAULT_ENGINEER_PASSWORD.to_string()),
                    role: input.role.unwrap_or(CredentialRole::Engineer),
                    company: input.company,
                    is_active: input.is_active.unwrap_or(true),
                    created_at: now_iso(),
                    last_login: None,
                };
                doc.engineers.push(credential.clone());
                credential
            }
        };

        doc.last_updated = now_iso();
        if self.write_credentials(&doc).await {
            Some(result)
        } else {
            None
        }
    }

    pub async fn delete_credential(&self, id: &str) -> bool {
        let mut doc = self.read_credentials().await;
        let before = doc.engineers.len();
        doc.engineers.retain(|e| e.id != id);
        if doc.engineers.len() == before {
            return false;
        }
        doc.last_updated = now_iso();
        self.write_credentials(&doc).await
    }
}
