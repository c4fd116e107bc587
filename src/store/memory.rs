//! Session-scoped in-memory store.
//!
//! Users, team members, projects, notifications, and comments live here for
//! the lifetime of the process; engineer task flags and the mirrored daily
//! entries are keyed the same way the remote documents key them. Uniqueness
//! is maintained by linear scan, matching the document store's behavior.

use tokio::sync::RwLock;

use crate::models::{
    Comment, InsertComment, InsertNotification, InsertProject, InsertTeamMember, MemberStatus,
    Notification, Project, TaskEntry, TeamMember, User, UserRole,
};
use crate::store::documents::new_id;

/// A free-text entry pinned to a date, mirroring the remote day entries.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatedEntry {
    pub id: String,
    pub text: String,
    pub date: String,
}

impl DatedEntry {
    pub fn to_task_entry(&self) -> TaskEntry {
        TaskEntry {
            id: self.id.clone(),
            text: self.text.clone(),
        }
    }
}

#[derive(Default)]
pub struct MemStore {
    users: RwLock<Vec<User>>,
    team_members: RwLock<Vec<TeamMember>>,
    projects: RwLock<Vec<Project>>,
    notifications: RwLock<Vec<Notification>>,
    comments: RwLock<Vec<Comment>>,
    /// engineer → "{projectId}-{date}" → completed
    task_flags: RwLock<Vec<(String, Vec<(String, bool)>)>>,
    activities: RwLock<Vec<(String, Vec<DatedEntry>)>>,
    target_tasks: RwLock<Vec<(String, Vec<DatedEntry>)>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Self::seed_users()),
            notifications: RwLock::new(Self::seed_notifications()),
            ..Default::default()
        }
    }

    fn seed_users() -> Vec<User> {
        let seed = [
            ("admin", "admin123", "Admin User", UserRole::Admin),
            ("manager", "manager123", "Manager User", UserRole::Manager),
            ("member", "member123", "Team Member", UserRole::Member),
        ];
        seed.into_iter()
            .map(|(username, password, name, role)| User {
                id: new_id(),
                username: username.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                email: format!("{}@drbtechverse.in", username),
                role,
                status: "active".to_string(),
                avatar: None,
            })
            .collect()
    }

    fn seed_notifications() -> Vec<Notification> {
        let seed = [
            ("deadline", "Deadline Approaching", "Multiple projects due soon", "false", "2 hours ago"),
            ("update", "Project Update", "Team assignments updated", "false", "5 hours ago"),
            ("mention", "You were mentioned", "Review pending assignments", "false", "Yesterday"),
            ("alert", "Project Progress", "Several projects nearing completion", "true", "2 days ago"),
            ("update", "Assignments Completed", "Multiple projects successfully completed", "true", "3 days ago"),
        ];
        seed.into_iter()
            .map(|(kind, title, message, read, created_at)| Notification {
                id: new_id(),
                kind: kind.to_string(),
                title: title.to_string(),
                message: message.to_string(),
                read: read.to_string(),
                created_at: created_at.to_string(),
                project_id: None,
                user_id: None,
            })
            .collect()
    }

    // ── users ────────────────────────────────────────────────────────

    pub async fn user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    // ── team members ─────────────────────────────────────────────────

    pub async fn team_members(&self) -> Vec<TeamMember> {
        self.team_members.read().await.clone()
    }

    pub async fn team_member(&self, id: &str) -> Option<TeamMember> {
        self.team_members
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub async fn set_team_members(&self, members: Vec<TeamMember>) {
        *self.team_members.write().await = members;
    }

    pub async fn create_team_member(&self, insert: InsertTeamMember) -> TeamMember {
        let member = TeamMember {
            id: new_id(),
            name: insert.name,
            role: insert.role,
            email: insert.email,
            department: insert.department,
            status: insert.status.unwrap_or(MemberStatus::Active),
            avatar: insert.avatar,
        };
        self.team_members.write().await.push(member.clone());
        member
    }

    /// Only the name is updatable through the API.
    pub async fn update_team_member_name(&self, id: &str, name: Option<String>) -> Option<TeamMember> {
        let mut members = self.team_members.write().await;
        let member = members.iter_mut().find(|m| m.id == id)?;
        if let Some(name) = name {
            member.name = name;
        }
        Some(member.clone())
    }

    // ── projects ─────────────────────────────────────────────────────

    pub async fn projects(&self) -> Vec<Project> {
        self.projects.read().await.clone()
    }

    pub async fn project(&self, id: &str) -> Option<Project> {
        self.projects
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn project_by_name(&self, name: &str) -> Option<Project> {
        self.projects
            .read()
            .await
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub async fn set_projects(&self, projects: Vec<Project>) {
        *self.projects.write().await = projects;
    }

    pub async fn create_project(&self, insert: InsertProject) -> Project {
        let project = Project {
            id: new_id(),
            name: insert.name,
            description: insert.description,
            status: insert.status.unwrap_or(crate::models::ProjectStatus::InProgress),
            progress: insert.progress.unwrap_or(0),
            priority: insert.priority.unwrap_or(crate::models::Priority::Medium),
            due_date: insert.due_date,
        };
        self.projects.write().await.push(project.clone());
        project
    }

    // ── notifications ────────────────────────────────────────────────

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    pub async fn create_notification(&self, insert: InsertNotification) -> Notification {
        let notification = Notification {
            id: new_id(),
            kind: insert.kind,
            title: insert.title,
            message: insert.message,
            read: insert.read.unwrap_or_else(|| "false".to_string()),
            created_at: insert.created_at,
            project_id: insert.project_id,
            user_id: insert.user_id,
        };
        self.notifications.write().await.push(notification.clone());
        notification
    }

    pub async fn mark_notification_read(&self, id: &str) -> bool {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = "true".to_string();
                true
            }
            None => false,
        }
    }

    pub async fn mark_all_notifications_read(&self) {
        for notification in self.notifications.write().await.iter_mut() {
            notification.read = "true".to_string();
        }
    }

    // ── comments ─────────────────────────────────────────────────────

    pub async fn comments_by_project(&self, project_id: &str) -> Vec<Comment> {
        self.comments
            .read()
            .await
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect()
    }

    pub async fn create_comment(&self, insert: InsertComment, project_id: String) -> Comment {
        let comment = Comment {
            id: new_id(),
            content: insert.content,
            project_id,
            author_id: insert.author_id,
            author_name: insert.author_name,
            created_at: insert.created_at,
            mentions: insert.mentions,
        };
        self.comments.write().await.push(comment.clone());
        comment
    }

    // ── engineer session state ───────────────────────────────────────

    pub async fn set_task_completion(
        &self,
        engineer: &str,
        project_id: &str,
        date: &str,
        completed: bool,
    ) {
        let key = format!("{}-{}", project_id, date);
        let mut flags = self.task_flags.write().await;
        let engineer_index = flags
            .iter()
            .position(|(name, _)| name == engineer)
            .unwrap_or_else(|| {
                flags.push((engineer.to_string(), Vec::new()));
                flags.len() - 1
            });
        let entry = &mut flags[engineer_index].1;
        match entry.iter().position(|(k, _)| *k == key) {
            Some(index) => entry[index].1 = completed,
            None => entry.push((key, completed)),
        }
    }

    pub async fn task_completed(&self, engineer: &str, project_id: &str, date: &str) -> bool {
        let key = format!("{}-{}", project_id, date);
        self.task_flags
            .read()
            .await
            .iter()
            .find(|(name, _)| name == engineer)
            .and_then(|(_, entry)| entry.iter().find(|(k, _)| *k == key))
            .is_some_and(|(_, completed)| *completed)
    }

    fn entries_for<'a>(
        list: &'a mut Vec<(String, Vec<DatedEntry>)>,
        engineer: &str,
    ) -> &'a mut Vec<DatedEntry> {
        let index = list
            .iter()
            .position(|(name, _)| name == engineer)
            .unwrap_or_else(|| {
                list.push((engineer.to_string(), Vec::new()));
                list.len() - 1
            });
        &mut list[index].1
    }

    /// Replace one day's mirrored activities with the remote copy, keeping
    /// other days intact.
    pub async fn replace_day_activities(&self, engineer: &str, date: &str, entries: Vec<TaskEntry>) {
        let mut activities = self.activities.write().await;
        let list = Self::entries_for(&mut activities, engineer);
        list.retain(|e| e.date != date);
        list.extend(entries.into_iter().map(|e| DatedEntry {
            id: e.id,
            text: e.text,
            date: date.to_string(),
        }));
    }

    pub async fn replace_day_target_tasks(&self, engineer: &str, date: &str, entries: Vec<TaskEntry>) {
        let mut targets = self.target_tasks.write().await;
        let list = Self::entries_for(&mut targets, engineer);
        list.retain(|e| e.date != date);
        list.extend(entries.into_iter().map(|e| DatedEntry {
            id: e.id,
            text: e.text,
            date: date.to_string(),
        }));
    }

    pub async fn add_activity(&self, engineer: &str, entry: DatedEntry) {
        let mut activities = self.activities.write().await;
        Self::entries_for(&mut activities, engineer).push(entry);
    }

    pub async fn delete_activity(&self, engineer: &str, id: &str, date: &str) {
        let mut activities = self.activities.write().await;
        Self::entries_for(&mut activities, engineer).retain(|e| !(e.id == id && e.date == date));
    }

    pub async fn activities_for(&self, engineer: &str, date: &str) -> Vec<TaskEntry> {
        self.activities
            .read()
            .await
            .iter()
            .find(|(name, _)| name == engineer)
            .map(|(_, entries)| {
                entries
                    .iter()
                    .filter(|e| e.date == date)
                    .map(DatedEntry::to_task_entry)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn add_target_task(&self, engineer: &str, entry: DatedEntry) {
        let mut targets = self.target_tasks.write().await;
        Self::entries_for(&mut targets, engineer).push(entry);
    }

    pub async fn delete_target_task(&self, engineer: &str, id: &str, date: &str) {
        let mut targets = self.target_tasks.write().await;
        Self::entries_for(&mut targets, engineer).retain(|e| !(e.id == id && e.date == date));
    }

    pub async fn target_tasks_for(&self, engineer: &str, date: &str) -> Vec<TaskEntry> {
        self.target_tasks
            .read()
            .await
            .iter()
            .find(|(name, _)| name == engineer)
            .map(|(_, entries)| {
                entries
                    .iter()
                    .filter(|e| e.date == date)
                    .map(DatedEntry::to_task_entry)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Target tasks dated strictly before `before_date`.
    pub async fn pending_target_tasks(&self, engineer: &str, before_date: &str) -> Vec<DatedEntry> {
        self.target_tasks
            .read()
            .await
            .iter()
            .find(|(name, _)| name == engineer)
            .map(|(_, entries)| {
                entries
                    .iter()
                    .filter(|e| e.date.as_str() < before_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
