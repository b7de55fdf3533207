use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Project;
use super::task::Task;

pub const SCHEMA_VERSION: u32 = 1;

/// How long a project's advisory lock lasts from the most recent lock action.
pub const LOCK_DURATION_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    System,
    Light,
    Dark,
}

/// Application-wide settings, persisted with the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub timezone: String,
    pub date_format: String,
    pub rtl: bool,
    pub theme: ThemeMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            date_format: "DD/MM/YY".to_string(),
            rtl: true,
            theme: ThemeMode::System,
        }
    }
}

/// Session-local advisory claim on a project's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLock {
    pub locked_until_ms: i64,
}

/// UI-facing state carried inside the document: display order of projects and
/// the session's advisory locks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub project_order: Vec<Uuid>,
    #[serde(default)]
    pub locked_projects: HashMap<Uuid, ProjectLock>,
}

impl UiState {
    /// Claim (or refresh) the lock on a project for the fixed lock duration.
    pub fn lock_project(&mut self, project_id: Uuid, now_ms: i64) {
        self.locked_projects.insert(
            project_id,
            ProjectLock {
                locked_until_ms: now_ms + LOCK_DURATION_MS,
            },
        );
    }

    pub fn is_locked(&self, project_id: Uuid, now_ms: i64) -> bool {
        self.locked_projects
            .get(&project_id)
            .is_some_and(|lock| lock.locked_until_ms > now_ms)
    }

    /// Drop every lock that has expired. Returns the nearest remaining expiry
    /// so the caller can schedule the next sweep.
    pub fn expire_locks(&mut self, now_ms: i64) -> Option<i64> {
        self.locked_projects
            .retain(|_, lock| lock.locked_until_ms > now_ms);
        self.locked_projects
            .values()
            .map(|lock| lock.locked_until_ms)
            .min()
    }
}

/// Descriptor of a backup snapshot held by the state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub reason: String,
    pub file_name: String,
}

/// The whole application document. Loaded and saved wholesale; every undo
/// snapshot is a deep clone of this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub schema_version: u32,
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub ui_state: UiState,
    #[serde(default)]
    pub projects: HashMap<Uuid, Project>,
    #[serde(default)]
    pub tasks: HashMap<Uuid, Task>,
    #[serde(default)]
    pub backups: Vec<BackupInfo>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            app: AppSettings::default(),
            ui_state: UiState::default(),
            projects: HashMap::new(),
            tasks: HashMap::new(),
            backups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_expire_and_report_next_expiry() {
        let mut ui = UiState::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        ui.lock_project(a, 0);
        ui.lock_project(b, 1_000);
        assert!(ui.is_locked(a, 10));
        assert!(!ui.is_locked(a, LOCK_DURATION_MS));

        let next = ui.expire_locks(LOCK_DURATION_MS);
        assert!(!ui.locked_projects.contains_key(&a));
        assert_eq!(next, Some(1_000 + LOCK_DURATION_MS));
    }
}
