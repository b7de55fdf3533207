use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The horizon a project is planned across. `is_user_defined` records whether
/// the user set it explicitly or it is still the creation default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_user_defined: bool,
}

impl TimeRange {
    /// Default planning horizon: one month starting now.
    pub fn month_from(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::days(30),
            is_user_defined: false,
        }
    }

    pub fn span_ms(&self) -> (i64, i64) {
        (self.start.timestamp_millis(), self.end.timestamp_millis())
    }
}

/// A project groups milestone tasks under a shared planning horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub detailed_description: String,
    #[serde(default)]
    pub notebook: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub time_range: TimeRange,
    #[serde(default)]
    pub milestone_ids: Vec<Uuid>,
}

fn default_color() -> String {
    "auto".to_string()
}

impl Project {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            short_description: String::new(),
            detailed_description: String::new(),
            notebook: String::new(),
            tags: Vec::new(),
            color: default_color(),
            time_range: TimeRange::month_from(now),
            milestone_ids: Vec::new(),
        }
    }
}

/// Field-wise partial update for a project. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub detailed_description: Option<String>,
    pub notebook: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub time_range: Option<TimeRange>,
}

impl ProjectPatch {
    pub fn apply_to(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(short) = self.short_description {
            project.short_description = short;
        }
        if let Some(detailed) = self.detailed_description {
            project.detailed_description = detailed;
        }
        if let Some(notebook) = self.notebook {
            project.notebook = notebook;
        }
        if let Some(tags) = self.tags {
            project.tags = tags;
        }
        if let Some(color) = self.color {
            project.color = color;
        }
        if let Some(time_range) = self.time_range {
            project.time_range = time_range;
        }
    }
}
