use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow status of a task. `WaitingFor` carries who we are waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Stuck,
    Done,
    WaitingFor { waiting_for: String },
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

impl TaskStatus {
    pub fn label(&self) -> &str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Stuck => "Stuck",
            TaskStatus::Done => "Done",
            TaskStatus::WaitingFor { .. } => "Waiting",
        }
    }
}

/// Rejected schedule edits. Surfaced to the caller; the document stays as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    EndNotAfterStart,
}

impl ScheduleError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::EndNotAfterStart => "schedule end must be after its start",
        }
    }
}

/// When a task happens: either a time range or a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Point {
        at: DateTime<Utc>,
    },
}

impl Schedule {
    /// Build a range schedule, rejecting `end <= start` at the edit boundary.
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ScheduleError> {
        if end <= start {
            return Err(ScheduleError::EndNotAfterStart);
        }
        Ok(Schedule::Range { start, end })
    }

    pub fn point(at: DateTime<Utc>) -> Self {
        Schedule::Point { at }
    }

    /// Start/end as epoch milliseconds; a point spans zero width.
    pub fn span_ms(&self) -> (i64, i64) {
        match self {
            Schedule::Range { start, end } => (start.timestamp_millis(), end.timestamp_millis()),
            Schedule::Point { at } => {
                let ms = at.timestamp_millis();
                (ms, ms)
            }
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.span_ms().0
    }

    pub fn end_ms(&self) -> i64 {
        self.span_ms().1
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Schedule::Point { .. })
    }
}

/// A single task. Used for both milestones and subtasks: a task with
/// `parent_task_id = None` is a milestone owned directly by its project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub parent_task_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub child_task_ids: Vec<Uuid>,
}

fn default_priority() -> i32 {
    1
}

fn default_color() -> String {
    "auto".to_string()
}

impl Task {
    /// Create a new task with sensible defaults.
    pub fn new(
        project_id: Uuid,
        parent_task_id: Option<Uuid>,
        schedule: Schedule,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            parent_task_id,
            title: title.into(),
            details: String::new(),
            status: TaskStatus::NotStarted,
            priority: default_priority(),
            tags: Vec::new(),
            color: default_color(),
            schedule,
            people: Vec::new(),
            notes: String::new(),
            child_task_ids: Vec::new(),
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.parent_task_id.is_none()
    }
}

/// Field-wise partial update for a task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub details: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub schedule: Option<Schedule>,
    pub people: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl TaskPatch {
    pub fn schedule(schedule: Schedule) -> Self {
        Self {
            schedule: Some(schedule),
            ..Default::default()
        }
    }

    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(details) = self.details {
            task.details = details;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(color) = self.color {
            task.color = color;
        }
        if let Some(schedule) = self.schedule {
            task.schedule = schedule;
        }
        if let Some(people) = self.people {
            task.people = people;
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn range_requires_end_after_start() {
        assert!(Schedule::range(at(100), at(200)).is_ok());
        assert_eq!(
            Schedule::range(at(200), at(200)),
            Err(ScheduleError::EndNotAfterStart)
        );
        assert_eq!(
            Schedule::range(at(300), at(200)),
            Err(ScheduleError::EndNotAfterStart)
        );
    }

    #[test]
    fn point_spans_zero_width() {
        let s = Schedule::point(at(42));
        assert_eq!(s.span_ms(), (42_000, 42_000));
        assert!(s.is_point());
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut task = Task::new(Uuid::new_v4(), None, Schedule::point(at(0)), "a");
        task.notes = "keep me".to_string();
        TaskPatch {
            title: Some("b".to_string()),
            priority: Some(3),
            ..Default::default()
        }
        .apply_to(&mut task);
        assert_eq!(task.title, "b");
        assert_eq!(task.priority, 3);
        assert_eq!(task.notes, "keep me");
    }
}
