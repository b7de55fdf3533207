pub mod document;
pub mod history;
pub mod project;
pub mod task;

pub use document::{AppSettings, BackupInfo, Document, ProjectLock, ThemeMode, UiState};
pub use history::UndoHistory;
pub use project::{Project, ProjectPatch, TimeRange};
pub use task::{Schedule, ScheduleError, Task, TaskPatch, TaskStatus};
