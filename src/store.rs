use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Document, Project, ProjectPatch, Schedule, Task, TaskPatch, UndoHistory};

/// Whether a mutation records an undo checkpoint first or applies raw.
///
/// Undo/redo installs and mid-gesture drag updates go through `Bypass`, so
/// history transitions never create spurious entries of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    Record,
    Bypass,
}

/// In-memory document plus its undo/redo stacks. Every mutation of the
/// document goes through here; operations targeting a missing id are silent
/// no-ops (stale UI references are legitimate), everything else records a
/// deep pre-mutation snapshot before applying.
pub struct DocumentStore {
    doc: Document,
    history: UndoHistory,
}

impl DocumentStore {
    pub fn new(mut doc: Document) -> Self {
        repair(&mut doc);
        Self {
            doc,
            history: UndoHistory::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Install a wholesale-loaded document (startup load, backup restore).
    /// The history refers to the previous document, so it is dropped.
    pub fn replace(&mut self, mut doc: Document) {
        repair(&mut doc);
        self.doc = doc;
        self.history.clear();
    }

    fn checkpoint(&mut self, mode: History) {
        if mode == History::Record {
            self.history.record(self.doc.clone());
        }
    }

    // --- Project operations ---

    /// Create a project with the default one-month horizon and prepend it to
    /// the display order. Returns the fresh id.
    pub fn create_project(&mut self, now: DateTime<Utc>) -> Uuid {
        self.checkpoint(History::Record);
        let project = Project::new("Untitled Project", now);
        let id = project.id;
        self.doc.projects.insert(id, project);
        self.doc.ui_state.project_order.insert(0, id);
        id
    }

    /// Shallow-merge the given fields into an existing project.
    pub fn update_project(&mut self, id: Uuid, patch: ProjectPatch) {
        if !self.doc.projects.contains_key(&id) {
            return;
        }
        self.checkpoint(History::Record);
        if let Some(project) = self.doc.projects.get_mut(&id) {
            patch.apply_to(project);
        }
    }

    /// Remove a project and every task that belongs to it, at any depth.
    pub fn delete_project(&mut self, id: Uuid) {
        if !self.doc.projects.contains_key(&id) {
            return;
        }
        self.checkpoint(History::Record);
        self.doc.projects.remove(&id);
        self.doc.tasks.retain(|_, task| task.project_id != id);
        self.doc.ui_state.project_order.retain(|pid| *pid != id);
        self.doc.ui_state.locked_projects.remove(&id);
        repair(&mut self.doc);
    }

    /// Replace the project display order wholesale.
    pub fn reorder_projects(&mut self, order: Vec<Uuid>) {
        self.checkpoint(History::Record);
        self.doc.ui_state.project_order = order;
        repair(&mut self.doc);
    }

    // --- Task operations ---

    /// Create a milestone task under a project. Returns `None` (and changes
    /// nothing) when the project does not exist.
    pub fn create_milestone(
        &mut self,
        project_id: Uuid,
        schedule: Schedule,
        title: impl Into<String>,
    ) -> Option<Uuid> {
        if !self.doc.projects.contains_key(&project_id) {
            return None;
        }
        self.checkpoint(History::Record);
        let task = Task::new(project_id, None, schedule, title);
        let id = task.id;
        self.doc.tasks.insert(id, task);
        if let Some(project) = self.doc.projects.get_mut(&project_id) {
            project.milestone_ids.push(id);
        }
        Some(id)
    }

    /// Create a subtask under an existing parent task.
    pub fn create_subtask(
        &mut self,
        parent_task_id: Uuid,
        schedule: Schedule,
        title: impl Into<String>,
    ) -> Option<Uuid> {
        let project_id = self.doc.tasks.get(&parent_task_id)?.project_id;
        self.checkpoint(History::Record);
        let task = Task::new(project_id, Some(parent_task_id), schedule, title);
        let id = task.id;
        self.doc.tasks.insert(id, task);
        if let Some(parent) = self.doc.tasks.get_mut(&parent_task_id) {
            parent.child_task_ids.push(id);
        }
        Some(id)
    }

    /// Shallow-merge the given fields into an existing task, recording an
    /// undo checkpoint.
    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) {
        self.apply_task_patch(id, patch, History::Record);
    }

    /// History-free variant of [`DocumentStore::update_task`], used for the
    /// follow-up steps of a drag gesture after its first recorded update.
    pub fn update_task_raw(&mut self, id: Uuid, patch: TaskPatch) {
        self.apply_task_patch(id, patch, History::Bypass);
    }

    fn apply_task_patch(&mut self, id: Uuid, patch: TaskPatch, mode: History) {
        if !self.doc.tasks.contains_key(&id) {
            return;
        }
        self.checkpoint(mode);
        if let Some(task) = self.doc.tasks.get_mut(&id) {
            patch.apply_to(task);
        }
    }

    /// Remove a task and its whole descendant subtree, detaching it from its
    /// parent's child list or its project's milestone list.
    ///
    /// Descendants are discovered with an explicit worklist over the
    /// pre-mutation document, so deep hierarchies neither recurse nor observe
    /// partial deletions.
    pub fn delete_task(&mut self, task_id: Uuid) {
        if !self.doc.tasks.contains_key(&task_id) {
            return;
        }
        self.checkpoint(History::Record);

        let mut doomed: Vec<Uuid> = Vec::new();
        let mut worklist = vec![task_id];
        while let Some(id) = worklist.pop() {
            if let Some(task) = self.doc.tasks.get(&id) {
                worklist.extend(task.child_task_ids.iter().copied());
            }
            doomed.push(id);
        }

        if let Some(task) = self.doc.tasks.get(&task_id) {
            let project_id = task.project_id;
            match task.parent_task_id {
                None => {
                    if let Some(project) = self.doc.projects.get_mut(&project_id) {
                        project.milestone_ids.retain(|mid| *mid != task_id);
                    }
                }
                Some(parent_id) => {
                    if let Some(parent) = self.doc.tasks.get_mut(&parent_id) {
                        parent.child_task_ids.retain(|cid| *cid != task_id);
                    }
                }
            }
        }
        for id in doomed {
            self.doc.tasks.remove(&id);
        }
        repair(&mut self.doc);
    }

    // --- Undo / redo ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.doc.clone()) {
            Some(snapshot) => {
                self.doc = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.doc.clone()) {
            Some(snapshot) => {
                self.doc = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Adopt the backup descriptors the state store appended while saving.
    /// External bookkeeping, so never recorded.
    pub fn adopt_backups(&mut self, backups: Vec<crate::model::BackupInfo>) {
        self.doc.backups = backups;
    }

    // --- Advisory locks (session-local, never recorded) ---

    pub fn lock_project(&mut self, project_id: Uuid, now_ms: i64) {
        if !self.doc.projects.contains_key(&project_id) {
            return;
        }
        self.doc.ui_state.lock_project(project_id, now_ms);
    }

    pub fn is_locked(&self, project_id: Uuid, now_ms: i64) -> bool {
        self.doc.ui_state.is_locked(project_id, now_ms)
    }

    pub fn expire_locks(&mut self, now_ms: i64) -> Option<i64> {
        self.doc.ui_state.expire_locks(now_ms)
    }

    // --- Queries ---

    /// Projects in display order: the order list deduplicated and filtered to
    /// live projects, with any project the list lost appended at the end.
    pub fn ordered_projects(&self) -> Vec<&Project> {
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut out: Vec<&Project> = Vec::with_capacity(self.doc.projects.len());
        for id in &self.doc.ui_state.project_order {
            if seen.insert(*id) {
                if let Some(project) = self.doc.projects.get(id) {
                    out.push(project);
                }
            }
        }
        let mut stray: Vec<&Project> = self
            .doc
            .projects
            .values()
            .filter(|p| !seen.contains(&p.id))
            .collect();
        stray.sort_by_key(|p| p.id);
        out.extend(stray);
        out
    }

    /// Milestones of a project, in milestone-list order. Entries that are
    /// missing or have grown a parent are skipped.
    pub fn milestones_of(&self, project_id: Uuid) -> Vec<&Task> {
        let Some(project) = self.doc.projects.get(&project_id) else {
            return Vec::new();
        };
        project
            .milestone_ids
            .iter()
            .filter_map(|id| self.doc.tasks.get(id))
            .filter(|task| task.parent_task_id.is_none())
            .collect()
    }

    /// Children of a task, in child-list order, skipping ids that no longer
    /// resolve.
    pub fn subtasks_of(&self, task_id: Uuid) -> Vec<&Task> {
        let Some(task) = self.doc.tasks.get(&task_id) else {
            return Vec::new();
        };
        task.child_task_ids
            .iter()
            .filter_map(|id| self.doc.tasks.get(id))
            .collect()
    }
}

/// One-pass consistency fixer run inside structural mutations: drops
/// dangling or duplicated references so the id lists always point at live
/// entities of the right shape.
fn repair(doc: &mut Document) {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let projects = &doc.projects;
    doc.ui_state
        .project_order
        .retain(|id| projects.contains_key(id) && seen.insert(*id));
    doc.ui_state
        .locked_projects
        .retain(|id, _| projects.contains_key(id));

    let task_snapshot: HashSet<Uuid> = doc.tasks.keys().copied().collect();
    let milestone_owner: std::collections::HashMap<Uuid, Uuid> = doc
        .tasks
        .values()
        .filter(|t| t.parent_task_id.is_none())
        .map(|t| (t.id, t.project_id))
        .collect();

    for project in doc.projects.values_mut() {
        let mut seen: HashSet<Uuid> = HashSet::new();
        let pid = project.id;
        project
            .milestone_ids
            .retain(|id| milestone_owner.get(id) == Some(&pid) && seen.insert(*id));
    }
    for task in doc.tasks.values_mut() {
        let mut seen: HashSet<Uuid> = HashSet::new();
        task.child_task_ids
            .retain(|id| task_snapshot.contains(id) && seen.insert(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn point() -> Schedule {
        Schedule::point(now())
    }

    fn range() -> Schedule {
        Schedule::range(now(), now() + chrono::Duration::hours(2)).unwrap()
    }

    fn store() -> DocumentStore {
        DocumentStore::new(Document::default())
    }

    #[test]
    fn create_undo_redo_round_trip() {
        let mut store = store();
        store.create_project(now());
        store.create_project(now());
        assert_eq!(store.document().projects.len(), 2);

        assert!(store.undo());
        assert_eq!(store.document().projects.len(), 1);
        assert!(store.can_redo());

        assert!(store.redo());
        assert_eq!(store.document().projects.len(), 2);
        assert!(!store.can_redo());
    }

    #[test]
    fn new_projects_are_prepended_to_the_order() {
        let mut store = store();
        let first = store.create_project(now());
        let second = store.create_project(now());
        let ordered: Vec<Uuid> = store.ordered_projects().iter().map(|p| p.id).collect();
        assert_eq!(ordered, vec![second, first]);
    }

    #[test]
    fn mutating_after_undo_clears_redo() {
        let mut store = store();
        store.create_project(now());
        store.undo();
        assert!(store.can_redo());
        store.create_project(now());
        assert!(!store.can_redo());
    }

    #[test]
    fn missing_ids_are_silent_noops() {
        let mut store = store();
        store.create_project(now());
        let ghost = Uuid::new_v4();

        store.update_project(ghost, ProjectPatch::default());
        store.update_task(ghost, TaskPatch::default());
        store.delete_project(ghost);
        store.delete_task(ghost);
        assert!(store.create_subtask(ghost, point(), "x").is_none());
        assert!(store.create_milestone(ghost, point(), "x").is_none());

        // Only the create recorded history.
        assert!(store.undo());
        assert!(!store.can_undo());
    }

    #[test]
    fn cascade_delete_removes_descendants_and_milestone_entry() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        let subtask = store.create_subtask(milestone, range(), "s").unwrap();
        let grandchild = store.create_subtask(subtask, point(), "g").unwrap();

        store.delete_task(milestone);

        let doc = store.document();
        assert!(!doc.tasks.contains_key(&milestone));
        assert!(!doc.tasks.contains_key(&subtask));
        assert!(!doc.tasks.contains_key(&grandchild));
        assert!(doc.projects[&project].milestone_ids.is_empty());

        assert!(store.undo());
        assert_eq!(store.document().tasks.len(), 3);
        assert_eq!(store.document().projects[&project].milestone_ids.len(), 1);
    }

    #[test]
    fn deleting_a_subtask_detaches_it_from_its_parent() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        let subtask = store.create_subtask(milestone, range(), "s").unwrap();

        store.delete_task(subtask);

        let doc = store.document();
        assert!(doc.tasks.contains_key(&milestone));
        assert!(doc.tasks[&milestone].child_task_ids.is_empty());
    }

    #[test]
    fn delete_project_takes_all_its_tasks() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        store.create_subtask(milestone, range(), "s").unwrap();

        store.delete_project(project);
        assert!(store.document().projects.is_empty());
        assert!(store.document().tasks.is_empty());
        assert!(store.document().ui_state.project_order.is_empty());
    }

    #[test]
    fn reorder_is_wholesale_and_queries_are_defensive() {
        let mut store = store();
        let a = store.create_project(now());
        let b = store.create_project(now());
        let ghost = Uuid::new_v4();

        store.reorder_projects(vec![a, a, ghost, b]);
        let ordered: Vec<Uuid> = store.ordered_projects().iter().map(|p| p.id).collect();
        assert_eq!(ordered, vec![a, b]);

        // A project the order list lost entirely is appended at the end.
        store.reorder_projects(vec![b]);
        let ordered: Vec<Uuid> = store.ordered_projects().iter().map(|p| p.id).collect();
        assert_eq!(ordered, vec![b, a]);
    }

    #[test]
    fn raw_updates_record_no_history() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        store.undo();
        store.redo();

        store.update_task_raw(milestone, TaskPatch::schedule(point()));
        assert!(store.document().tasks[&milestone].schedule.is_point());

        // One undo steps over the raw edit straight to the create checkpoint.
        assert!(store.undo());
        assert!(!store.document().tasks.contains_key(&milestone));
    }

    #[test]
    fn milestone_query_double_checks_parentage() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        let subtask = store.create_subtask(milestone, range(), "s").unwrap();

        assert_eq!(store.milestones_of(project).len(), 1);
        assert_eq!(store.subtasks_of(milestone).len(), 1);
        assert_eq!(store.subtasks_of(subtask).len(), 0);
        assert!(store.milestones_of(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn rejected_schedules_never_reach_the_store() {
        let mut store = store();
        let project = store.create_project(now());
        let milestone = store.create_milestone(project, range(), "m").unwrap();
        let before = store.document().tasks[&milestone].schedule;

        // The edit boundary rejects the range; there is nothing to submit.
        let err = Schedule::range(now(), now()).unwrap_err();
        assert_eq!(err.message(), "schedule end must be after its start");

        assert_eq!(store.document().tasks[&milestone].schedule, before);
        // Both creates recorded, nothing else.
        assert!(store.undo());
        assert!(store.undo());
        assert!(!store.can_undo());
    }

    #[test]
    fn locks_are_never_recorded() {
        let mut store = store();
        let project = store.create_project(now());
        store.lock_project(project, 0);
        assert!(store.is_locked(project, 1));

        assert!(store.undo());
        assert!(!store.can_undo());
    }
}
