use chrono::Utc;
use uuid::Uuid;

use crate::io::StateStore;
use crate::model::{BackupInfo, Schedule};
use crate::store::DocumentStore;
use crate::timeline::{DragController, Viewports};
use crate::ui;

/// The running application: the document store and timeline engine plus the
/// session-only shell state around them.
pub struct TimeplanApp {
    pub store: DocumentStore,
    state_store: StateStore,
    pub drag: DragController,
    pub viewports: Viewports,
    pub selected_task: Option<Uuid>,
    pub expanded_milestone: Option<Uuid>,
    pub status_message: String,
}

impl TimeplanApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let state_store = StateStore::default_location().unwrap_or_else(|e| {
            eprintln!("Falling back to local data dir: {}", e);
            StateStore::at("data")
        });
        let store = DocumentStore::new(state_store.load());

        Self {
            store,
            state_store,
            drag: DragController::new(),
            viewports: Viewports::new(),
            selected_task: None,
            expanded_milestone: None,
            status_message: "Ready".to_string(),
        }
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// The project whose timeline is currently claimed for interaction: the
    /// one with the freshest unexpired advisory lock.
    pub fn active_project(&self) -> Option<Uuid> {
        let now_ms = Self::now_ms();
        self.store
            .document()
            .ui_state
            .locked_projects
            .iter()
            .filter(|(_, lock)| lock.locked_until_ms > now_ms)
            .max_by_key(|(id, lock)| (lock.locked_until_ms, **id))
            .map(|(id, _)| *id)
    }

    pub fn list_backups(&self) -> Vec<BackupInfo> {
        self.store.document().backups.clone()
    }

    // --- File operations ---

    pub fn save(&mut self) {
        let mut doc = self.store.document().clone();
        match self.state_store.save(&mut doc, true, Utc::now()) {
            Ok((saved_at, _backup_id)) => {
                self.store.adopt_backups(doc.backups);
                self.status_message = format!("Saved at {}", saved_at.format("%H:%M:%S"));
            }
            Err(e) => {
                self.status_message = format!("Error saving: {}", e);
            }
        }
    }

    pub fn restore_backup(&mut self, backup_id: &str) {
        match self.state_store.restore(backup_id, Utc::now()) {
            Ok(doc) => {
                self.store.replace(doc);
                self.selected_task = None;
                self.expanded_milestone = None;
                self.status_message = "Backup restored".to_string();
            }
            Err(e) => {
                self.status_message = format!("Error restoring: {}", e);
            }
        }
    }

    // --- Edit operations ---

    pub fn undo(&mut self) {
        if self.store.undo() {
            self.selected_task = None;
            self.status_message = "Undo".to_string();
        }
    }

    pub fn redo(&mut self) {
        if self.store.redo() {
            self.selected_task = None;
            self.status_message = "Redo".to_string();
        }
    }

    // --- Project / task operations ---

    pub fn create_project(&mut self) {
        let id = self.store.create_project(Utc::now());
        self.store.lock_project(id, Self::now_ms());
        self.status_message = "Project created".to_string();
    }

    pub fn create_milestone(&mut self) {
        let Some(project_id) = self.active_project() else {
            return;
        };
        let start = Utc::now();
        let schedule = Schedule::Range {
            start,
            end: start + chrono::Duration::days(7),
        };
        if let Some(id) = self.store.create_milestone(project_id, schedule, "New Milestone") {
            self.selected_task = Some(id);
            self.status_message = "Milestone added".to_string();
        }
    }

    pub fn create_subtask(&mut self) {
        let Some(parent_id) = self.selected_task else {
            return;
        };
        let Some(parent) = self.store.document().tasks.get(&parent_id) else {
            return;
        };
        let schedule = parent.schedule;
        let is_milestone = parent.is_milestone();
        if let Some(id) = self.store.create_subtask(parent_id, schedule, "New Subtask") {
            if is_milestone {
                self.expanded_milestone = Some(parent_id);
            }
            self.selected_task = Some(id);
            self.status_message = "Subtask added".to_string();
        }
    }

    pub fn delete_selected_task(&mut self) {
        let Some(id) = self.selected_task.take() else {
            return;
        };
        self.store.delete_task(id);
        self.viewports.forget(id);
        if self.expanded_milestone == Some(id) {
            self.expanded_milestone = None;
        }
        self.status_message = "Task deleted".to_string();
    }

    pub fn delete_active_project(&mut self) {
        let Some(id) = self.active_project() else {
            return;
        };
        self.store.delete_project(id);
        self.viewports.forget(id);
        self.selected_task = None;
        self.expanded_milestone = None;
        self.status_message = "Project deleted".to_string();
    }

    /// Swap the active project one position up (-1) or down (+1) in the
    /// display order.
    pub fn move_active_project(&mut self, delta: i32) {
        let Some(id) = self.active_project() else {
            return;
        };
        let mut order: Vec<Uuid> = self
            .store
            .ordered_projects()
            .iter()
            .map(|p| p.id)
            .collect();
        let Some(index) = order.iter().position(|pid| *pid == id) else {
            return;
        };
        let target = index as i32 + delta;
        if target < 0 || target as usize >= order.len() {
            return;
        }
        order.swap(index, target as usize);
        self.store.reorder_projects(order);
        self.status_message = "Projects reordered".to_string();
    }
}

impl eframe::App for TimeplanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);
        let now_ms = Self::now_ms();

        // Sweep expired locks and wake up again at the next expiry instant
        // rather than polling on every read.
        if let Some(next_expiry) = self.store.expire_locks(now_ms) {
            let wait = (next_expiry - now_ms).max(0) as u64;
            ctx.request_repaint_after(std::time::Duration::from_millis(wait));
        }

        // A drag ends when the pointer is released anywhere, and is torn down
        // if the pointer vanished without a release event.
        if self.drag.is_dragging() && ctx.input(|i| !i.pointer.any_down()) {
            self.drag.end();
        }

        // Chords are read before any panel closure borrows self.
        let should_save = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S));
        let should_undo = ctx
            .input(|i| i.modifiers.ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::Z));
        let should_redo = ctx.input(|i| {
            i.modifiers.ctrl
                && (i.key_pressed(egui::Key::Y)
                    || (i.modifiers.shift && i.key_pressed(egui::Key::Z)))
        });
        let should_dismiss = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if should_save {
            self.save();
        }
        if should_undo {
            self.undo();
        }
        if should_redo {
            self.redo();
        }
        if should_dismiss {
            self.selected_task = None;
            self.expanded_milestone = None;
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let active = self
                            .active_project()
                            .and_then(|id| self.store.document().projects.get(&id))
                            .map(|p| {
                                if p.title.is_empty() {
                                    "Untitled Project".to_string()
                                } else {
                                    p.title.clone()
                                }
                            });
                        ui.label(
                            egui::RichText::new(match active {
                                Some(title) => format!("Active: {}", title),
                                None => "No active project".to_string(),
                            })
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: project timelines
        let frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::same(6.0));
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if self.store.document().projects.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("No projects yet — Project ▸ New Project")
                            .color(ui::theme::TEXT_DIM),
                    );
                });
                return;
            }
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let interaction = ui::timeline_panel::show_timeline_panel(
                        &mut self.store,
                        &mut self.viewports,
                        &mut self.drag,
                        &mut self.selected_task,
                        &mut self.expanded_milestone,
                        now_ms,
                        ui,
                    );
                    if interaction.changed {
                        if let Some(id) = self.selected_task {
                            if let Some(task) = self.store.document().tasks.get(&id) {
                                let (start_ms, end_ms) = task.schedule.span_ms();
                                self.status_message = format!(
                                    "Updated '{}' ({} → {})",
                                    task.title,
                                    format_ms(start_ms),
                                    format_ms(end_ms),
                                );
                            }
                        } else {
                            self.status_message = "Timeline updated".to_string();
                        }
                    }
                    if let Some(status) = interaction.status {
                        self.status_message = status;
                    }
                });
        });

    }
}

fn format_ms(ms: i64) -> String {
    use chrono::TimeZone;
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%d/%m %H:%M").to_string(),
        None => "?".to_string(),
    }
}
