use egui::{menu, RichText, Ui};

use crate::app::TimeplanApp;
use crate::ui::theme;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimeplanApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save();
                ui.close_menu();
            }
            ui.separator();
            ui.menu_button("  Restore Backup", |ui| {
                let backups = app.list_backups();
                if backups.is_empty() {
                    ui.label(RichText::new("No backups yet").weak());
                }
                for backup in backups.iter().rev() {
                    let label = format!(
                        "{}  ({})",
                        backup.created_at.format("%d/%m/%Y %H:%M:%S"),
                        backup.reason
                    );
                    if ui.button(label).clicked() {
                        app.restore_backup(&backup.id);
                        ui.close_menu();
                    }
                }
            });
        });

        ui.menu_button(RichText::new("  Edit  ").font(theme::font_menu()), |ui| {
            let can_undo = app.store.can_undo();
            let can_redo = app.store.can_redo();
            if ui
                .add_enabled(can_undo, egui::Button::new("  Undo          Ctrl+Z"))
                .clicked()
            {
                app.undo();
                ui.close_menu();
            }
            if ui
                .add_enabled(can_redo, egui::Button::new("  Redo          Ctrl+Y"))
                .clicked()
            {
                app.redo();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Project  ").font(theme::font_menu()), |ui| {
            if ui.button("  New Project").clicked() {
                app.create_project();
                ui.close_menu();
            }
            let active = app.active_project();
            if ui
                .add_enabled(active.is_some(), egui::Button::new("  New Milestone"))
                .clicked()
            {
                app.create_milestone();
                ui.close_menu();
            }
            let has_selection = app.selected_task.is_some();
            if ui
                .add_enabled(has_selection, egui::Button::new("  New Subtask"))
                .clicked()
            {
                app.create_subtask();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(active.is_some(), egui::Button::new("  Move Up"))
                .clicked()
            {
                app.move_active_project(-1);
                ui.close_menu();
            }
            if ui
                .add_enabled(active.is_some(), egui::Button::new("  Move Down"))
                .clicked()
            {
                app.move_active_project(1);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(has_selection, egui::Button::new("  Delete Task"))
                .clicked()
            {
                app.delete_selected_task();
                ui.close_menu();
            }
            if ui
                .add_enabled(active.is_some(), egui::Button::new("  Delete Project"))
                .clicked()
            {
                app.delete_active_project();
                ui.close_menu();
            }
        });

        // Right-aligned document summary
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let doc = app.store.document();
            ui.label(
                RichText::new(format!(
                    "{} projects · {} tasks",
                    doc.projects.len(),
                    doc.tasks.len()
                ))
                .size(11.0)
                .weak(),
            );
        });
    });
}
