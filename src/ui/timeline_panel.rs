use egui::{Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::model::{Schedule, Task, TaskPatch};
use crate::store::DocumentStore;
use crate::timeline::zoom;
use crate::timeline::{
    pack_rows, DragController, DragKind, LaneItem, RowLayout, Viewport, Viewports,
};
use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_GAP: f32 = theme::ROW_GAP;
const TICK_HEADER: f32 = theme::TICK_HEADER_HEIGHT;
const TRACK_HEADER: f32 = theme::TRACK_HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;
const STRIP_INDENT: f32 = 18.0;
const TRACK_GAP: f32 = 10.0;

/// Result details from interactions in the timeline panel.
#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    pub changed: bool,
    pub status: Option<String>,
}

/// Render every project track: tick header, packed milestone lanes, and the
/// expanded milestone's subtask strip with its own nested viewport.
pub fn show_timeline_panel(
    store: &mut DocumentStore,
    viewports: &mut Viewports,
    drag: &mut DragController,
    selected_task: &mut Option<Uuid>,
    expanded_milestone: &mut Option<Uuid>,
    now_ms: i64,
    ui: &mut Ui,
) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();

    // Snapshot the render data up front; interactions mutate the store while
    // the loop below works on owned copies.
    struct TrackData {
        project_id: Uuid,
        title: String,
        locked: bool,
        subject: (i64, i64),
        milestones: Vec<Task>,
    }
    let tracks: Vec<TrackData> = store
        .ordered_projects()
        .into_iter()
        .map(|project| TrackData {
            project_id: project.id,
            title: project.title.clone(),
            locked: store.is_locked(project.id, now_ms),
            subject: project.time_range.span_ms(),
            milestones: store
                .milestones_of(project.id)
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect();

    let ctrl_scroll = ui.input(|i| {
        if i.modifiers.ctrl {
            i.smooth_scroll_delta.y
        } else {
            0.0
        }
    });

    for track in tracks {
        let width = ui.available_width();

        let items: Vec<LaneItem> = track
            .milestones
            .iter()
            .map(|t| LaneItem::from_schedule(t.id, &t.schedule))
            .collect();
        let layout = pack_rows(&items);
        let lane_rows = layout.row_count.max(1);

        // Subtasks of the expanded milestone, when it lives on this track.
        let expanded: Option<(Task, Vec<Task>, RowLayout)> = expanded_milestone
            .and_then(|id| track.milestones.iter().find(|m| m.id == id))
            .map(|milestone| {
                let subtasks: Vec<Task> = store
                    .subtasks_of(milestone.id)
                    .into_iter()
                    .cloned()
                    .collect();
                let sub_items: Vec<LaneItem> = subtasks
                    .iter()
                    .map(|t| LaneItem::from_schedule(t.id, &t.schedule))
                    .collect();
                (milestone.clone(), subtasks, pack_rows(&sub_items))
            });

        let lanes_height = lane_rows as f32 * (ROW_HEIGHT + ROW_GAP);
        let strip_height = expanded
            .as_ref()
            .map(|(_, _, sub_layout)| {
                TICK_HEADER + sub_layout.row_count.max(1) as f32 * (ROW_HEIGHT + ROW_GAP) + 6.0
            })
            .unwrap_or(0.0);
        let height = TRACK_HEADER + TICK_HEADER + lanes_height + strip_height;

        let (response, painter) =
            ui.allocate_painter(Vec2::new(width, height), Sense::click());
        let origin = response.rect.min;
        let mut consumed_click = false;

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

        // ── Track header: title + lock state ─────────────────────────────
        let header_rect =
            Rect::from_min_size(origin, Vec2::new(width, TRACK_HEADER));
        painter.rect_filled(header_rect, 0.0, theme::BG_HEADER);
        painter.text(
            Pos2::new(origin.x + 8.0, header_rect.center().y),
            egui::Align2::LEFT_CENTER,
            if track.title.is_empty() {
                "Untitled Project"
            } else {
                &track.title
            },
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
        if track.locked {
            painter.text(
                Pos2::new(origin.x + width - 8.0, header_rect.center().y),
                egui::Align2::RIGHT_CENTER,
                "active",
                theme::font_small(),
                theme::LOCK_BADGE,
            );
        } else {
            painter.text(
                Pos2::new(origin.x + width - 8.0, header_rect.center().y),
                egui::Align2::RIGHT_CENTER,
                "click to activate",
                theme::font_small(),
                theme::TEXT_DIM,
            );
        }
        let header_response = ui.interact(
            header_rect,
            ui.make_persistent_id(("track-header", track.project_id)),
            Sense::click(),
        );
        if header_response.clicked() {
            store.lock_project(track.project_id, now_ms);
            consumed_click = true;
            interaction.status = Some(format!(
                "'{}' activated",
                if track.title.is_empty() { "Untitled Project" } else { &track.title }
            ));
        }

        // ── Project viewport ─────────────────────────────────────────────
        let body_top = origin.y + TRACK_HEADER;
        let body_rect = Rect::from_min_size(
            Pos2::new(origin.x, body_top),
            Vec2::new(width, TICK_HEADER + lanes_height),
        );
        if track.locked && ctrl_scroll != 0.0 && ui.rect_contains_pointer(body_rect) {
            let slot = viewports.for_subject(track.project_id, track.subject);
            if ctrl_scroll > 0.0 {
                slot.zoom_in();
            } else {
                slot.zoom_out();
            }
        }
        let vp = *viewports.for_subject(track.project_id, track.subject);

        draw_tick_strip(&painter, Pos2::new(origin.x, body_top), &vp, width, lanes_height);

        // ── Milestone bars ───────────────────────────────────────────────
        let lanes_top = body_top + TICK_HEADER;
        let mut expand_request: Option<Uuid> = None;
        for task in &track.milestones {
            let row = layout.row_of(task.id);
            let y = lanes_top + row as f32 * (ROW_HEIGHT + ROW_GAP) + ROW_GAP;
            let is_selected = *selected_task == Some(task.id);

            bar_interaction(BarArgs {
                ui: &mut *ui,
                painter: &painter,
                store: &mut *store,
                drag: &mut *drag,
                selected_task: &mut *selected_task,
                interaction: &mut interaction,
                consumed_click: &mut consumed_click,
                expand_toggle: Some(&mut expand_request),
                task,
                vp,
                origin_x: origin.x,
                width,
                y,
                is_selected,
                locked: track.locked,
                project_id: track.project_id,
                now_ms,
                id_salt: "milestone",
            });
        }
        // Double-click expands/collapses a milestone's subtask strip.
        if let Some(id) = expand_request {
            *expanded_milestone = if *expanded_milestone == Some(id) {
                None
            } else {
                Some(id)
            };
        }

        // ── Expanded milestone strip ─────────────────────────────────────
        if let Some((milestone, subtasks, sub_layout)) = expanded {
            let strip_top = lanes_top + lanes_height + 4.0;
            let strip_x = origin.x + STRIP_INDENT;
            let strip_width = width - STRIP_INDENT;
            let sub_lanes_height =
                sub_layout.row_count.max(1) as f32 * (ROW_HEIGHT + ROW_GAP);

            painter.line_segment(
                [
                    Pos2::new(strip_x - 6.0, strip_top),
                    Pos2::new(strip_x - 6.0, strip_top + TICK_HEADER + sub_lanes_height),
                ],
                Stroke::new(2.0, theme::BORDER_ACCENT),
            );

            let sub_item = LaneItem::from_schedule(milestone.id, &milestone.schedule);
            let sub_subject = (sub_item.start_ms, sub_item.end_ms);
            let strip_rect = Rect::from_min_size(
                Pos2::new(strip_x, strip_top),
                Vec2::new(strip_width, TICK_HEADER + sub_lanes_height),
            );
            if track.locked && ctrl_scroll != 0.0 && ui.rect_contains_pointer(strip_rect) {
                let slot = viewports.for_subject(milestone.id, sub_subject);
                if ctrl_scroll > 0.0 {
                    slot.zoom_in();
                } else {
                    slot.zoom_out();
                }
            }
            let sub_vp = *viewports.for_subject(milestone.id, sub_subject);

            draw_tick_strip(
                &painter,
                Pos2::new(strip_x, strip_top),
                &sub_vp,
                strip_width,
                sub_lanes_height,
            );

            let sub_lanes_top = strip_top + TICK_HEADER;
            for task in &subtasks {
                let row = sub_layout.row_of(task.id);
                let y = sub_lanes_top + row as f32 * (ROW_HEIGHT + ROW_GAP) + ROW_GAP;
                let is_selected = *selected_task == Some(task.id);
                bar_interaction(BarArgs {
                    ui: &mut *ui,
                    painter: &painter,
                    store: &mut *store,
                    drag: &mut *drag,
                    selected_task: &mut *selected_task,
                    interaction: &mut interaction,
                    consumed_click: &mut consumed_click,
                    expand_toggle: None,
                    task,
                    vp: sub_vp,
                    origin_x: strip_x,
                    width: strip_width,
                    y,
                    is_selected,
                    locked: track.locked,
                    project_id: track.project_id,
                    now_ms,
                    id_salt: "subtask",
                });
            }
        }

        // Empty click on the track background clears the selection.
        if response.clicked() && !consumed_click {
            *selected_task = None;
        }

        ui.add_space(TRACK_GAP);
    }

    interaction
}

/// Pixel x-range of a bar. The axis is reversed, so the schedule's end maps
/// to the smaller x.
fn bar_pixel_range(task: &Task, vp: &Viewport, origin_x: f32, width: f32) -> (f32, f32) {
    let (start_ms, end_ms) = task.schedule.span_ms();
    let x_end = origin_x + vp.time_to_pixel(end_ms, width);
    let x_start = origin_x + vp.time_to_pixel(start_ms, width);
    (x_end.min(x_start), x_end.max(x_start))
}

struct BarArgs<'a> {
    ui: &'a mut Ui,
    painter: &'a egui::Painter,
    store: &'a mut DocumentStore,
    drag: &'a mut DragController,
    selected_task: &'a mut Option<Uuid>,
    interaction: &'a mut TimelineInteraction,
    consumed_click: &'a mut bool,
    expand_toggle: Option<&'a mut Option<Uuid>>,
    task: &'a Task,
    vp: Viewport,
    origin_x: f32,
    width: f32,
    y: f32,
    is_selected: bool,
    locked: bool,
    project_id: Uuid,
    now_ms: i64,
    id_salt: &'static str,
}

fn bar_interaction(args: BarArgs) {
    let BarArgs {
        ui,
        painter,
        store,
        drag,
        selected_task,
        interaction,
        consumed_click,
        expand_toggle,
        task,
        vp,
        origin_x,
        width,
        y,
        is_selected,
        locked,
        project_id,
        now_ms,
        id_salt,
    } = args;

    let bar_rect = if task.schedule.is_point() {
        draw_point_marker(painter, task, &vp, origin_x, width, y, is_selected)
    } else {
        draw_range_bar(painter, task, &vp, origin_x, width, y, is_selected)
    };

    let bar_response = ui.interact(
        bar_rect,
        ui.make_persistent_id((id_salt, "bar", task.id)),
        Sense::click_and_drag(),
    );

    if bar_response.clicked() {
        *selected_task = Some(task.id);
        *consumed_click = true;
    }
    if bar_response.double_clicked() {
        if let Some(slot) = expand_toggle {
            *slot = Some(task.id);
            *consumed_click = true;
        }
    }

    let ptr_x = |resp: &egui::Response| resp.interact_pointer_pos().map(|p| p.x).unwrap_or(0.0);

    // Resize handles only exist for ranges. On the reversed axis the bar's
    // left edge is the schedule end, so the left handle drives the end
    // endpoint (resize-start kind) and the right handle the start endpoint.
    let mut handle_responses: Vec<(DragKind, egui::Response)> = Vec::new();
    if !task.schedule.is_point() {
        let left = Rect::from_min_max(
            Pos2::new(bar_rect.left() - HANDLE_WIDTH * 0.5, bar_rect.top()),
            Pos2::new(bar_rect.left() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
        );
        let right = Rect::from_min_max(
            Pos2::new(bar_rect.right() - HANDLE_WIDTH * 0.5, bar_rect.top()),
            Pos2::new(bar_rect.right() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
        );
        handle_responses.push((
            DragKind::ResizeStart,
            ui.interact(
                left.expand(4.0),
                ui.make_persistent_id((id_salt, "resize-left", task.id)),
                Sense::drag(),
            ),
        ));
        handle_responses.push((
            DragKind::ResizeEnd,
            ui.interact(
                right.expand(4.0),
                ui.make_persistent_id((id_salt, "resize-right", task.id)),
                Sense::drag(),
            ),
        ));
    }

    let mut all: Vec<(DragKind, &egui::Response)> = vec![(DragKind::Move, &bar_response)];
    for (kind, resp) in &handle_responses {
        all.push((*kind, resp));
    }

    // Edge affordances: small pills mark the resize handles while the bar is
    // selected or a handle is under the pointer.
    let handle_hovered = handle_responses.iter().any(|(_, resp)| resp.hovered());
    if handle_hovered {
        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
    }
    if !handle_responses.is_empty() && (is_selected || handle_hovered) {
        let pill_height = bar_rect.height() * 0.5;
        let pill_top = bar_rect.center().y - pill_height / 2.0;
        for x in [bar_rect.left() - 2.0, bar_rect.right() - 1.5] {
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(x, pill_top), Vec2::new(3.5, pill_height)),
                Rounding::same(1.5),
                theme::HANDLE_COLOR,
            );
        }
    }

    for &(kind, resp) in &all {
        if resp.drag_started() {
            if !locked {
                interaction.status =
                    Some("Activate the project first (click its header)".to_string());
                continue;
            }
            drag.begin(kind, task.id, ptr_x(resp), task.schedule);
            store.lock_project(project_id, now_ms);
            *selected_task = Some(task.id);
            *consumed_click = true;
        }
    }

    if drag.dragging_task() == Some(task.id) {
        for &(kind, resp) in &all {
            if !resp.dragged() {
                continue;
            }
            ui.ctx().set_cursor_icon(match kind {
                DragKind::Move => egui::CursorIcon::Grab,
                _ => egui::CursorIcon::ResizeHorizontal,
            });
            if let Some(update) = drag.update(ptr_x(resp), &vp, width) {
                let patch = TaskPatch::schedule(update.schedule);
                if update.first {
                    store.update_task(update.task_id, patch);
                } else {
                    store.update_task_raw(update.task_id, patch);
                }
                interaction.changed = true;
            }
        }
        if all.iter().any(|(_, resp)| resp.drag_stopped()) {
            drag.end();
        }
    }

    if bar_response.hovered() {
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new((id_salt, "tip", task.id)),
            |ui| {
                ui.strong(if task.title.is_empty() { "(untitled)" } else { &task.title });
                match task.schedule {
                    Schedule::Range { start, end } => {
                        ui.label(format!(
                            "{} → {}",
                            start.format("%d/%m/%Y %H:%M"),
                            end.format("%d/%m/%Y %H:%M"),
                        ));
                    }
                    Schedule::Point { at } => {
                        ui.label(at.format("%d/%m/%Y %H:%M").to_string());
                    }
                }
                ui.label(task.status.label());
            },
        );
    }
}

fn draw_tick_strip(
    painter: &egui::Painter,
    origin: Pos2,
    vp: &Viewport,
    width: f32,
    lanes_height: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, TICK_HEADER)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + TICK_HEADER),
            Pos2::new(origin.x + width, origin.y + TICK_HEADER),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for tick in zoom::ticks(vp.start_ms, vp.end_ms, vp.level) {
        let x = origin.x + vp.time_to_pixel(tick.time_ms, width);
        if x < origin.x || x > origin.x + width {
            continue;
        }
        let (stroke, top) = if tick.is_major {
            (Stroke::new(1.0, theme::GRID_LINE_MAJOR), origin.y + 4.0)
        } else {
            (Stroke::new(0.5, theme::GRID_LINE), origin.y + TICK_HEADER * 0.55)
        };
        painter.line_segment(
            [
                Pos2::new(x, top),
                Pos2::new(x, origin.y + TICK_HEADER + lanes_height),
            ],
            stroke,
        );
        if tick.is_major && !tick.label.is_empty() {
            painter.text(
                Pos2::new(x - 3.0, origin.y + 10.0),
                egui::Align2::RIGHT_CENTER,
                &tick.label,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
        }
    }
}

fn draw_range_bar(
    painter: &egui::Painter,
    task: &Task,
    vp: &Viewport,
    origin_x: f32,
    width: f32,
    y: f32,
    is_selected: bool,
) -> Rect {
    let (left, right) = bar_pixel_range(task, vp, origin_x, width);
    let bar_width = (right - left).max(6.0);
    let inset = theme::BAR_INSET;

    let bar_rect = Rect::from_min_size(
        Pos2::new(left, y + inset),
        Vec2::new(bar_width, ROW_HEIGHT - inset * 2.0),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    let shadow_rect = bar_rect.translate(Vec2::new(1.0, 2.0));
    painter.rect_filled(shadow_rect, rounding, egui::Color32::from_black_alpha(35));
    painter.rect_filled(
        bar_rect,
        rounding,
        theme::entity_color(&task.color, task.priority.unsigned_abs() as usize),
    );

    // Status dot at the bar's leading (end-of-time) edge.
    painter.circle_filled(
        Pos2::new(bar_rect.left() + 8.0, bar_rect.center().y),
        3.5,
        theme::status_color(&task.status),
    );

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar_width > 40.0 {
        let galley = painter.layout_no_wrap(
            task.title.clone(),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = bar_rect.center().y - galley.size().y / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 16.0, text_y),
            galley,
            egui::Color32::TRANSPARENT,
        );
    }

    bar_rect
}

fn draw_point_marker(
    painter: &egui::Painter,
    task: &Task,
    vp: &Viewport,
    origin_x: f32,
    width: f32,
    y: f32,
    is_selected: bool,
) -> Rect {
    let x = origin_x + vp.time_to_pixel(task.schedule.start_ms(), width);
    let center = Pos2::new(x, y + (ROW_HEIGHT - 2.0 * theme::BAR_INSET) / 2.0);
    let size = (ROW_HEIGHT / 2.0 - 4.0).max(6.0);

    let points = vec![
        Pos2::new(center.x, center.y - size),
        Pos2::new(center.x + size, center.y),
        Pos2::new(center.x, center.y + size),
        Pos2::new(center.x - size, center.y),
    ];
    painter.add(egui::Shape::convex_polygon(
        points.clone(),
        theme::status_color(&task.status),
        Stroke::NONE,
    ));
    if is_selected {
        painter.add(egui::Shape::convex_polygon(
            points,
            egui::Color32::TRANSPARENT,
            Stroke::new(2.0, theme::BORDER_ACCENT),
        ));
    }

    painter.text(
        Pos2::new(x - size - 6.0, center.y),
        egui::Align2::RIGHT_CENTER,
        &task.title,
        theme::font_bar(),
        theme::TEXT_SECONDARY,
    );

    Rect::from_center_size(center, Vec2::splat(size * 2.0 + 2.0))
}
