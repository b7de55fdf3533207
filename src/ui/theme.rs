use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::TaskStatus;

// ── Base palette ─────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(18, 21, 26);
pub const BG_PANEL: Color32 = Color32::from_rgb(26, 29, 36);
pub const BG_HEADER: Color32 = Color32::from_rgb(31, 35, 44);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(46, 51, 62);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(64, 178, 170);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(224, 228, 234);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(148, 156, 170);
pub const TEXT_DIM: Color32 = Color32::from_rgb(94, 101, 115);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(244, 247, 250);

pub const ACCENT: Color32 = Color32::from_rgb(58, 165, 158);
pub const GRID_LINE: Color32 = Color32::from_rgb(38, 42, 52);
pub const GRID_LINE_MAJOR: Color32 = Color32::from_rgb(56, 62, 75);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(235, 238, 243);
pub const LOCK_BADGE: Color32 = Color32::from_rgb(214, 158, 46);

// ── Metrics ──────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 30.0;
pub const ROW_GAP: f32 = 2.0;
pub const TICK_HEADER_HEIGHT: f32 = 26.0;
pub const TRACK_HEADER_HEIGHT: f32 = 22.0;
pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 3.0; // vertical inset so bars don't touch row edges

// ── Type scale ───────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.5)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.0)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.0)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(12.5)
}

pub fn font_status() -> FontId {
    FontId::proportional(11.0)
}

// ── Entity colors ────────────────────────────────────────────────────────────

/// Rotation used for entities whose color is still "auto".
pub const AUTO_COLORS: &[Color32] = &[
    Color32::from_rgb(47, 128, 208),  // blue
    Color32::from_rgb(70, 158, 112),  // green
    Color32::from_rgb(160, 98, 196),  // violet
    Color32::from_rgb(222, 128, 44),  // orange
    Color32::from_rgb(56, 166, 196),  // teal
    Color32::from_rgb(198, 160, 44),  // gold
];

pub fn auto_color(index: usize) -> Color32 {
    AUTO_COLORS[index % AUTO_COLORS.len()]
}

/// Parse a "#rrggbb" entity color, falling back to the auto rotation.
pub fn entity_color(color: &str, auto_index: usize) -> Color32 {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color32::from_rgb(r, g, b);
        }
    }
    auto_color(auto_index)
}

pub fn status_color(status: &TaskStatus) -> Color32 {
    match status {
        TaskStatus::NotStarted => Color32::from_rgb(116, 122, 138),
        TaskStatus::InProgress => Color32::from_rgb(47, 128, 208),
        TaskStatus::Stuck => Color32::from_rgb(214, 69, 56),
        TaskStatus::Done => Color32::from_rgb(70, 158, 112),
        TaskStatus::WaitingFor { .. } => Color32::from_rgb(222, 128, 44),
    }
}

// ── egui visuals ─────────────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(14, 16, 20);

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(36, 40, 50);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(45, 50, 62);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    visuals.widgets.active.bg_fill = Color32::from_rgb(52, 58, 72);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(1.5, TEXT_PRIMARY);

    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(7.0, 4.0);
    style.spacing.button_padding = egui::vec2(9.0, 4.0);
    ctx.set_style(style);
}
