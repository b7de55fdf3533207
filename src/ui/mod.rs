pub mod theme;
pub mod timeline_panel;
pub mod toolbar;
