pub mod drag;
pub mod geometry;
pub mod layout;
pub mod viewport;
pub mod zoom;

pub use drag::{DragController, DragKind, DragUpdate};
pub use layout::{pack_rows, LaneItem, RowLayout};
pub use viewport::{Viewport, Viewports};
pub use zoom::{Tick, ZoomLevel};
