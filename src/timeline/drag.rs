use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::geometry::snap_time;
use super::viewport::Viewport;
use crate::model::Schedule;

/// What part of the schedule a gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Dragging {
        kind: DragKind,
        task_id: Uuid,
        origin_x: f32,
        original: Schedule,
        moved: bool,
    },
}

/// A proposed schedule produced by one pointer-move step. `first` is set on
/// the gesture's first proposal, so the caller can record exactly one undo
/// checkpoint per gesture before applying the rest history-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragUpdate {
    pub task_id: Uuid,
    pub schedule: Schedule,
    pub first: bool,
}

/// Per-gesture state machine turning continuous pointer motion into snapped
/// schedule proposals.
///
/// Exclusive: one gesture is live at a time; a `begin` while dragging is
/// ignored. Whether dragging is permitted at all (project lock) is the
/// caller's precondition. The controller never touches the document store --
/// it only proposes schedules.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    /// Pointer-down on a draggable interval: capture the entity's current
    /// schedule and the pointer's starting x.
    pub fn begin(&mut self, kind: DragKind, task_id: Uuid, origin_x: f32, original: Schedule) {
        if matches!(self.state, DragState::Dragging { .. }) {
            return;
        }
        self.state = DragState::Dragging {
            kind,
            task_id,
            origin_x,
            original,
            moved: false,
        };
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragging_task(&self) -> Option<Uuid> {
        match self.state {
            DragState::Dragging { task_id, .. } => Some(task_id),
            DragState::Idle => None,
        }
    }

    /// Pointer-move: convert the pixel delta to a snapped schedule proposal.
    ///
    /// The axis is reversed, so moving the pointer left advances time:
    /// `time_delta = -delta_px * view_duration / width`.
    pub fn update(
        &mut self,
        current_x: f32,
        viewport: &Viewport,
        width: f32,
    ) -> Option<DragUpdate> {
        let DragState::Dragging {
            kind,
            task_id,
            origin_x,
            original,
            ref mut moved,
        } = self.state
        else {
            return None;
        };
        if width <= 0.0 {
            return None;
        }

        let delta_px = current_x - origin_x;
        let time_delta =
            (-f64::from(delta_px) * viewport.duration_ms() as f64 / f64::from(width)) as i64;
        let snap = viewport.snap_ms();

        let schedule = propose(original, kind, time_delta, snap)?;
        let first = !*moved;
        *moved = true;
        Some(DragUpdate {
            task_id,
            schedule,
            first,
        })
    }

    /// Pointer-up (or teardown of the owning view): back to idle. The last
    /// applied proposal is final; there is no separate commit.
    pub fn end(&mut self) -> Option<Uuid> {
        let id = self.dragging_task();
        self.state = DragState::Idle;
        id
    }
}

fn propose(original: Schedule, kind: DragKind, time_delta: i64, snap: i64) -> Option<Schedule> {
    match original {
        Schedule::Point { at } => {
            // A point has no edges; every kind shifts the instant.
            let shifted = snap_time(at.timestamp_millis() + time_delta, snap);
            Some(Schedule::Point { at: utc_ms(shifted)? })
        }
        Schedule::Range { start, end } => {
            let start_ms = start.timestamp_millis();
            let end_ms = end.timestamp_millis();
            match kind {
                DragKind::Move => {
                    let new_start = snap_time(start_ms + time_delta, snap);
                    let mut new_end = snap_time(end_ms + time_delta, snap);
                    // Sub-snap ranges can collapse once both edges are
                    // snapped; keep the range non-empty.
                    if new_end <= new_start {
                        new_end = new_start + snap;
                    }
                    Some(Schedule::Range {
                        start: utc_ms(new_start)?,
                        end: utc_ms(new_end)?,
                    })
                }
                DragKind::ResizeStart => {
                    // The end edge follows the pointer; the unsnapped start
                    // stays put and the end never comes within a snap of it.
                    let new_end = snap_time(end_ms + time_delta, snap).max(start_ms + snap);
                    Some(Schedule::Range {
                        start,
                        end: utc_ms(new_end)?,
                    })
                }
                DragKind::ResizeEnd => {
                    let new_start = snap_time(start_ms + time_delta, snap).min(end_ms - snap);
                    Some(Schedule::Range {
                        start: utc_ms(new_start)?,
                        end,
                    })
                }
            }
        }
    }
}

fn utc_ms(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::zoom::ZoomLevel;

    const WIDTH: f32 = 1000.0;

    fn viewport() -> Viewport {
        // One hour across 1000 px at Minutes level: 3600 ms per pixel,
        // snap granularity 5 minutes.
        Viewport {
            start_ms: 0,
            end_ms: 3_600_000,
            level: ZoomLevel::Minutes,
        }
    }

    fn range(start_ms: i64, end_ms: i64) -> Schedule {
        Schedule::Range {
            start: utc_ms(start_ms).unwrap(),
            end: utc_ms(end_ms).unwrap(),
        }
    }

    #[test]
    fn leftward_motion_advances_time() {
        let mut drag = DragController::new();
        let id = Uuid::new_v4();
        drag.begin(DragKind::Move, id, 500.0, range(600_000, 1_200_000));

        let update = drag.update(400.0, &viewport(), WIDTH).unwrap();
        assert!(update.first);
        assert_eq!(update.schedule, range(900_000, 1_500_000));

        let update = drag.update(400.0, &viewport(), WIDTH).unwrap();
        assert!(!update.first);
    }

    #[test]
    fn resize_end_clamps_start_to_one_snap_before_end() {
        let mut drag = DragController::new();
        let id = Uuid::new_v4();
        drag.begin(DragKind::ResizeEnd, id, 500.0, range(300_000, 900_000));

        // Way past the end edge: start is pinned one snap unit before it.
        let update = drag.update(200.0, &viewport(), WIDTH).unwrap();
        let (start, end) = update.schedule.span_ms();
        assert_eq!(end - start, viewport().snap_ms());
        assert_eq!(end, 900_000);
    }

    #[test]
    fn resize_start_clamps_end_against_unsnapped_start() {
        let mut drag = DragController::new();
        let id = Uuid::new_v4();
        // Start deliberately off the snap grid.
        drag.begin(DragKind::ResizeStart, id, 500.0, range(250_000, 850_000));

        let update = drag.update(700.0, &viewport(), WIDTH).unwrap();
        let (start, end) = update.schedule.span_ms();
        assert_eq!(start, 250_000);
        assert_eq!(end, 250_000 + viewport().snap_ms());
    }

    #[test]
    fn point_shifts_and_snaps() {
        let mut drag = DragController::new();
        let id = Uuid::new_v4();
        drag.begin(DragKind::Move, id, 0.0, Schedule::point(utc_ms(600_000).unwrap()));

        let update = drag.update(-100.0, &viewport(), WIDTH).unwrap();
        assert_eq!(update.schedule, Schedule::point(utc_ms(900_000).unwrap()));
    }

    #[test]
    fn second_begin_is_ignored_while_dragging() {
        let mut drag = DragController::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        drag.begin(DragKind::Move, first, 0.0, range(0, 600_000));
        drag.begin(DragKind::Move, second, 50.0, range(0, 600_000));
        assert_eq!(drag.dragging_task(), Some(first));

        assert_eq!(drag.end(), Some(first));
        assert!(!drag.is_dragging());
        assert_eq!(drag.end(), None);
    }
}
