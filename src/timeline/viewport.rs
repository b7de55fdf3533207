use super::geometry;
use super::zoom::ZoomLevel;

/// Fraction of the subject interval added as margin on each side when a
/// viewport is fitted to it.
const FIT_PADDING: f64 = 0.05;

/// The visible `[start, end)` time window of one timeline track, plus its
/// zoom level. One viewport exists per project track and one per expanded
/// milestone strip; both are reset whenever a new subject interval is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub start_ms: i64,
    pub end_ms: i64,
    pub level: ZoomLevel,
}

impl Viewport {
    /// Fit the window around a subject interval, inferring the zoom level
    /// from the padded duration. Degenerate subjects get a one-day window.
    pub fn fit(subject_start_ms: i64, subject_end_ms: i64) -> Self {
        let (start, end) = if subject_end_ms > subject_start_ms {
            let pad = ((subject_end_ms - subject_start_ms) as f64 * FIT_PADDING) as i64;
            (subject_start_ms - pad.max(1), subject_end_ms + pad.max(1))
        } else {
            let half_day = super::zoom::DAY_MS / 2;
            (subject_start_ms - half_day, subject_start_ms + half_day)
        };
        Self {
            start_ms: start,
            end_ms: end,
            level: ZoomLevel::for_duration(end - start),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn snap_ms(&self) -> i64 {
        self.level.config().snap_ms
    }

    /// Step one level finer, keeping the window center and scaling the span
    /// by the ratio of the adjacent levels' base units. No-op at `Minutes`.
    pub fn zoom_in(&mut self) {
        self.rescale_to(self.level.zoom_in());
    }

    /// Step one level coarser, symmetric to [`Viewport::zoom_in`].
    pub fn zoom_out(&mut self) {
        self.rescale_to(self.level.zoom_out());
    }

    fn rescale_to(&mut self, level: ZoomLevel) {
        if level == self.level {
            return;
        }
        let ratio = level.config().unit_ms as f64 / self.level.config().unit_ms as f64;
        let center = self.start_ms + self.duration_ms() / 2;
        let half = ((self.duration_ms() as f64 * ratio) / 2.0) as i64;
        self.start_ms = center - half.max(1);
        self.end_ms = center + half.max(1);
        self.level = level;
    }

    pub fn time_to_pixel(&self, t: i64, width: f32) -> f32 {
        geometry::time_to_pixel(t, self.start_ms, self.end_ms, width)
    }

    pub fn pixel_to_time(&self, px: f32, width: f32) -> i64 {
        geometry::pixel_to_time(px, self.start_ms, self.end_ms, width)
    }

    pub fn contains(&self, t: i64) -> bool {
        t >= self.start_ms && t < self.end_ms
    }
}

/// Viewports keyed by their owning entity (project track or expanded
/// milestone strip), each remembering the subject interval it was fitted to.
/// Showing a different subject under the same key resets that viewport.
#[derive(Debug, Default)]
pub struct Viewports {
    slots: std::collections::HashMap<uuid::Uuid, (i64, i64, Viewport)>,
}

impl Viewports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_subject(&mut self, key: uuid::Uuid, subject: (i64, i64)) -> &mut Viewport {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| (subject.0, subject.1, Viewport::fit(subject.0, subject.1)));
        if (slot.0, slot.1) != subject {
            *slot = (subject.0, subject.1, Viewport::fit(subject.0, subject.1));
        }
        &mut slot.2
    }

    pub fn forget(&mut self, key: uuid::Uuid) {
        self.slots.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::zoom::{DAY_MS, MONTH_MS, WEEK_MS};

    #[test]
    fn fit_pads_and_infers_level() {
        let vp = Viewport::fit(0, 10 * MONTH_MS);
        assert!(vp.start_ms < 0 && vp.end_ms > 10 * MONTH_MS);
        assert_eq!(vp.level, ZoomLevel::Months);

        let vp = Viewport::fit(0, 5 * DAY_MS);
        assert_eq!(vp.level, ZoomLevel::Days);
    }

    #[test]
    fn fit_degenerate_subject_gets_a_day() {
        let vp = Viewport::fit(1_000, 1_000);
        assert_eq!(vp.duration_ms(), DAY_MS);
    }

    #[test]
    fn showing_a_new_subject_resets_the_viewport() {
        let mut viewports = Viewports::new();
        let key = uuid::Uuid::new_v4();

        let vp = *viewports.for_subject(key, (0, 10 * DAY_MS));
        viewports.for_subject(key, (0, 10 * DAY_MS)).zoom_in();
        assert_ne!(*viewports.for_subject(key, (0, 10 * DAY_MS)), vp);

        // Same key, new subject interval: fitted fresh.
        let refit = *viewports.for_subject(key, (0, 20 * DAY_MS));
        assert_eq!(refit, Viewport::fit(0, 20 * DAY_MS));
    }

    #[test]
    fn zoom_keeps_center_and_clamps() {
        let mut vp = Viewport {
            start_ms: 0,
            end_ms: 4 * WEEK_MS,
            level: ZoomLevel::Weeks,
        };
        let center = vp.start_ms + vp.duration_ms() / 2;
        vp.zoom_in();
        assert_eq!(vp.level, ZoomLevel::Days);
        assert_eq!(vp.start_ms + vp.duration_ms() / 2, center);
        assert!(vp.duration_ms() < 4 * WEEK_MS);

        let mut coarse = Viewport {
            start_ms: 0,
            end_ms: MONTH_MS,
            level: ZoomLevel::Months,
        };
        let before = coarse;
        coarse.zoom_out();
        assert_eq!(coarse, before);
    }
}
