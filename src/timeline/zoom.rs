use chrono::{TimeZone, Utc};

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;
/// Thresholding month: a flat 30 days, not calendar-aware.
pub const MONTH_MS: i64 = 30 * DAY_MS;

/// Timeline zoom levels, coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomLevel {
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
}

/// Per-level rendering and snapping parameters.
#[derive(Debug, Clone, Copy)]
pub struct ZoomConfig {
    /// Base unit of the level (one month, one week, ...).
    pub unit_ms: i64,
    /// Pixels one unit occupies at fixed-scale rendering.
    pub pixels_per_unit: f32,
    /// Granularity dragged endpoints are rounded to.
    pub snap_ms: i64,
    pub minor_tick_ms: i64,
    pub major_tick_ms: i64,
    /// chrono format string used for major tick labels.
    pub label_format: &'static str,
}

impl ZoomLevel {
    pub const ALL: [ZoomLevel; 5] = [
        ZoomLevel::Months,
        ZoomLevel::Weeks,
        ZoomLevel::Days,
        ZoomLevel::Hours,
        ZoomLevel::Minutes,
    ];

    pub fn config(self) -> ZoomConfig {
        match self {
            // Minor ticks must divide the major granularity or stepping from
            // a major boundary would never land on the next one; 6 days is
            // the closest week-like divisor of the 30-day month.
            ZoomLevel::Months => ZoomConfig {
                unit_ms: MONTH_MS,
                pixels_per_unit: 120.0,
                snap_ms: DAY_MS,
                minor_tick_ms: 6 * DAY_MS,
                major_tick_ms: MONTH_MS,
                label_format: "%b %Y",
            },
            ZoomLevel::Weeks => ZoomConfig {
                unit_ms: WEEK_MS,
                pixels_per_unit: 84.0,
                snap_ms: DAY_MS,
                minor_tick_ms: DAY_MS,
                major_tick_ms: WEEK_MS,
                label_format: "%d/%m",
            },
            ZoomLevel::Days => ZoomConfig {
                unit_ms: DAY_MS,
                pixels_per_unit: 48.0,
                snap_ms: HOUR_MS,
                minor_tick_ms: 6 * HOUR_MS,
                major_tick_ms: DAY_MS,
                label_format: "%d/%m",
            },
            ZoomLevel::Hours => ZoomConfig {
                unit_ms: HOUR_MS,
                pixels_per_unit: 60.0,
                snap_ms: 15 * MINUTE_MS,
                minor_tick_ms: HOUR_MS,
                major_tick_ms: 6 * HOUR_MS,
                label_format: "%H:%M",
            },
            ZoomLevel::Minutes => ZoomConfig {
                unit_ms: MINUTE_MS,
                pixels_per_unit: 8.0,
                snap_ms: 5 * MINUTE_MS,
                minor_tick_ms: 5 * MINUTE_MS,
                major_tick_ms: 30 * MINUTE_MS,
                label_format: "%H:%M",
            },
        }
    }

    /// One step finer; clamped at `Minutes`.
    pub fn zoom_in(self) -> ZoomLevel {
        match self {
            ZoomLevel::Months => ZoomLevel::Weeks,
            ZoomLevel::Weeks => ZoomLevel::Days,
            ZoomLevel::Days => ZoomLevel::Hours,
            ZoomLevel::Hours | ZoomLevel::Minutes => ZoomLevel::Minutes,
        }
    }

    /// One step coarser; clamped at `Months`.
    pub fn zoom_out(self) -> ZoomLevel {
        match self {
            ZoomLevel::Months | ZoomLevel::Weeks => ZoomLevel::Months,
            ZoomLevel::Days => ZoomLevel::Weeks,
            ZoomLevel::Hours => ZoomLevel::Days,
            ZoomLevel::Minutes => ZoomLevel::Hours,
        }
    }

    /// The coarsest level that still resolves a span of `duration_ms`.
    pub fn for_duration(duration_ms: i64) -> ZoomLevel {
        if duration_ms > 3 * MONTH_MS {
            ZoomLevel::Months
        } else if duration_ms > 2 * WEEK_MS {
            ZoomLevel::Weeks
        } else if duration_ms > 3 * DAY_MS {
            ZoomLevel::Days
        } else if duration_ms > 6 * HOUR_MS {
            ZoomLevel::Hours
        } else {
            ZoomLevel::Minutes
        }
    }
}

/// One tick mark on the timeline header. Only major ticks carry a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub time_ms: i64,
    pub is_major: bool,
    pub label: String,
}

/// Generate the tick marks covering `[view_start, view_end]` at `level`.
///
/// Starts from the last major boundary at or before `view_start` and steps by
/// the minor granularity. Boundaries are exact epoch-ms multiples of the
/// granularities, not calendar boundaries.
pub fn ticks(view_start: i64, view_end: i64, level: ZoomLevel) -> Vec<Tick> {
    let cfg = level.config();
    if view_end <= view_start {
        return Vec::new();
    }

    let first = view_start - view_start.rem_euclid(cfg.major_tick_ms);
    let mut out = Vec::new();
    let mut t = first;
    while t <= view_end {
        let is_major = t.rem_euclid(cfg.major_tick_ms) == 0;
        let label = if is_major {
            format_tick_label(t, cfg.label_format)
        } else {
            String::new()
        };
        out.push(Tick {
            time_ms: t,
            is_major,
            label,
        });
        t += cfg.minor_tick_ms;
    }
    out
}

fn format_tick_label(time_ms: i64, format: &str) -> String {
    match Utc.timestamp_millis_opt(time_ms).single() {
        Some(dt) => dt.format(format).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_invert_off_boundary() {
        for level in [ZoomLevel::Weeks, ZoomLevel::Days, ZoomLevel::Hours] {
            assert_eq!(level.zoom_out().zoom_in(), level);
            assert_eq!(level.zoom_in().zoom_out(), level);
        }
    }

    #[test]
    fn zoom_clamps_at_both_ends() {
        assert_eq!(ZoomLevel::Minutes.zoom_in(), ZoomLevel::Minutes);
        assert_eq!(ZoomLevel::Months.zoom_out(), ZoomLevel::Months);
    }

    #[test]
    fn duration_classification_thresholds() {
        assert_eq!(ZoomLevel::for_duration(4 * MONTH_MS), ZoomLevel::Months);
        assert_eq!(ZoomLevel::for_duration(3 * MONTH_MS), ZoomLevel::Weeks);
        assert_eq!(ZoomLevel::for_duration(3 * WEEK_MS), ZoomLevel::Weeks);
        assert_eq!(ZoomLevel::for_duration(5 * DAY_MS), ZoomLevel::Days);
        assert_eq!(ZoomLevel::for_duration(12 * HOUR_MS), ZoomLevel::Hours);
        assert_eq!(ZoomLevel::for_duration(30 * MINUTE_MS), ZoomLevel::Minutes);
    }

    #[test]
    fn ticks_start_at_major_boundary_and_label_majors_only() {
        // Weeks: minor = day, major = week.
        let start = WEEK_MS + DAY_MS * 2;
        let end = start + WEEK_MS;
        let ticks = ticks(start, end, ZoomLevel::Weeks);

        assert_eq!(ticks.first().map(|t| t.time_ms), Some(WEEK_MS));
        for tick in &ticks {
            assert_eq!(tick.is_major, tick.time_ms.rem_euclid(WEEK_MS) == 0);
            assert_eq!(tick.is_major, !tick.label.is_empty());
        }
        assert!(ticks.last().map(|t| t.time_ms).unwrap() <= end);
        // Restartable: same inputs, same output.
        assert_eq!(ticks, super::ticks(start, end, ZoomLevel::Weeks));
    }

    #[test]
    fn degenerate_view_has_no_ticks() {
        assert!(ticks(1_000, 1_000, ZoomLevel::Days).is_empty());
    }

    #[test]
    fn level_configs_are_internally_consistent() {
        for level in ZoomLevel::ALL {
            let cfg = level.config();
            assert!(cfg.unit_ms > 0 && cfg.pixels_per_unit > 0.0);
            assert!(cfg.snap_ms <= cfg.minor_tick_ms);
            // Stepping by minors from a major boundary must hit every major.
            assert_eq!(cfg.major_tick_ms % cfg.minor_tick_ms, 0);
            assert!(!cfg.label_format.is_empty());
        }
    }
}
