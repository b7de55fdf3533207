//! Pure time <-> pixel conversions for the reversed (RTL) time axis.
//!
//! The view's end instant maps to pixel 0 and its start instant maps to pixel
//! `width`, so time advances right-to-left.

/// Convert an instant (epoch ms) to an x offset inside a viewport of `width`
/// pixels. Degenerate viewports (`view_end <= view_start`) map everything to 0.
pub fn time_to_pixel(t: i64, view_start: i64, view_end: i64, width: f32) -> f32 {
    if view_end <= view_start {
        return 0.0;
    }
    let span = (view_end - view_start) as f64;
    let frac = (t - view_start) as f64 / span;
    (f64::from(width) * (1.0 - frac)) as f32
}

/// Inverse of [`time_to_pixel`]. A non-positive `width` returns `view_start`.
pub fn pixel_to_time(px: f32, view_start: i64, view_end: i64, width: f32) -> i64 {
    if width <= 0.0 {
        return view_start;
    }
    let span = (view_end - view_start) as f64;
    let frac = 1.0 - f64::from(px) / f64::from(width);
    view_start + (frac * span).round() as i64
}

/// Round `t` to the nearest multiple of `interval` (same unit as `t`).
/// Non-positive intervals leave `t` unchanged.
pub fn snap_time(t: i64, interval: i64) -> i64 {
    if interval <= 0 {
        return t;
    }
    let rem = t.rem_euclid(interval);
    if rem * 2 >= interval {
        t - rem + interval
    } else {
        t - rem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_axis_boundaries() {
        assert_eq!(time_to_pixel(0, 0, 1_000, 500.0), 500.0);
        assert_eq!(time_to_pixel(1_000, 0, 1_000, 500.0), 0.0);
    }

    #[test]
    fn degenerate_viewport_maps_to_zero() {
        assert_eq!(time_to_pixel(123, 1_000, 1_000, 500.0), 0.0);
        assert_eq!(time_to_pixel(123, 1_000, 900, 500.0), 0.0);
    }

    #[test]
    fn zero_width_inverse_returns_view_start() {
        assert_eq!(pixel_to_time(40.0, 7_000, 9_000, 0.0), 7_000);
        assert_eq!(pixel_to_time(40.0, 7_000, 9_000, -3.0), 7_000);
    }

    #[test]
    fn round_trips_within_rounding() {
        let (vs, ve, w) = (1_700_000_000_000_i64, 1_700_086_400_000_i64, 1280.0);
        for t in [vs, vs + 1_234_567, (vs + ve) / 2, ve - 42, ve] {
            let back = pixel_to_time(time_to_pixel(t, vs, ve, w), vs, ve, w);
            assert!((back - t).abs() <= (ve - vs) / 1280 + 1, "t={t} back={back}");
        }
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap_time(1_499, 1_000), 1_000);
        assert_eq!(snap_time(1_500, 1_000), 2_000);
        assert_eq!(snap_time(-1_499, 1_000), -1_000);
        assert_eq!(snap_time(-1_500, 1_000), -1_000);
        assert_eq!(snap_time(42, 0), 42);
    }
}
