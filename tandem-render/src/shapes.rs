//! CPU-side shape generation for the two scenes.
//!
//! Both functions are pure: same inputs, same instances. The producer calls
//! [`meter`] every tick; the consumer builds its [`checkerboard`] once per
//! background change.

use std::f32::consts::TAU;

use crate::vertex::RectInstance;

/// Number of bars in the level meter.
pub const METER_BARS: usize = 24;

const CHECKER_LIGHT: [f32; 4] = [0.80, 0.80, 0.80, 1.0];
const CHECKER_DARK: [f32; 4] = [0.55, 0.55, 0.55, 1.0];

/// Transparency pattern covering `width × height` with `cell`-pixel
/// squares. Edge cells are clipped to the target.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<RectInstance> {
    if cell == 0 || width == 0 || height == 0 {
        return Vec::new();
    }
    let cols = width.div_ceil(cell);
    let rows = height.div_ceil(cell);
    let mut out = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * cell;
            let y = row * cell;
            let w = cell.min(width - x);
            let h = cell.min(height - y);
            let color = if (row + col) % 2 == 0 {
                CHECKER_LIGHT
            } else {
                CHECKER_DARK
            };
            out.push(RectInstance::new(
                x as f32, y as f32, w as f32, h as f32, color,
            ));
        }
    }
    out
}

/// Bar level in `[0, 1]` for bar `index` at time `t` seconds.
pub fn meter_level(t: f64, index: usize) -> f32 {
    let phase = t as f32 * 0.5 * TAU + index as f32 * 0.45;
    0.5 + 0.5 * phase.sin()
}

/// Animated level meter: [`METER_BARS`] vertical bars whose heights follow
/// the clock, plus a sweep marker crossing the target every two seconds.
pub fn meter(t: f64, width: u32, height: u32) -> Vec<RectInstance> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (w, h) = (width as f32, height as f32);
    let margin = (w.min(h) * 0.05).max(1.0);
    let slot = (w - 2.0 * margin) / METER_BARS as f32;
    let bar_w = (slot * 0.7).max(1.0);
    let max_h = h - 2.0 * margin;

    let mut out = Vec::with_capacity(METER_BARS + 1);
    for i in 0..METER_BARS {
        let level = meter_level(t, i);
        let bar_h = (max_h * level).max(1.0);
        let x = margin + i as f32 * slot + (slot - bar_w) * 0.5;
        let y = margin + max_h - bar_h;
        // Green at rest, red at full scale.
        let color = [level, 1.0 - level * 0.8, 0.2, 1.0];
        out.push(RectInstance::new(x, y, bar_w, bar_h, color));
    }

    let sweep = (t.rem_euclid(2.0) / 2.0) as f32;
    out.push(RectInstance::new(
        sweep * (w - 2.0),
        0.0,
        2.0,
        h,
        [1.0, 1.0, 1.0, 0.8],
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_covers_target() {
        let cells = checkerboard(100, 50, 16);
        // 7 columns (last clipped to 4 px), 4 rows (last clipped to 2 px).
        assert_eq!(cells.len(), 7 * 4);
        let area: f32 = cells.iter().map(|c| c.extent[0] * c.extent[1]).sum();
        assert_eq!(area, 100.0 * 50.0);
        let last = cells.last().unwrap();
        assert_eq!(last.origin, [96.0, 48.0]);
        assert_eq!(last.extent, [4.0, 2.0]);
    }

    #[test]
    fn test_checkerboard_alternates() {
        let cells = checkerboard(32, 32, 16);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].color, cells[3].color);
        assert_ne!(cells[0].color, cells[1].color);
    }

    #[test]
    fn test_checkerboard_degenerate() {
        assert!(checkerboard(0, 10, 8).is_empty());
        assert!(checkerboard(10, 10, 0).is_empty());
    }

    #[test]
    fn test_meter_within_bounds() {
        for step in 0..50 {
            let t = step as f64 * 0.137;
            let rects = meter(t, 640, 360);
            assert_eq!(rects.len(), METER_BARS + 1);
            for r in &rects {
                assert!(r.origin[0] >= 0.0 && r.origin[1] >= 0.0);
                assert!(r.origin[0] + r.extent[0] <= 640.0 + 1e-3);
                assert!(r.origin[1] + r.extent[1] <= 360.0 + 1e-3);
            }
        }
    }

    #[test]
    fn test_meter_is_deterministic_and_animated() {
        assert_eq!(meter(1.25, 320, 200), meter(1.25, 320, 200));
        assert_ne!(meter(0.0, 320, 200), meter(0.3, 320, 200));
    }

    #[test]
    fn test_meter_level_range() {
        for i in 0..METER_BARS {
            let level = meter_level(i as f64 * 0.01, i);
            assert!((0.0..=1.0).contains(&level));
        }
    }
}
