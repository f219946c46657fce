//! Frame reduction: one representative color per LED zone.
//!
//! Each LED is sampled on a sparse 6x6 probe grid, 10 px apart, anchored at
//! the LED coordinate after OS-scaling and offset are applied. The 36 probes
//! are averaged with integer truncation. This trades color fidelity for speed;
//! it is not an area average.

use crate::frame::{ColorSample, Frame, LedFrame};
use crate::geometry::{LedCoordinate, LedGeometry};

/// Probes per axis.
pub const PROBES_PER_AXIS: i64 = 6;

/// Distance between neighbouring probes, in pixels.
pub const PROBE_SPACING: i64 = 10;

/// Width of the band kept clear at the right/bottom frame edge.
pub const SAMPLE_SPAN: i64 = PROBES_PER_AXIS * PROBE_SPACING;

const PROBE_COUNT: u32 = (PROBES_PER_AXIS * PROBES_PER_AXIS) as u32;

/// Parameters that shift LED coordinates into frame space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceSettings {
    /// OS display scaling in percent. Must be greater than zero.
    pub os_scaling_percent: u32,
    /// Pixel offset added to both axes after scaling.
    pub led_offset: i32,
}

impl Default for ReduceSettings {
    fn default() -> Self {
        Self {
            os_scaling_percent: 100,
            led_offset: 0,
        }
    }
}

/// Reduce a captured frame to one color per LED, in ascending LED index order.
///
/// The frame is only read. `settings.os_scaling_percent` must be non-zero;
/// configuration validation guarantees it.
pub fn reduce(frame: &Frame, geometry: &LedGeometry, settings: ReduceSettings) -> LedFrame {
    let mut colors = vec![ColorSample::BLACK; geometry.len()];
    for (position, led) in geometry.iter().enumerate() {
        // Geometry is dense and sorted, so position == index - 1.
        colors[position] = average_color(frame, led, settings);
    }
    LedFrame::new(colors)
}

/// Average color of the probe grid belonging to one LED.
pub fn average_color(frame: &Frame, led: &LedCoordinate, settings: ReduceSettings) -> ColorSample {
    let base_x = scaled_base(led.x, settings);
    let base_y = scaled_base(led.y, settings);
    let limit_x = probe_limit(frame.width());
    let limit_y = probe_limit(frame.height());

    let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
    for dx in 0..PROBES_PER_AXIS {
        let x = clamp_probe(base_x + PROBE_SPACING * dx, limit_x);
        for dy in 0..PROBES_PER_AXIS {
            let y = clamp_probe(base_y + PROBE_SPACING * dy, limit_y);
            let pixel = frame.pixel(x, y);
            r += u32::from(pixel.r);
            g += u32::from(pixel.g);
            b += u32::from(pixel.b);
        }
    }

    ColorSample {
        r: (r / PROBE_COUNT) as u8,
        g: (g / PROBE_COUNT) as u8,
        b: (b / PROBE_COUNT) as u8,
    }
}

/// `coord * 100 / os_scaling + offset`, with integer truncation.
fn scaled_base(coord: i32, settings: ReduceSettings) -> i64 {
    i64::from(coord) * 100 / i64::from(settings.os_scaling_percent) + i64::from(settings.led_offset)
}

/// Largest probe coordinate allowed on an axis of `extent` pixels.
///
/// Probes stay inside `[0, extent - 60)`. Frames narrower than the sample span
/// collapse onto pixel 0.
fn probe_limit(extent: u32) -> i64 {
    (i64::from(extent) - SAMPLE_SPAN - 1).max(0)
}

fn clamp_probe(value: i64, limit: i64) -> usize {
    value.clamp(0, limit) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(x: i32, y: i32) -> LedGeometry {
        LedGeometry::new(vec![LedCoordinate { index: 1, x, y }]).unwrap()
    }

    /// Frame where each pixel's red channel is its x coordinate (mod 256)
    /// and green channel is its y coordinate (mod 256).
    fn gradient(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity(Frame::byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0]);
            }
        }
        Frame::from_rgb(width, height, data).unwrap()
    }

    #[test]
    fn test_probe_limit_is_exclusive_of_span_edge() {
        assert_eq!(probe_limit(1920), 1859);
        assert_eq!(probe_limit(61), 0);
        assert_eq!(probe_limit(60), 0);
        assert_eq!(probe_limit(1), 0);
    }

    #[test]
    fn test_scaled_base_applies_scaling_then_offset() {
        let settings = ReduceSettings {
            os_scaling_percent: 150,
            led_offset: 5,
        };
        // 300 * 100 / 150 = 200, + 5
        assert_eq!(scaled_base(300, settings), 205);
        // Truncation: 1 * 100 / 150 = 0
        assert_eq!(scaled_base(1, settings), 5);
    }

    #[test]
    fn test_average_of_probe_grid() {
        // Probes at x = 10, 20, ..., 60 -> red average 35
        // Probes at y = 0, 10, ..., 50 -> green average 25
        let frame = gradient(200, 200);
        let color = average_color(
            &frame,
            &LedCoordinate { index: 1, x: 10, y: 0 },
            ReduceSettings::default(),
        );
        assert_eq!(color, ColorSample::new(35, 25, 0));
    }

    #[test]
    fn test_negative_coordinates_clamp_to_zero() {
        let frame = gradient(200, 200);
        let settings = ReduceSettings {
            os_scaling_percent: 100,
            led_offset: -500,
        };
        let leds = reduce(&frame, &single(0, 0), settings);
        assert_eq!(leds.colors()[0], ColorSample::new(0, 0, 0));
    }

    #[test]
    fn test_far_edge_samples_fixed_interior_column() {
        // Every probe beyond the limit collapses to x = 200 - 61 = 139
        let frame = gradient(200, 200);
        let leds = reduce(&frame, &single(5000, 5000), ReduceSettings::default());
        assert_eq!(leds.colors()[0], ColorSample::new(139, 139, 0));
    }

    #[test]
    fn test_reduce_preserves_index_order() {
        let frame = gradient(300, 100);
        let geometry = LedGeometry::new(vec![
            LedCoordinate { index: 2, x: 100, y: 0 },
            LedCoordinate { index: 1, x: 0, y: 0 },
        ])
        .unwrap();
        let leds = reduce(&frame, &geometry, ReduceSettings::default());
        assert_eq!(leds.len(), 2);
        assert!(leds.colors()[0].r < leds.colors()[1].r);
    }
}
