//! Boundary and shape tests for frame reduction.

use ambilight_stream::frame::{ColorSample, Frame};
use ambilight_stream::geometry::{perimeter_layout, EdgeCounts, LedCoordinate, LedGeometry};
use ambilight_stream::reduce::{reduce, ReduceSettings};

/// Frame with a distinct color per pixel so wrong indexing shows up.
fn noise_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity(Frame::byte_len(width, height));
    let mut state: u32 = 0x1234_5678;
    for _ in 0..(width * height * 3) {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        data.push((state & 0xFF) as u8);
    }
    Frame::from_rgb(width, height, data).unwrap()
}

fn grid_geometry(count: u32, spread: i32) -> LedGeometry {
    let leds = (0..count)
        .map(|i| LedCoordinate {
            index: i + 1,
            x: (i as i32 * 37) % spread - spread / 4,
            y: (i as i32 * 53) % spread - spread / 4,
        })
        .collect();
    LedGeometry::new(leds).unwrap()
}

#[test]
fn test_output_length_matches_geometry() {
    let frame = noise_frame(320, 200);
    for count in [1, 2, 7, 64, 300] {
        let geometry = grid_geometry(count, 2000);
        let leds = reduce(&frame, &geometry, ReduceSettings::default());
        assert_eq!(leds.len(), count as usize);
    }
}

#[test]
fn test_no_out_of_bounds_for_any_scaling_or_offset() {
    let geometry = grid_geometry(50, 5000);
    let sizes = [(1, 1), (1, 500), (500, 1), (59, 59), (60, 60), (61, 61), (640, 360)];
    let scalings = [1, 50, 100, 125, 150, 200, 400];
    let offsets = [-10_000, -61, -1, 0, 1, 59, 60, 10_000];

    for &(w, h) in &sizes {
        let frame = noise_frame(w, h);
        for &os_scaling_percent in &scalings {
            for &led_offset in &offsets {
                let settings = ReduceSettings {
                    os_scaling_percent,
                    led_offset,
                };
                let leds = reduce(&frame, &geometry, settings);
                assert_eq!(leds.len(), 50);
            }
        }
    }
}

#[test]
fn test_degenerate_single_pixel_frame_at_corners() {
    let frame = Frame::solid(1, 1, ColorSample::new(9, 99, 199)).unwrap();
    for (x, y) in [(0, 0), (i32::MAX, 0), (0, i32::MAX), (i32::MIN, i32::MIN)] {
        let geometry = LedGeometry::new(vec![LedCoordinate { index: 1, x, y }]).unwrap();
        let leds = reduce(&frame, &geometry, ReduceSettings::default());
        assert_eq!(leds.colors(), &[ColorSample::new(9, 99, 199)]);
    }
}

#[test]
fn test_uniform_frame_reduces_to_its_color_everywhere() {
    let color = ColorSample::new(17, 128, 255);
    let frame = Frame::solid(1280, 720, color).unwrap();
    let geometry = perimeter_layout(EdgeCounts::default(), 1280, 720, 125).unwrap();
    let settings = ReduceSettings {
        os_scaling_percent: 125,
        led_offset: 3,
    };
    let leds = reduce(&frame, &geometry, settings);
    assert!(leds.colors().iter().all(|c| *c == color));
}

#[test]
fn test_reduce_does_not_mutate_frame() {
    let frame = noise_frame(200, 100);
    let before = frame.data().to_vec();
    let _ = reduce(&frame, &grid_geometry(20, 400), ReduceSettings::default());
    assert_eq!(frame.data(), before.as_slice());
}

#[test]
fn test_half_and_half_frame_averages_by_probe_count() {
    // Left 30 columns white, the rest black: 3 of 6 probe columns are white
    let (w, h) = (200u32, 100u32);
    let mut data = Vec::with_capacity(Frame::byte_len(w, h));
    for _y in 0..h {
        for x in 0..w {
            let v = if x < 30 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v]);
        }
    }
    let frame = Frame::from_rgb(w, h, data).unwrap();
    let geometry = LedGeometry::new(vec![LedCoordinate { index: 1, x: 0, y: 0 }]).unwrap();
    let leds = reduce(&frame, &geometry, ReduceSettings::default());
    // 18 * 255 / 36 = 127 (truncated)
    assert_eq!(leds.colors()[0], ColorSample::new(127, 127, 127));
}

#[test]
fn test_scaled_perimeter_layout_samples_screen_edges() {
    // Right quarter red, the rest black
    let (w, h) = (1920u32, 1080u32);
    let red = ColorSample::new(255, 0, 0);
    let mut data = Vec::with_capacity(Frame::byte_len(w, h));
    for _y in 0..h {
        for x in 0..w {
            let c = if x >= w * 3 / 4 { red } else { ColorSample::BLACK };
            data.extend_from_slice(&[c.r, c.g, c.b]);
        }
    }
    let frame = Frame::from_rgb(w, h, data).unwrap();

    let counts = EdgeCounts {
        top: 0,
        right: 4,
        bottom: 0,
        left: 2,
    };
    for os_scaling_percent in [100, 125, 150, 200] {
        let geometry = perimeter_layout(counts, w, h, os_scaling_percent).unwrap();
        let settings = ReduceSettings {
            os_scaling_percent,
            led_offset: 0,
        };
        let leds = reduce(&frame, &geometry, settings);
        let (left, right) = leds.colors().split_at(2);
        assert!(
            left.iter().all(|c| *c == ColorSample::BLACK),
            "left edge at {}%: {:?}",
            os_scaling_percent,
            left
        );
        assert!(
            right.iter().all(|c| *c == red),
            "right edge at {}%: {:?}",
            os_scaling_percent,
            right
        );
    }
}
