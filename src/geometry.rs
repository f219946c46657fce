//! LED geometry: the static mapping from LED index to screen coordinate.

use serde::{Deserialize, Serialize};

/// Screen position sampled for one LED.
///
/// Indices are 1-based and dense across a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedCoordinate {
    pub index: u32,
    pub x: i32,
    pub y: i32,
}

/// Errors that make a set of coordinates unusable as a geometry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("LED geometry is empty")]
    Empty,
    #[error("LED index {0} is out of range (indices start at 1)")]
    ZeroIndex(u32),
    #[error("LED index {0} is defined more than once")]
    DuplicateIndex(u32),
    #[error("LED indices must be dense 1..={len}, missing index {missing}")]
    MissingIndex { missing: u32, len: usize },
}

/// Ordered LED coordinates, keyed by index.
///
/// Iteration yields LEDs in ascending index order, so position `i` always
/// belongs to LED index `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedGeometry {
    leds: Vec<LedCoordinate>,
}

impl LedGeometry {
    /// Build a geometry, checking that indices are unique and dense `1..=N`.
    pub fn new(mut leds: Vec<LedCoordinate>) -> Result<Self, GeometryError> {
        if leds.is_empty() {
            return Err(GeometryError::Empty);
        }
        leds.sort_by_key(|led| led.index);

        for (position, led) in leds.iter().enumerate() {
            if led.index == 0 {
                return Err(GeometryError::ZeroIndex(led.index));
            }
            let expected = position as u32 + 1;
            if led.index < expected {
                return Err(GeometryError::DuplicateIndex(led.index));
            }
            if led.index > expected {
                return Err(GeometryError::MissingIndex {
                    missing: expected,
                    len: leds.len(),
                });
            }
        }

        Ok(Self { leds })
    }

    /// Number of LEDs on the strip.
    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &LedCoordinate> {
        self.leds.iter()
    }

    /// Coordinate of LED `index` (1-based).
    pub fn get(&self, index: u32) -> Option<&LedCoordinate> {
        let position = index.checked_sub(1)? as usize;
        self.leds.get(position)
    }
}

/// LED counts along each screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub bottom: u32,
    #[serde(default)]
    pub left: u32,
}

impl Default for EdgeCounts {
    fn default() -> Self {
        Self {
            top: 20,
            right: 12,
            bottom: 20,
            left: 12,
        }
    }
}

impl EdgeCounts {
    pub fn total(&self) -> u32 {
        self.top + self.right + self.bottom + self.left
    }
}

/// Size of the sampling window anchored at each coordinate.
const WINDOW: i32 = 60;

/// Lay LEDs around the screen perimeter, clockwise from the bottom-left corner.
///
/// Left edge runs bottom to top, top edge left to right, right edge top to
/// bottom, bottom edge right to left. Each sampling window sits just inside
/// the edge it belongs to on the physical `screen_width`x`screen_height`
/// frame.
///
/// The reducer divides coordinates by `os_scaling_percent / 100`, so the
/// emitted coordinates are multiplied by the same factor (rounded up) to land
/// back on the physical pixel after reduction.
pub fn perimeter_layout(
    counts: EdgeCounts,
    screen_width: u32,
    screen_height: u32,
    os_scaling_percent: u32,
) -> Result<LedGeometry, GeometryError> {
    let width = screen_width as i32;
    let height = screen_height as i32;
    let far_x = (width - WINDOW).max(0);
    let far_y = (height - WINDOW).max(0);

    let mut leds = Vec::with_capacity(counts.total() as usize);
    let scaling = i64::from(os_scaling_percent.max(1));
    let to_logical = |v: i32| ((i64::from(v) * scaling + 99) / 100) as i32;
    let mut push = |x: i32, y: i32| {
        let index = leds.len() as u32 + 1;
        leds.push(LedCoordinate {
            index,
            x: to_logical(x),
            y: to_logical(y),
        });
    };

    for i in 0..counts.left {
        let step = span_step(height, counts.left, i);
        push(0, far_y - step.min(far_y));
    }
    for i in 0..counts.top {
        push(span_step(width, counts.top, i).min(far_x), 0);
    }
    for i in 0..counts.right {
        push(far_x, span_step(height, counts.right, i).min(far_y));
    }
    for i in 0..counts.bottom {
        let step = span_step(width, counts.bottom, i);
        push(far_x - step.min(far_x), far_y);
    }

    LedGeometry::new(leds)
}

/// Offset of slot `i` when `count` slots share `extent` pixels evenly.
fn span_step(extent: i32, count: u32, i: u32) -> i32 {
    (i64::from(extent) * i64::from(i) / i64::from(count.max(1))) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(index: u32, x: i32, y: i32) -> LedCoordinate {
        LedCoordinate { index, x, y }
    }

    #[test]
    fn test_geometry_sorts_by_index() {
        let geometry =
            LedGeometry::new(vec![coord(2, 20, 0), coord(1, 10, 0), coord(3, 30, 0)]).unwrap();
        let indices: Vec<u32> = geometry.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(geometry.get(2).unwrap().x, 20);
        assert!(geometry.get(0).is_none());
        assert!(geometry.get(4).is_none());
    }

    #[test]
    fn test_geometry_rejects_duplicates() {
        let err = LedGeometry::new(vec![coord(1, 0, 0), coord(1, 5, 5)]).unwrap_err();
        assert_eq!(err, GeometryError::DuplicateIndex(1));
    }

    #[test]
    fn test_geometry_rejects_gaps() {
        let err = LedGeometry::new(vec![coord(1, 0, 0), coord(3, 5, 5)]).unwrap_err();
        assert_eq!(err, GeometryError::MissingIndex { missing: 2, len: 2 });
    }

    #[test]
    fn test_geometry_rejects_zero_and_empty() {
        assert_eq!(
            LedGeometry::new(vec![coord(0, 0, 0)]).unwrap_err(),
            GeometryError::ZeroIndex(0)
        );
        assert_eq!(LedGeometry::new(Vec::new()).unwrap_err(), GeometryError::Empty);
    }

    #[test]
    fn test_perimeter_layout_counts_and_corners() {
        let counts = EdgeCounts {
            top: 4,
            right: 2,
            bottom: 4,
            left: 2,
        };
        let geometry = perimeter_layout(counts, 1920, 1080, 100).unwrap();
        assert_eq!(geometry.len(), 12);

        // First LED sits at the bottom of the left edge
        assert_eq!(*geometry.get(1).unwrap(), coord(1, 0, 1020));
        // First top LED sits at the top-left corner
        assert_eq!(*geometry.get(3).unwrap(), coord(3, 0, 0));
        // First right LED sits at the top-right corner
        assert_eq!(*geometry.get(7).unwrap(), coord(7, 1860, 0));
        // First bottom LED sits at the bottom-right corner
        assert_eq!(*geometry.get(9).unwrap(), coord(9, 1860, 1020));
    }

    #[test]
    fn test_perimeter_layout_stays_on_screen() {
        let geometry = perimeter_layout(EdgeCounts::default(), 640, 480, 100).unwrap();
        for led in geometry.iter() {
            assert!((0..=580).contains(&led.x), "x out of range: {:?}", led);
            assert!((0..=420).contains(&led.y), "y out of range: {:?}", led);
        }
    }

    #[test]
    fn test_perimeter_layout_scales_with_os_scaling() {
        let counts = EdgeCounts {
            top: 0,
            right: 2,
            bottom: 0,
            left: 0,
        };
        let geometry = perimeter_layout(counts, 1920, 1080, 150).unwrap();
        assert_eq!(*geometry.get(1).unwrap(), coord(1, 2790, 0));
        assert_eq!(*geometry.get(2).unwrap(), coord(2, 2790, 810));
    }

    #[test]
    fn test_perimeter_layout_empty_counts() {
        let counts = EdgeCounts {
            top: 0,
            right: 0,
            bottom: 0,
            left: 0,
        };
        assert_eq!(
            perimeter_layout(counts, 1920, 1080, 100).unwrap_err(),
            GeometryError::Empty
        );
    }
}
