//! Pixel and color types shared by the capture and transmit stages.

use std::fmt;

/// An RGB color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const BLACK: ColorSample = ColorSample { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Errors raised when building a [`Frame`] from raw bytes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} rgb24")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A captured screen region in packed rgb24 layout.
///
/// Frames are owned by the producer that captured them and are dropped once
/// reduced.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Bytes per pixel in the rgb24 layout.
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Wrap a raw rgb24 buffer. The buffer must hold exactly
    /// `width * height * 3` bytes and both dimensions must be non-zero.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyFrame { width, height });
        }
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A frame filled with a single color.
    pub fn solid(width: u32, height: u32, color: ColorSample) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * Self::BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&[color.r, color.g, color.b]);
        }
        Self::from_rgb(width, height, data)
    }

    /// Number of bytes an rgb24 frame of the given size occupies.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Color of the pixel at `(x, y)`. Callers keep coordinates in bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> ColorSample {
        let offset = (y * self.width as usize + x) * Self::BYTES_PER_PIXEL;
        ColorSample {
            r: self.data[offset],
            g: self.data[offset + 1],
            b: self.data[offset + 2],
        }
    }
}

/// One color per LED, position `i` holding the color of LED index `i + 1`.
///
/// Immutable once built; ownership moves producer → queue → consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedFrame {
    colors: Box<[ColorSample]>,
}

impl LedFrame {
    pub fn new(colors: Vec<ColorSample>) -> Self {
        Self {
            colors: colors.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[ColorSample] {
        &self.colors
    }
}

impl From<Vec<ColorSample>> for LedFrame {
    fn from(colors: Vec<ColorSample>) -> Self {
        Self::new(colors)
    }
}
