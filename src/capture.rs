//! Screen capture seam.
//!
//! The pipeline only needs "give me the pixels of this rectangle". That is the
//! [`ScreenGrabber`] trait. The default implementation streams raw frames from
//! a long-lived FFmpeg process (see [`FfmpegGrabber`]); tests plug in their own.

mod errors;
mod ffmpeg;

pub use errors::CaptureError;
pub use ffmpeg::FfmpegGrabber;

use std::sync::Arc;

use crate::frame::Frame;

/// Screen rectangle to capture, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRect {
    /// Rectangle covering a whole screen of the given resolution.
    pub fn full_screen(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// FFmpeg crop filter for this rectangle.
    ///
    /// Format: crop=width:height:x:y
    pub fn crop_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// A capture handle.
///
/// Handles are expensive native resources and are shared by a small group of
/// producers, so `capture` takes `&self`; implementations serialize calls
/// internally.
pub trait ScreenGrabber: Send + Sync {
    /// Capture the pixels of `rect`. Blocks until a frame is available.
    fn capture(&self, rect: CaptureRect) -> Result<Frame, CaptureError>;
}

/// Capture handle shared across a producer group.
pub type SharedGrabber = Arc<dyn ScreenGrabber>;

/// FFmpeg input description for a screen source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSource {
    /// Region of the screen to stream
    pub rect: CaptureRect,
    /// Frames per second requested from FFmpeg
    pub framerate: u32,
    /// Input format override (x11grab, avfoundation, gdigrab, ...)
    pub format: Option<String>,
    /// Input device override (":0.0", "Capture screen 0", "desktop", ...)
    pub input: Option<String>,
}

impl ScreenSource {
    pub fn new(rect: CaptureRect, framerate: u32) -> Self {
        Self {
            rect,
            framerate: framerate.max(1),
            format: None,
            input: None,
        }
    }

    /// Override the FFmpeg input format and device.
    pub fn with_input(mut self, format: Option<String>, input: Option<String>) -> Self {
        self.format = format;
        self.input = input;
        self
    }

    /// Full FFmpeg argument list: platform input followed by a raw rgb24
    /// stream on stdout.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
        ];
        args.extend(self.input_args());
        args.extend([
            "-an".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-".into(),
        ]);
        args
    }

    #[cfg(target_os = "macos")]
    fn input_args(&self) -> Vec<String> {
        // AVFoundation always delivers the whole screen; crop afterwards.
        vec![
            "-f".into(),
            self.format.clone().unwrap_or_else(|| "avfoundation".into()),
            "-framerate".into(),
            self.framerate.to_string(),
            "-capture_cursor".into(),
            "0".into(),
            "-i".into(),
            self.input.clone().unwrap_or_else(|| "Capture screen 0".into()),
            "-vf".into(),
            self.rect.crop_filter(),
        ]
    }

    #[cfg(target_os = "windows")]
    fn input_args(&self) -> Vec<String> {
        vec![
            "-f".into(),
            self.format.clone().unwrap_or_else(|| "gdigrab".into()),
            "-framerate".into(),
            self.framerate.to_string(),
            "-draw_mouse".into(),
            "0".into(),
            "-offset_x".into(),
            self.rect.x.to_string(),
            "-offset_y".into(),
            self.rect.y.to_string(),
            "-video_size".into(),
            format!("{}x{}", self.rect.width, self.rect.height),
            "-i".into(),
            self.input.clone().unwrap_or_else(|| "desktop".into()),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn input_args(&self) -> Vec<String> {
        let display = self.input.clone().unwrap_or_else(|| {
            std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string())
        });
        vec![
            "-f".into(),
            self.format.clone().unwrap_or_else(|| "x11grab".into()),
            "-framerate".into(),
            self.framerate.to_string(),
            "-draw_mouse".into(),
            "0".into(),
            "-video_size".into(),
            format!("{}x{}", self.rect.width, self.rect.height),
            "-i".into(),
            format!("{}+{},{}", display, self.rect.x, self.rect.y),
        ]
    }
}
