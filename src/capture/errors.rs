//! Error types for capture operations.

use crate::capture::CaptureRect;
use crate::frame::FrameError;

/// Errors that can occur while acquiring or using a capture handle.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// FFmpeg executable not found
    #[error("FFmpeg not found. Install it and make sure `ffmpeg` is on PATH")]
    FfmpegNotFound,
    /// Failed to spawn FFmpeg
    #[error("Failed to spawn FFmpeg: {0}")]
    SpawnFailed(#[source] std::io::Error),
    /// FFmpeg stopped producing frames
    #[error("FFmpeg capture stream ended (exit code {exit_code:?})")]
    StreamEnded { exit_code: Option<i32> },
    /// Reading a frame from the capture stream failed
    #[error("Failed to read frame: {0}")]
    ReadFailed(#[source] std::io::Error),
    /// The handle streams a different rectangle than requested
    #[error("Capture handle streams {streaming:?}, requested {requested:?}")]
    RectMismatch {
        streaming: CaptureRect,
        requested: CaptureRect,
    },
    /// The capture handle was shut down
    #[error("Capture handle is closed")]
    Closed,
    /// Captured bytes do not form a valid frame
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),
    /// Capture collaborator specific failure
    #[error("Capture failed: {0}")]
    Other(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            CaptureError::FfmpegNotFound
        } else {
            CaptureError::SpawnFailed(e)
        }
    }
}
