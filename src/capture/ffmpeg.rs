//! Capture handle backed by a long-running FFmpeg process.
//!
//! FFmpeg streams raw rgb24 frames of a fixed rectangle on stdout; every
//! `capture` call reads exactly one frame's worth of bytes.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{CaptureError, CaptureRect, ScreenGrabber, ScreenSource};
use crate::frame::Frame;

/// How long a graceful FFmpeg shutdown may take before it is killed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// A running FFmpeg capture stream.
struct FfmpegStream {
    child: Child,
    stdout: ChildStdout,
    /// Handle for the stderr reader thread
    stderr_thread: Option<JoinHandle<()>>,
}

/// Capture handle streaming one screen rectangle through FFmpeg.
pub struct FfmpegGrabber {
    rect: CaptureRect,
    frame_len: usize,
    stream: Mutex<Option<FfmpegStream>>,
}

impl std::fmt::Debug for FfmpegGrabber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegGrabber")
            .field("rect", &self.rect)
            .finish_non_exhaustive()
    }
}

impl FfmpegGrabber {
    /// Spawn FFmpeg for `source`.
    ///
    /// # Errors
    /// * `CaptureError::FfmpegNotFound` - If the ffmpeg binary is missing
    /// * `CaptureError::SpawnFailed` - If the process cannot be started
    pub fn spawn(source: &ScreenSource) -> Result<Self, CaptureError> {
        let args = source.to_ffmpeg_args();
        log::debug!("Spawning ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::Other("ffmpeg stdout was not captured".into()));
            }
        };

        // Forward FFmpeg diagnostics to the log
        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                for line in reader.lines() {
                    match line {
                        Ok(l) => log::warn!("[ffmpeg] {}", l),
                        Err(_) => break,
                    }
                }
            })
        });

        Ok(Self {
            rect: source.rect,
            frame_len: Frame::byte_len(source.rect.width, source.rect.height),
            stream: Mutex::new(Some(FfmpegStream {
                child,
                stdout,
                stderr_thread,
            })),
        })
    }

    /// Stop FFmpeg. Safe to call more than once.
    ///
    /// Sends SIGINT (on unix) and waits up to two seconds before killing.
    pub fn shutdown(&self) -> Result<Option<ExitStatus>, CaptureError> {
        let stream = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match stream {
            Some(stream) => stop_stream(stream).map(Some),
            None => Ok(None),
        }
    }
}

impl ScreenGrabber for FfmpegGrabber {
    fn capture(&self, rect: CaptureRect) -> Result<Frame, CaptureError> {
        if rect != self.rect {
            return Err(CaptureError::RectMismatch {
                streaming: self.rect,
                requested: rect,
            });
        }

        let mut guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        let stream = guard.as_mut().ok_or(CaptureError::Closed)?;

        let mut data = vec![0u8; self.frame_len];
        if let Err(e) = stream.stdout.read_exact(&mut data) {
            if e.kind() != ErrorKind::UnexpectedEof {
                return Err(CaptureError::ReadFailed(e));
            }
            // FFmpeg is gone; reap it so the next call reports Closed
            let exit_code = guard
                .take()
                .and_then(|s| stop_stream(s).ok())
                .and_then(|status| status.code());
            return Err(CaptureError::StreamEnded { exit_code });
        }

        Ok(Frame::from_rgb(self.rect.width, self.rect.height, data)?)
    }
}

impl Drop for FfmpegGrabber {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Failed to stop ffmpeg capture: {}", e);
        }
    }
}

fn stop_stream(mut stream: FfmpegStream) -> Result<ExitStatus, CaptureError> {
    // Send SIGINT (equivalent to Ctrl+C) so FFmpeg exits cleanly
    #[cfg(unix)]
    {
        if matches!(stream.child.try_wait(), Ok(None)) {
            unsafe {
                libc::kill(stream.child.id() as i32, libc::SIGINT);
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = stream.child.kill();
    }

    // Closing our end of the pipe unblocks an FFmpeg stuck on a full stdout
    drop(stream.stdout);

    let start = Instant::now();
    let status = loop {
        match stream.child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > SHUTDOWN_TIMEOUT {
                    let _ = stream.child.kill();
                    break stream.child.wait().map_err(CaptureError::ReadFailed)?;
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(CaptureError::ReadFailed(e)),
        }
    };

    if let Some(handle) = stream.stderr_thread.take() {
        let _ = handle.join();
    }
    Ok(status)
}
