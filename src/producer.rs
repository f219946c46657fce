//! Capture producer: one scheduled capture → reduce → offer cycle.

use std::sync::Arc;

use crate::capture::{CaptureRect, SharedGrabber};
use crate::geometry::LedGeometry;
use crate::queue::HandoffQueue;
use crate::reduce::{reduce, ReduceSettings};

/// Outcome of a single producer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Frame reduced and enqueued
    Enqueued,
    /// Frame reduced but the queue was full
    Dropped,
    /// Capture failed; the tick was skipped
    Skipped,
}

/// Captures the screen on every tick and feeds reduced frames to the queue.
///
/// Several producers share one capture handle.
pub struct CaptureProducer {
    slot: usize,
    grabber: SharedGrabber,
    geometry: Arc<LedGeometry>,
    rect: CaptureRect,
    settings: ReduceSettings,
    queue: HandoffQueue,
}

impl CaptureProducer {
    pub fn new(
        slot: usize,
        grabber: SharedGrabber,
        geometry: Arc<LedGeometry>,
        rect: CaptureRect,
        settings: ReduceSettings,
        queue: HandoffQueue,
    ) -> Self {
        Self {
            slot,
            grabber,
            geometry,
            rect,
            settings,
            queue,
        }
    }

    /// Run one capture cycle. Never blocks on the queue and never fails;
    /// capture errors are logged and the tick is skipped.
    pub fn tick(&self) -> TickOutcome {
        let frame = match self.grabber.capture(self.rect) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Producer {}: capture failed, skipping tick: {}", self.slot, e);
                return TickOutcome::Skipped;
            }
        };

        let leds = reduce(&frame, &self.geometry, self.settings);
        drop(frame);

        if self.queue.offer(leds) {
            TickOutcome::Enqueued
        } else {
            log::trace!("Producer {}: queue full, frame dropped", self.slot);
            TickOutcome::Dropped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureError, ScreenGrabber};
    use crate::frame::{ColorSample, Frame};
    use crate::geometry::LedCoordinate;

    struct SolidGrabber(ColorSample);

    impl ScreenGrabber for SolidGrabber {
        fn capture(&self, rect: CaptureRect) -> Result<Frame, CaptureError> {
            Ok(Frame::solid(rect.width, rect.height, self.0)?)
        }
    }

    struct FailingGrabber;

    impl ScreenGrabber for FailingGrabber {
        fn capture(&self, _rect: CaptureRect) -> Result<Frame, CaptureError> {
            Err(CaptureError::Other("display asleep".into()))
        }
    }

    fn producer(grabber: SharedGrabber, queue: HandoffQueue) -> CaptureProducer {
        let geometry = LedGeometry::new(vec![
            LedCoordinate { index: 1, x: 0, y: 0 },
            LedCoordinate { index: 2, x: 50, y: 50 },
        ])
        .unwrap();
        CaptureProducer::new(
            0,
            grabber,
            Arc::new(geometry),
            CaptureRect::full_screen(120, 120),
            ReduceSettings::default(),
            queue,
        )
    }

    #[test]
    fn test_tick_enqueues_reduced_frame() {
        let queue = HandoffQueue::new(4);
        let color = ColorSample::new(12, 34, 56);
        let p = producer(Arc::new(SolidGrabber(color)), queue.clone());

        assert_eq!(p.tick(), TickOutcome::Enqueued);
        let leds = queue.take().unwrap();
        assert_eq!(leds.colors(), &[color, color]);
    }

    #[test]
    fn test_tick_drops_on_full_queue() {
        let queue = HandoffQueue::new(1);
        let p = producer(Arc::new(SolidGrabber(ColorSample::BLACK)), queue.clone());

        assert_eq!(p.tick(), TickOutcome::Enqueued);
        assert_eq!(p.tick(), TickOutcome::Dropped);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn test_tick_skips_on_capture_error() {
        let queue = HandoffQueue::new(1);
        let p = producer(Arc::new(FailingGrabber), queue.clone());

        assert_eq!(p.tick(), TickOutcome::Skipped);
        assert!(queue.is_empty());
    }
}
