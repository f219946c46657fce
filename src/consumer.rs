//! Transmit consumer: drains the queue into the transport at a paced rate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::frame::LedFrame;
use crate::meter::ThroughputMeter;
use crate::queue::HandoffQueue;
use crate::transport::{wire, TransportError, TransportSlot};

/// Fixed delay after every write, keeping the serial link from being overrun.
pub const PACING_SLEEP: Duration = Duration::from_millis(10);

/// How often a consumer waiting on an empty queue checks for shutdown.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Takes LED frames off the queue and writes them to the transport.
pub struct TransmitConsumer {
    queue: HandoffQueue,
    transport: TransportSlot,
    meter: Arc<ThroughputMeter>,
    stop: Arc<AtomicBool>,
    led_count: usize,
    pacing: Duration,
    discarded: Arc<AtomicU64>,
    buf: Vec<u8>,
}

impl TransmitConsumer {
    pub fn new(
        queue: HandoffQueue,
        transport: TransportSlot,
        meter: Arc<ThroughputMeter>,
        stop: Arc<AtomicBool>,
        led_count: usize,
    ) -> Self {
        Self {
            queue,
            transport,
            meter,
            stop,
            led_count,
            pacing: PACING_SLEEP,
            discarded: Arc::new(AtomicU64::new(0)),
            buf: Vec::with_capacity(wire::encoded_len(led_count)),
        }
    }

    /// Override the post-write pacing delay.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Counter of frames discarded for having the wrong length.
    pub fn discarded_counter(&self) -> Arc<AtomicU64> {
        self.discarded.clone()
    }

    /// Run until the stop flag is raised or the transport fails.
    ///
    /// A transport error ends the loop; individual frames are never retried.
    pub fn run(&mut self) -> Result<(), TransportError> {
        log::debug!("Transmit consumer started ({} LEDs)", self.led_count);
        while !self.stop.load(Ordering::SeqCst) {
            let Some(frame) = self.queue.take_timeout(STOP_POLL) else {
                continue;
            };
            if self.transmit(&frame)? {
                thread::sleep(self.pacing);
            }
        }
        log::debug!("Transmit consumer stopped");
        Ok(())
    }

    /// Write one frame. Returns `Ok(false)` when the frame was discarded for
    /// not matching the strip length.
    pub fn transmit(&mut self, frame: &LedFrame) -> Result<bool, TransportError> {
        if frame.len() != self.led_count {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "Discarding frame with {} colors, strip has {} LEDs",
                frame.len(),
                self.led_count
            );
            return Ok(false);
        }

        wire::encode_into(frame, &mut self.buf);
        self.transport.write_all(&self.buf)?;
        self.meter.record();
        Ok(true)
    }
}
