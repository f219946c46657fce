//! Bounded FIFO hand-off between capture producers and the transmit consumer.
//!
//! Producers `offer` without ever blocking; a full queue rejects the frame.
//! The single consumer `take`s and suspends while the queue is empty.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::frame::LedFrame;

/// Default queue capacity, in LED frames.
pub const DEFAULT_CAPACITY: usize = 100;

/// Multi-producer, single-consumer bounded queue of LED frames.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct HandoffQueue {
    tx: Sender<LedFrame>,
    rx: Receiver<LedFrame>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl HandoffQueue {
    /// Create a queue holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue without blocking.
    ///
    /// Returns `false` and drops the frame when the queue is full.
    pub fn offer(&self, frame: LedFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Dequeue the oldest frame, blocking until one is available.
    pub fn take(&self) -> Option<LedFrame> {
        self.rx.recv().ok()
    }

    /// Dequeue the oldest frame, waiting at most `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Option<LedFrame> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Frames currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offers rejected because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for HandoffQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColorSample;
    use std::thread;
    use std::time::Instant;

    fn tagged(tag: u8) -> LedFrame {
        LedFrame::new(vec![ColorSample::new(tag, 0, 0)])
    }

    #[test]
    fn test_offer_on_full_queue_fails_without_blocking() {
        let queue = HandoffQueue::new(2);
        assert!(queue.offer(tagged(1)));
        assert!(queue.offer(tagged(2)));

        let start = Instant::now();
        assert!(!queue.offer(tagged(3)));
        assert!(start.elapsed() < Duration::from_millis(100));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn test_rejected_offer_keeps_order() {
        let queue = HandoffQueue::new(2);
        queue.offer(tagged(1));
        queue.offer(tagged(2));
        queue.offer(tagged(3));

        assert_eq!(queue.take().unwrap(), tagged(1));
        assert!(queue.offer(tagged(4)));
        assert_eq!(queue.take().unwrap(), tagged(2));
        assert_eq!(queue.take().unwrap(), tagged(4));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_timeout_on_empty_queue() {
        let queue = HandoffQueue::new(1);
        assert!(queue.take_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_take_waits_for_producer() {
        let queue = HandoffQueue::new(4);
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            producer.offer(tagged(7))
        });
        assert_eq!(queue.take().unwrap(), tagged(7));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_never_exceeds_capacity_under_concurrent_producers() {
        let queue = HandoffQueue::new(5);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let q = queue.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        q.offer(tagged(i));
                        assert!(q.len() <= 5);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.dropped(), 195);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let queue = HandoffQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.offer(tagged(1)));
        assert!(!queue.offer(tagged(2)));
    }
}
