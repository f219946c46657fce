//! Pipeline supervisor: sizes, starts and tears down the capture pipeline.
//!
//! Scheduling runs on a small tokio runtime. One async worker drives the
//! producer and meter intervals; captures and the consumer run on the blocking
//! pool, which is capped at the planned worker count. The consumer reports how
//! it ended over a single event channel; any transport failure tears the whole
//! pipeline down. No reconnect is attempted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::capture::{CaptureError, SharedGrabber};
use crate::config::PipelineConfig;
use crate::consumer::TransmitConsumer;
use crate::geometry::LedGeometry;
use crate::meter::ThroughputMeter;
use crate::producer::{CaptureProducer, TickOutcome};
use crate::queue::HandoffQueue;
use crate::transport::{Transport, TransportError, TransportSlot};

/// Capture period of every producer.
pub const PRODUCER_PERIOD: Duration = Duration::from_millis(250);

/// Producers sharing one capture handle.
pub const PRODUCERS_PER_HANDLE: usize = 3;

/// How long teardown waits for in-flight blocking work before abandoning it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// How often `wait` checks the external shutdown flag.
const EVENT_POLL: Duration = Duration::from_millis(200);

/// Errors that stop the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Capture setup failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Failed to start the pipeline runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("Transmit consumer exited without reporting")]
    ConsumerLost,
}

/// Concurrency derived from the CPU thread hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelinePlan {
    /// Worker threads shared by producers and the consumer
    pub worker_threads: usize,
    /// Scheduled capture producers
    pub producers: usize,
    /// Capture handles, one per group of producers
    pub capture_handles: usize,
}

impl PipelinePlan {
    /// `hint * 2` workers; `hint * 3` producers when the hint exceeds one,
    /// otherwise `hint`. A zero hint is treated as one.
    pub fn from_hint(hint: u32) -> Self {
        let hint = hint.max(1) as usize;
        let producers = if hint > 1 { hint * 3 } else { hint };
        Self {
            worker_threads: hint * 2,
            producers,
            capture_handles: producers.div_ceil(PRODUCERS_PER_HANDLE),
        }
    }

    /// Start offset of producer `slot`, spreading producers across one period.
    pub fn stagger(&self, slot: usize) -> Duration {
        PRODUCER_PERIOD * slot as u32 / self.producers.max(1) as u32
    }

    /// Frames per second a single capture handle has to deliver.
    pub fn handle_framerate(&self) -> u32 {
        let per_handle = self.producers.min(PRODUCERS_PER_HANDLE) as u32;
        per_handle * (1000 / PRODUCER_PERIOD.as_millis() as u32)
    }

    fn build_runtime(&self) -> std::io::Result<Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.worker_threads)
            .thread_name("pipeline")
            .enable_time()
            .build()
    }
}

enum PipelineEvent {
    ConsumerExited(Result<(), TransportError>),
}

/// Owns every running part of the pipeline.
pub struct Supervisor {
    plan: PipelinePlan,
    queue: HandoffQueue,
    meter: Arc<ThroughputMeter>,
    transport: TransportSlot,
    stop: Arc<AtomicBool>,
    events_tx: Option<Sender<PipelineEvent>>,
    events: Receiver<PipelineEvent>,
    runtime: Option<Runtime>,
    tasks: Vec<JoinHandle<()>>,
    discarded: Arc<AtomicU64>,
    skipped: Arc<AtomicU64>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("plan", &self.plan)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Start the consumer, the throughput meter and all producers.
    ///
    /// `grabbers` is called once per producer group with the group index and
    /// returns the capture handle that group shares. If anything fails to
    /// start, whatever was already started is torn down before returning.
    pub fn start<F>(
        config: &PipelineConfig,
        geometry: Arc<LedGeometry>,
        transport: Box<dyn Transport>,
        grabbers: F,
    ) -> Result<Self, PipelineError>
    where
        F: FnMut(usize) -> Result<SharedGrabber, CaptureError>,
    {
        let plan = PipelinePlan::from_hint(config.cpu_thread_hint);
        let (events_tx, events) = crossbeam_channel::unbounded();

        let mut supervisor = Self {
            plan,
            queue: HandoffQueue::new(config.queue_capacity),
            meter: Arc::new(ThroughputMeter::new()),
            transport: TransportSlot::new(transport),
            stop: Arc::new(AtomicBool::new(false)),
            events_tx: Some(events_tx),
            events,
            runtime: None,
            tasks: Vec::new(),
            discarded: Arc::new(AtomicU64::new(0)),
            skipped: Arc::new(AtomicU64::new(0)),
        };

        if let Err(e) = supervisor.launch(config, geometry, grabbers) {
            log::error!("Pipeline failed to start: {}", e);
            if let Err(teardown_err) = supervisor.teardown() {
                log::error!("Teardown after failed start: {}", teardown_err);
            }
            return Err(e);
        }
        Ok(supervisor)
    }

    fn launch<F>(
        &mut self,
        config: &PipelineConfig,
        geometry: Arc<LedGeometry>,
        mut grabbers: F,
    ) -> Result<(), PipelineError>
    where
        F: FnMut(usize) -> Result<SharedGrabber, CaptureError>,
    {
        log::info!(
            "Starting pipeline: {} LEDs, {} producers, {} capture handles, {} worker threads",
            geometry.len(),
            self.plan.producers,
            self.plan.capture_handles,
            self.plan.worker_threads
        );

        let runtime = self
            .runtime
            .insert(self.plan.build_runtime().map_err(PipelineError::Runtime)?);

        // One consumer
        let mut consumer = TransmitConsumer::new(
            self.queue.clone(),
            self.transport.clone(),
            self.meter.clone(),
            self.stop.clone(),
            geometry.len(),
        );
        self.discarded = consumer.discarded_counter();
        let events_tx = self.events_tx.take().ok_or(PipelineError::ConsumerLost)?;
        runtime.spawn_blocking(move || {
            let result = consumer.run();
            let _ = events_tx.send(PipelineEvent::ConsumerExited(result));
        });

        // Many producers, one capture handle per group
        let rect = config.capture_rect();
        let settings = config.reduce_settings();
        let started = Instant::now();
        let mut grabber: Option<SharedGrabber> = None;
        for slot in 0..self.plan.producers {
            if slot % PRODUCERS_PER_HANDLE == 0 {
                grabber = Some(grabbers(slot / PRODUCERS_PER_HANDLE)?);
            }
            let Some(handle) = grabber.clone() else {
                continue;
            };
            let producer = Arc::new(CaptureProducer::new(
                slot,
                handle,
                geometry.clone(),
                rect,
                settings,
                self.queue.clone(),
            ));
            let first_tick = started + self.plan.stagger(slot);
            self.tasks.push(runtime.spawn(run_producer(
                producer,
                first_tick,
                self.skipped.clone(),
            )));
        }

        // FPS reporting
        let report_interval = config.report_interval.max(Duration::from_millis(1));
        self.tasks.push(runtime.spawn(run_meter(self.meter.clone(), report_interval)));

        Ok(())
    }

    /// Block until the consumer stops or `shutdown` is raised, then tear down.
    ///
    /// Returns the transport error that ended the pipeline, if any.
    pub fn wait(&mut self, shutdown: &AtomicBool) -> Result<(), PipelineError> {
        let outcome = loop {
            match self.events.recv_timeout(EVENT_POLL) {
                Ok(PipelineEvent::ConsumerExited(Ok(()))) => break Ok(()),
                Ok(PipelineEvent::ConsumerExited(Err(e))) => {
                    log::error!("Transport failure, stopping pipeline: {}", e);
                    break Err(PipelineError::Transport(e));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if shutdown.load(Ordering::SeqCst) {
                        log::info!("Shutdown requested");
                        break Ok(());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if self.stop.load(Ordering::SeqCst) {
                        break Ok(());
                    }
                    break Err(PipelineError::ConsumerLost);
                }
            }
        };

        if let Err(e) = self.teardown() {
            log::error!("Teardown failed: {}", e);
        }
        outcome
    }

    /// Stop all tasks and release the transport.
    ///
    /// The transport is closed before waiting on in-flight work; captures
    /// still running after [`SHUTDOWN_GRACE`] are abandoned. Idempotent, and
    /// safe after a partially failed start.
    pub fn teardown(&mut self) -> Result<(), PipelineError> {
        let was_running = !self.stop.swap(true, Ordering::SeqCst);

        for task in self.tasks.drain(..) {
            task.abort();
        }
        let released = self.transport.release();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }

        if was_running {
            log::info!(
                "Pipeline stopped: {} frames sent, {} dropped (queue full), {} discarded (bad length), {} ticks skipped (capture failed)",
                self.meter.total(),
                self.queue.dropped(),
                self.discarded.load(Ordering::Relaxed),
                self.skipped.load(Ordering::Relaxed)
            );
        }
        released.map_err(PipelineError::from)
    }

    pub fn plan(&self) -> PipelinePlan {
        self.plan
    }

    pub fn meter(&self) -> &Arc<ThroughputMeter> {
        &self.meter
    }

    pub fn queue(&self) -> &HandoffQueue {
        &self.queue
    }

    /// Producer ticks skipped because the capture failed.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Whether the transport is still held open.
    pub fn transport_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("Teardown on drop failed: {}", e);
        }
    }
}

/// Tick `producer` every [`PRODUCER_PERIOD`] starting at `first_tick`.
///
/// Each capture runs on the blocking pool and is awaited, so a producer never
/// overlaps with itself. Late ticks fire back to back to keep the fixed rate.
async fn run_producer(
    producer: Arc<CaptureProducer>,
    first_tick: Instant,
    skipped: Arc<AtomicU64>,
) {
    let mut interval = time::interval_at(first_tick, PRODUCER_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;
        let producer = producer.clone();
        match tokio::task::spawn_blocking(move || producer.tick()).await {
            Ok(TickOutcome::Skipped) => {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TickOutcome::Enqueued | TickOutcome::Dropped) => {}
            Err(e) => {
                log::error!("Producer task failed; it will not run again: {}", e);
                return;
            }
        }
    }
}

/// Log the average FPS every `period`, first after one full period.
async fn run_meter(meter: Arc<ThroughputMeter>, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        meter.log_report(period);
    }
}

/// Set up the Ctrl+C handler to raise `flag`.
///
/// This should be called once at program startup.
pub fn install_ctrlc_handler(flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        log::info!("Received Ctrl+C, shutting down...");
    })
}
