//! Transport seam: the byte sink that carries LED frames to the device.
//!
//! - [`Transport`] - what the consumer writes to
//! - [`TransportSlot`] - shared ownership so the supervisor can release it
//! - [`wire`] - the on-the-wire frame layout
//! - [`SerialTransport`] - serial port implementation

mod serial;
pub mod wire;

pub use serial::{list_ports, PortInfo, SerialSettings, SerialTransport};

use std::sync::{Arc, Mutex, PoisonError};

/// Errors raised by a transport. All of them are fatal to the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No serial port found on this machine
    #[error("No serial port found. Connect the LED controller or set `serial.port`")]
    NoPorts,
    /// Enumerating serial ports failed
    #[error("Failed to list serial ports: {0}")]
    ListFailed(#[source] serialport::Error),
    /// Opening the port failed
    #[error("Failed to open serial port '{port}': {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },
    /// Writing to the device failed
    #[error("Write to transport failed: {0}")]
    WriteFailed(#[source] std::io::Error),
    /// Flushing or closing the device failed
    #[error("Closing transport failed: {0}")]
    CloseFailed(#[source] std::io::Error),
    /// The transport was already released
    #[error("Transport is closed")]
    Closed,
}

/// A byte-oriented sink to the LED controller.
pub trait Transport: Send {
    /// Write the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Flush and release the underlying device.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Transport shared between the consumer, which writes, and the supervisor,
/// which releases it on teardown.
#[derive(Clone)]
pub struct TransportSlot {
    inner: Arc<Mutex<Option<Box<dyn Transport>>>>,
}

impl std::fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSlot")
            .field("open", &self.is_open())
            .finish()
    }
}

impl TransportSlot {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(transport))),
        }
    }

    /// A slot with nothing in it; every write fails with `Closed`.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn write_all(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(transport) => transport.write_all(bytes),
            None => Err(TransportError::Closed),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Close and drop the transport. Later calls are no-ops.
    pub fn release(&self) -> Result<(), TransportError> {
        let transport = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match transport {
            Some(mut transport) => transport.close(),
            None => Ok(()),
        }
    }
}
