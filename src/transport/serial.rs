//! Serial port transport.

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use super::{Transport, TransportError};

/// Serial link parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Port name; `None` picks the first port found
    pub port: Option<String>,
    /// Baud rate
    pub data_rate: u32,
    /// Read/write timeout
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            data_rate: 500_000,
            timeout: Duration::from_millis(2000),
        }
    }
}

/// A serial port opened 8N1 without flow control.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    /// Open the configured port, or the first available one.
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let name = match &settings.port {
            Some(name) => name.clone(),
            None => first_port()?,
        };

        let port = serialport::new(&name, settings.data_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open()
            .map_err(|source| TransportError::OpenFailed {
                port: name.clone(),
                source,
            })?;

        log::info!(
            "Serial port in use: {} @ {} baud",
            name,
            settings.data_rate
        );
        Ok(Self {
            name,
            port: Some(port),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        port.write_all(bytes).map_err(TransportError::WriteFailed)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self.port.take() {
            Some(mut port) => {
                log::info!("Closing serial port {}", self.name);
                port.flush().map_err(TransportError::CloseFailed)
            }
            None => Ok(()),
        }
    }
}

/// Description of an available serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// List serial ports present on this machine.
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports().map_err(TransportError::ListFailed)?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn first_port() -> Result<String, TransportError> {
    list_ports()?
        .into_iter()
        .next()
        .map(|p| p.name)
        .ok_or(TransportError::NoPorts)
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => match &usb.product {
            Some(product) => format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, product),
            None => format!("USB {:04x}:{:04x}", usb.vid, usb.pid),
        },
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
