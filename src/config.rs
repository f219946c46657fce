//! Configuration file handling for ambilight-stream.
//!
//! Loads configuration from `<config dir>/ambilight-stream/config.toml` or a
//! custom path. The file is read once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureRect;
use crate::geometry::{perimeter_layout, EdgeCounts, GeometryError, LedCoordinate, LedGeometry};
use crate::meter::REPORT_INTERVAL;
use crate::queue::DEFAULT_CAPACITY;
use crate::reduce::ReduceSettings;
use crate::transport::SerialSettings;

/// Configuration file structure for ambilight-stream.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub leds: LedsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// OS display scaling, in percent
    #[serde(default = "default_os_scaling")]
    pub os_scaling: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            os_scaling: default_os_scaling(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CaptureConfig {
    /// CPU thread hint used to size the producer pool
    #[serde(default = "default_cpu_threads")]
    pub cpu_threads: u32,
    #[serde(default)]
    pub led_offset: i32,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_input: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cpu_threads: default_cpu_threads(),
            led_offset: 0,
            queue_capacity: default_queue_capacity(),
            ffmpeg_format: None,
            ffmpeg_input: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SerialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default = "default_data_rate")]
    pub data_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            data_rate: default_data_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// LED placement: per-edge counts or an explicit coordinate list.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct LedsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<EdgeCounts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<LedCoordinate>,
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_os_scaling() -> u32 {
    100
}

fn default_cpu_threads() -> u32 {
    1
}

fn default_queue_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_data_rate() -> u32 {
    500_000
}

fn default_timeout_ms() -> u64 {
    2000
}

/// Settings the pipeline reads for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub os_scaling_percent: u32,
    pub led_offset: i32,
    pub cpu_thread_hint: u32,
    pub data_rate: u32,
    pub serial_timeout: Duration,
    pub serial_port: Option<String>,
    pub queue_capacity: usize,
    pub ffmpeg_format: Option<String>,
    pub ffmpeg_input: Option<String>,
    /// Window the throughput meter averages over
    pub report_interval: Duration,
}

impl PipelineConfig {
    pub fn capture_rect(&self) -> CaptureRect {
        CaptureRect::full_screen(self.screen_width, self.screen_height)
    }

    pub fn reduce_settings(&self) -> ReduceSettings {
        ReduceSettings {
            os_scaling_percent: self.os_scaling_percent,
            led_offset: self.led_offset,
        }
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial_port.clone(),
            data_rate: self.data_rate,
            timeout: self.serial_timeout,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            screen_width: default_width(),
            screen_height: default_height(),
            os_scaling_percent: default_os_scaling(),
            led_offset: 0,
            cpu_thread_hint: default_cpu_threads(),
            data_rate: default_data_rate(),
            serial_timeout: Duration::from_millis(default_timeout_ms()),
            serial_port: None,
            queue_capacity: default_queue_capacity(),
            ffmpeg_format: None,
            ffmpeg_input: None,
            report_interval: REPORT_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            Self::parse(&content).map_err(|e| match e {
                ConfigError::Parse { source, .. } => ConfigError::Parse {
                    path: path.clone(),
                    source,
                },
                other => other,
            })
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validated pipeline settings.
    pub fn pipeline(&self) -> Result<PipelineConfig, ConfigError> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "screen resolution must be non-zero, got {}x{}",
                self.screen.width, self.screen.height
            )));
        }
        if self.screen.os_scaling == 0 {
            return Err(ConfigError::Invalid(
                "screen.os_scaling must be greater than 0".into(),
            ));
        }
        if self.capture.cpu_threads == 0 {
            return Err(ConfigError::Invalid(
                "capture.cpu_threads must be at least 1".into(),
            ));
        }
        if self.serial.data_rate == 0 {
            return Err(ConfigError::Invalid(
                "serial.data_rate must be greater than 0".into(),
            ));
        }

        Ok(PipelineConfig {
            screen_width: self.screen.width,
            screen_height: self.screen.height,
            os_scaling_percent: self.screen.os_scaling,
            led_offset: self.capture.led_offset,
            cpu_thread_hint: self.capture.cpu_threads,
            data_rate: self.serial.data_rate,
            serial_timeout: Duration::from_millis(self.serial.timeout_ms),
            serial_port: self.serial.port.clone(),
            queue_capacity: self.capture.queue_capacity.max(1),
            ffmpeg_format: self.capture.ffmpeg_format.clone(),
            ffmpeg_input: self.capture.ffmpeg_input.clone(),
            report_interval: REPORT_INTERVAL,
        })
    }

    /// Validated LED geometry.
    pub fn geometry(&self) -> Result<LedGeometry, ConfigError> {
        let leds = &self.leds;
        match (leds.layout, leds.coordinates.is_empty()) {
            (Some(_), false) => Err(ConfigError::Invalid(
                "set either leds.layout or leds.coordinates, not both".into(),
            )),
            (None, false) => Ok(LedGeometry::new(leds.coordinates.clone())?),
            (layout, true) => Ok(perimeter_layout(
                layout.unwrap_or_default(),
                self.screen.width,
                self.screen.height,
                self.screen.os_scaling,
            )?),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to render config: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Invalid LED geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("ambilight-stream").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/ambilight-stream/config.toml")
        })
}
