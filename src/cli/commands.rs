//! Subcommand handlers for run, list-ports and config actions.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::args::ConfigAction;
use crate::capture::{FfmpegGrabber, ScreenSource, SharedGrabber};
use crate::config::{default_path, Config, ConfigError};
use crate::supervisor::{install_ctrlc_handler, PipelineError, PipelinePlan, Supervisor};
use crate::transport::{list_ports as serial_ports, SerialTransport, TransportError};

/// Errors surfaced to the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("Config file already exists: {0}")]
    ConfigExists(String),
}

/// Start the pipeline and block until Ctrl+C or a transport failure.
pub fn run(config_path: Option<&Path>, port: Option<String>) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let mut pipeline = config.pipeline()?;
    if port.is_some() {
        pipeline.serial_port = port;
    }
    let geometry = Arc::new(config.geometry()?);

    let transport = SerialTransport::open(&pipeline.serial_settings())?;

    let shutdown = Arc::new(AtomicBool::new(false));
    if let Err(e) = install_ctrlc_handler(shutdown.clone()) {
        log::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let plan = PipelinePlan::from_hint(pipeline.cpu_thread_hint);
    let source = ScreenSource::new(pipeline.capture_rect(), plan.handle_framerate()).with_input(
        pipeline.ffmpeg_format.clone(),
        pipeline.ffmpeg_input.clone(),
    );

    let mut supervisor = Supervisor::start(&pipeline, geometry, Box::new(transport), |group| {
        log::debug!("Opening capture handle for producer group {}", group);
        let grabber: SharedGrabber = Arc::new(FfmpegGrabber::spawn(&source)?);
        Ok(grabber)
    })?;

    supervisor.wait(&shutdown)?;
    Ok(())
}

/// List available serial ports and print them to stdout.
pub fn list_ports() -> Result<(), CliError> {
    let ports = serial_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
        println!();
        println!("Make sure the LED controller is connected.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {}", port);
        }
        println!();
        println!("Use --port <name> or serial.port in the config file to select one.");
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(path.as_path()))?;
            let geometry = config.geometry()?;
            let plan = PipelinePlan::from_hint(config.pipeline()?.cpu_thread_hint);

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", path.display());
            }
            println!(
                "LEDs: {}   producers: {}   capture handles: {}   worker threads: {}",
                geometry.len(),
                plan.producers,
                plan.capture_handles,
                plan.worker_threads
            );
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(CliError::ConfigExists(path.display().to_string()));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = format!(
                "# ambilight-stream configuration\n\n{}",
                Config::default().to_toml()?
            );
            std::fs::write(&path, contents)?;
            println!("Created config file: {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
