//! ambilight-stream library crate.
//!
//! Capture → reduce → queue → transmit pipeline driving a serial LED strip
//! from the colors at the edges of the screen. Components are exposed for
//! integration testing.

pub mod capture;
pub mod cli;
pub mod config;
pub mod consumer;
pub mod frame;
pub mod geometry;
pub mod meter;
pub mod producer;
pub mod queue;
pub mod reduce;
pub mod supervisor;
pub mod transport;
