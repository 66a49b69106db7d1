//! Vibefy terminal client
//!
//! Wires the playback engine, the server client and the desktop audio
//! output into the `vibefy` binary.

pub mod config;
pub mod display;
pub mod player;

pub use config::{CliConfig, PlaybackSettings};
