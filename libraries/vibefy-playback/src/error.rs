//! Error types for playback management

use crate::types::TrackId;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No queued track carries the requested identifier
    #[error("Track not in queue: {0}")]
    SelectionNotFound(TrackId),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// No track is currently bound to the audio session
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The playback service is no longer running
    #[error("Playback service stopped")]
    ChannelClosed,
}

/// Errors produced by a track loader
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The server has no audio for this track
    #[error("Track not found: {0}")]
    NotFound(TrackId),

    /// Transport failure (connect, reset, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the server
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The load watchdog gave up on a hung fetch
    #[error("Timed out loading track {0}")]
    TimedOut(TrackId),
}

/// Errors produced by an audio session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The platform refused to start playback
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// Nothing is bound to the session
    #[error("No source loaded")]
    NoSource,

    /// The bound bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The session's output thread is gone
    #[error("Audio session disconnected")]
    Disconnected,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
