//! Core types for playback management

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Track identifier
///
/// The server hands out numeric ids, but catalogs and UI layers may carry them
/// as strings. Every id is normalized once, here, into its decimal/trimmed
/// string form; equality and hashing only ever look at that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a track ID from its string form
    pub fn new(id: impl Into<String>) -> Self {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Get the normalized string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&TrackId> for TrackId {
    fn from(value: &TrackId) -> Self {
        value.clone()
    }
}

impl From<u64> for TrackId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for TrackId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u32> for TrackId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for TrackId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<usize> for TrackId {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Signed(i64),
            Unsigned(u64),
            Float(f64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Signed(n) => TrackId::from(n),
            RawId::Unsigned(n) => TrackId::from(n),
            // 3.0 and 3 name the same track; beyond i64 the cast would saturate
            RawId::Float(n)
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 =>
            {
                TrackId(format!("{}", n as i64))
            }
            RawId::Float(n) => TrackId(n.to_string()),
            RawId::Text(s) => TrackId::new(s),
        })
    }
}

/// Track information for queue management
///
/// Immutable once placed in a queue. Holding a track does not imply holding
/// its audio bytes; those are fetched on demand by a [`crate::TrackLoader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier within a queue
    pub id: TrackId,

    /// Display title
    pub title: String,

    /// Display owner/artist
    pub artist: String,

    /// Duration from the catalog, if the server reported one
    #[serde(default)]
    pub duration: Option<Duration>,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Observable playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No track selected
    Idle,

    /// Track selected, audio fetch in flight
    Loading,

    /// Bound and playing
    Playing,

    /// Paused, stopped at the end of the queue, or left unbound by a failed load
    Paused,
}

/// Read-only snapshot of the playback state, published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    pub current_track: Option<Track>,
    pub is_playing: bool,
    /// Position in seconds
    pub current_time: f64,
    /// Duration in seconds, 0 while unknown
    pub duration: f64,
    /// Linear volume in `[0, 1]`
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: bool,
    pub queue: Vec<Track>,
    /// Queue cursor; `None` means no selection
    pub current_index: Option<usize>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            shuffle: false,
            repeat: false,
            queue: Vec::new(),
            current_index: None,
        }
    }
}

/// Configuration for playback manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 1.0)
    pub volume: f32,

    /// Initial shuffle flag (default: off)
    pub shuffle: bool,

    /// Initial repeat flag (default: off)
    pub repeat: bool,

    /// "Previous" restarts the current track past this position (default: 2s)
    pub restart_threshold: Duration,

    /// Give up on a track fetch after this long (default: never)
    pub load_timeout: Option<Duration>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shuffle: false,
            repeat: false,
            restart_threshold: Duration::from_secs(2),
            load_timeout: None,
        }
    }
}
