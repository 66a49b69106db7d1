//! Playback Events
//!
//! Event-based communication for UI synchronization. The manager queues
//! events while handling a command or a session/load notification; whoever
//! drives it drains them afterwards with
//! [`crate::PlaybackManager::drain_events`].
//!
//! There is no error event. Load and playback failures only ever show up as
//! `is_playing` going false.

use crate::types::{PlaybackPhase, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Observable phase changed
    StateChanged {
        /// The new phase
        phase: PlaybackPhase,
    },

    /// A new track was selected (emitted when its load starts)
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Position or duration moved
    PositionUpdate {
        /// Position in seconds
        position: f64,
        /// Duration in seconds, 0 while unknown
        duration: f64,
    },

    /// Volume changed
    VolumeChanged {
        /// New linear level (0.0-1.0)
        level: f32,
    },

    /// Queue replaced
    QueueChanged {
        /// New queue length
        length: usize,
    },
}

impl PlaybackEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackEvent::StateChanged { .. } => "state_changed",
            PlaybackEvent::TrackChanged { .. } => "track_changed",
            PlaybackEvent::TrackFinished { .. } => "track_finished",
            PlaybackEvent::PositionUpdate { .. } => "position_update",
            PlaybackEvent::VolumeChanged { .. } => "volume_changed",
            PlaybackEvent::QueueChanged { .. } => "queue_changed",
        }
    }
}
