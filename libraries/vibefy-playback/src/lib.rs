//! Vibefy - Playback Engine
//!
//! Owns the current track, the play queue and the transport semantics of a
//! Vibefy client, and keeps them in step with a single audio session.
//!
//! This crate provides:
//! - A queue with a cursor (next/prev clamp at the ends, uniform shuffle)
//! - The playback state machine ([`PlaybackManager`])
//! - A single-task event loop around it ([`PlaybackService`])
//! - The seams platforms plug into: [`AudioSession`] and [`TrackLoader`]
//!
//! # Architecture
//!
//! `vibefy-playback` has no audio or HTTP dependencies:
//! - Audio output is an [`AudioSession`] (see `vibefy-audio-desktop`)
//! - Track bytes come from a [`TrackLoader`] (see `vibefy-server-client`)
//!
//! Commands, session events and load completions are processed one at a
//! time on one task. Every load carries a ticket; a completion whose ticket
//! was superseded never binds, its handle is released instead.
//!
//! # Example
//!
//! ```rust
//! use vibefy_playback::{NullSession, PlaybackConfig, PlaybackManager, Track, TrackId};
//!
//! let mut manager = PlaybackManager::new(PlaybackConfig::default(), NullSession::new());
//! manager.set_queue(vec![
//!     Track::new(1u64, "Intro", "Me"),
//!     Track::new(2u64, "Outro", "Me"),
//! ]);
//!
//! manager.play_by_id(&TrackId::from("2")).unwrap();
//! assert_eq!(manager.current_index(), Some(1));
//!
//! // The driver performs the fetch and feeds the result back
//! let requests = manager.drain_load_requests();
//! assert_eq!(requests[0].track_id, TrackId::from(2u64));
//! ```

pub mod error;
pub mod events;
pub mod handle;
pub mod loader;
pub mod manager;
pub mod queue;
pub mod service;
pub mod session;
pub mod shuffle;
pub mod types;
pub mod volume;

pub use error::{LoadError, PlaybackError, Result, SessionError};
pub use events::PlaybackEvent;
pub use handle::{AudioHandle, HandleAllocator, HandleId};
pub use loader::{LoadRequest, LoadResult, LoadTicket, TrackLoader};
pub use manager::{clamp_seek, PlaybackManager};
pub use queue::Queue;
pub use service::{PlaybackCommand, PlaybackHandle, PlaybackService, SessionEventSender};
pub use session::{AudioSession, NullSession, SessionEvent, SessionEventKind};
pub use types::{PlaybackConfig, PlaybackPhase, PlaybackState, Track, TrackId};
pub use volume::Volume;
