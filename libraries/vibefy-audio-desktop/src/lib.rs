//! Vibefy - Desktop Audio Output
//!
//! [`RodioSession`] implements [`vibefy_playback::AudioSession`] on top of
//! rodio: fetched track bytes are decoded in memory and played through the
//! default output device.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibefy_audio_desktop::RodioSession;
//! use vibefy_playback::{AudioSession, NullSession, PlaybackConfig, PlaybackService, TrackLoader};
//!
//! # async fn run<L: TrackLoader>(loader: Arc<L>) {
//! let (handle, _task) = PlaybackService::spawn(
//!     PlaybackConfig::default(),
//!     |events| -> Box<dyn AudioSession> {
//!         match RodioSession::new(events) {
//!             Ok(session) => Box::new(session),
//!             Err(_) => Box::new(NullSession::new()),
//!         }
//!     },
//!     loader,
//! );
//! handle.next().unwrap();
//! # }
//! ```

pub mod error;
pub mod playhead;
pub mod session;

pub use error::{AudioError, Result};
pub use playhead::Playhead;
pub use session::{decode, seek_target, RodioSession, POLL_INTERVAL};
