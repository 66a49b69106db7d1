//! Audio session contract
//!
//! An audio session wraps the one playable media resource of a client. It
//! accepts transport calls synchronously and reports progress, duration and
//! completion asynchronously as [`SessionEvent`]s, each stamped with the
//! handle of the source it concerns.

use crate::error::SessionError;
use crate::handle::{AudioHandle, HandleId};

/// Uniform transport over a platform playback primitive
///
/// Calls run on the playback service's task. Implementations may block
/// briefly (e.g. waiting on an output thread to probe a source) but must not
/// wait on the service itself.
pub trait AudioSession: Send + 'static {
    /// Bind a new source, stopping whatever was bound before
    ///
    /// Position resets to 0 and any known duration is forgotten.
    fn load(&mut self, handle: &AudioHandle) -> Result<(), SessionError>;

    /// Drop the bound source, if any
    fn unload(&mut self);

    /// Begin or resume playback from the current position
    fn play(&mut self) -> Result<(), SessionError>;

    /// Suspend playback, keeping the position
    fn pause(&mut self);

    /// Move to `position` seconds
    ///
    /// Clamped to `[0, duration]` when the duration is known, else to `>= 0`.
    fn seek(&mut self, position: f64) -> Result<(), SessionError>;

    /// Set linear volume, clamped to `[0, 1]`
    fn set_volume(&mut self, volume: f32);
}

impl AudioSession for Box<dyn AudioSession> {
    fn load(&mut self, handle: &AudioHandle) -> Result<(), SessionError> {
        (**self).load(handle)
    }

    fn unload(&mut self) {
        (**self).unload();
    }

    fn play(&mut self) -> Result<(), SessionError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, position: f64) -> Result<(), SessionError> {
        (**self).seek(position)
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }
}

/// Something the session observed about its bound source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEventKind {
    /// Playback position in seconds
    Progress(f64),
    /// Metadata resolved; total length in seconds
    DurationKnown(f64),
    /// Reached the end of the source without interruption
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionEvent {
    /// Handle the event refers to
    pub source: HandleId,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn progress(source: HandleId, position: f64) -> Self {
        Self {
            source,
            kind: SessionEventKind::Progress(position),
        }
    }

    pub fn duration_known(source: HandleId, duration: f64) -> Self {
        Self {
            source,
            kind: SessionEventKind::DurationKnown(duration),
        }
    }

    pub fn ended(source: HandleId) -> Self {
        Self {
            source,
            kind: SessionEventKind::Ended,
        }
    }
}

/// Session without an output device
///
/// Tracks position and volume so the engine can run headless. It never
/// emits events, so tracks never end on their own.
#[derive(Debug, Default)]
pub struct NullSession {
    bound: Option<HandleId>,
    playing: bool,
    position: f64,
    volume: f32,
}

impl NullSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> Option<HandleId> {
        self.bound
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl AudioSession for NullSession {
    fn load(&mut self, handle: &AudioHandle) -> Result<(), SessionError> {
        self.bound = Some(handle.id());
        self.playing = false;
        self.position = 0.0;
        Ok(())
    }

    fn unload(&mut self) {
        self.bound = None;
        self.playing = false;
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<(), SessionError> {
        if self.bound.is_none() {
            return Err(SessionError::NoSource);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, position: f64) -> Result<(), SessionError> {
        if self.bound.is_none() {
            return Err(SessionError::NoSource);
        }
        self.position = if position.is_finite() { position.max(0.0) } else { 0.0 };
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleAllocator;
    use crate::types::TrackId;
    use bytes::Bytes;

    #[test]
    fn null_session_rejects_play_without_source() {
        let mut session = NullSession::new();
        assert_eq!(session.play(), Err(SessionError::NoSource));
        assert!(!session.is_playing());
    }

    #[test]
    fn null_session_tracks_transport() {
        let allocator = HandleAllocator::new();
        let handle = allocator.allocate(TrackId::from(1u64), None, Bytes::from_static(b"x"));

        let mut session = NullSession::new();
        session.load(&handle).unwrap();
        assert_eq!(session.bound(), Some(handle.id()));

        session.play().unwrap();
        assert!(session.is_playing());

        session.seek(-4.0).unwrap();
        assert_eq!(session.position(), 0.0);
        session.seek(12.5).unwrap();
        assert_eq!(session.position(), 12.5);

        session.set_volume(3.0);
        assert_eq!(session.volume(), 1.0);

        session.unload();
        assert_eq!(session.bound(), None);
        assert!(!session.is_playing());
    }
}
