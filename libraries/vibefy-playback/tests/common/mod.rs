//! Shared fakes for the playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vibefy_playback::{
    AudioHandle, AudioSession, HandleAllocator, HandleId, LoadError, SessionError, Track,
    TrackId, TrackLoader,
};

/// Transport call observed by [`RecordingSession`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Load(HandleId),
    Unload,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
}

/// Audio session that records every call
///
/// Clones share the log and the rejection switch, so a test can keep one
/// clone while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    calls: Arc<Mutex<Vec<SessionCall>>>,
    reject_play: Arc<AtomicBool>,
    bound: Arc<Mutex<Option<HandleId>>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `play()` fail like a denied autoplay
    pub fn reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn bound(&self) -> Option<HandleId> {
        *self.bound.lock().unwrap()
    }

    fn record(&self, call: SessionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioSession for RecordingSession {
    fn load(&mut self, handle: &AudioHandle) -> Result<(), SessionError> {
        *self.bound.lock().unwrap() = Some(handle.id());
        self.record(SessionCall::Load(handle.id()));
        Ok(())
    }

    fn unload(&mut self) {
        *self.bound.lock().unwrap() = None;
        self.record(SessionCall::Unload);
    }

    fn play(&mut self) -> Result<(), SessionError> {
        self.record(SessionCall::Play);
        if self.reject_play.load(Ordering::SeqCst) {
            Err(SessionError::PlaybackRejected("not allowed".into()))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.record(SessionCall::Pause);
    }

    fn seek(&mut self, position: f64) -> Result<(), SessionError> {
        self.record(SessionCall::Seek(position));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(SessionCall::SetVolume(volume));
    }
}

/// Loader with scripted latency and failures
///
/// Uses `tokio::time::sleep`, so under paused time the order in which loads
/// complete is fully determined by their delays.
#[derive(Debug, Default)]
pub struct ScriptedLoader {
    allocator: HandleAllocator,
    delays: Mutex<HashMap<TrackId, Duration>>,
    failing: Mutex<HashSet<TrackId>>,
    hanging: Mutex<HashSet<TrackId>>,
    released: Mutex<Vec<TrackId>>,
}

impl ScriptedLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delay(&self, id: impl Into<TrackId>, delay: Duration) {
        self.delays.lock().unwrap().insert(id.into(), delay);
    }

    pub fn fail(&self, id: impl Into<TrackId>) {
        self.failing.lock().unwrap().insert(id.into());
    }

    /// The fetch for `id` never completes
    pub fn hang(&self, id: impl Into<TrackId>) {
        self.hanging.lock().unwrap().insert(id.into());
    }

    /// Handles created and not yet released
    pub fn live(&self) -> usize {
        self.allocator.live()
    }

    pub fn released(&self) -> Vec<TrackId> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackLoader for ScriptedLoader {
    async fn load(&self, track_id: &TrackId) -> Result<AudioHandle, LoadError> {
        let delay = self.delays.lock().unwrap().get(track_id).copied();
        let hang = self.hanging.lock().unwrap().contains(track_id);

        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(track_id) {
            return Err(LoadError::Server {
                status: 500,
                message: "boom".into(),
            });
        }

        Ok(self.allocator.allocate(
            track_id.clone(),
            Some("audio/mpeg".into()),
            Bytes::from_static(b"ID3\x03"),
        ))
    }

    fn release(&self, handle: AudioHandle) {
        self.released.lock().unwrap().push(handle.track_id().clone());
        self.allocator.revoke(handle);
    }
}

pub fn track(id: u64) -> Track {
    Track::new(id, format!("Track {id}"), "Me")
}

pub fn tracks(n: u64) -> Vec<Track> {
    (1..=n).map(track).collect()
}
