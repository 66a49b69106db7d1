//! Playback manager - core orchestration
//!
//! Owns the play queue, the transport flags and the one audio session. It
//! performs no I/O of its own: track fetches are queued as [`LoadRequest`]s,
//! superseded handles are queued for release, and UI events are queued as
//! [`PlaybackEvent`]s. The driver (see [`crate::service`]) drains all three
//! after every message it feeds in.
//!
//! Failures never escape as errors. A rejected `play()`, a failed fetch or a
//! broken session all collapse into `is_playing = false`.

use crate::{
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    handle::AudioHandle,
    loader::{LoadRequest, LoadResult, LoadTicket},
    queue::Queue,
    session::{AudioSession, SessionEvent, SessionEventKind},
    types::{PlaybackConfig, PlaybackPhase, PlaybackState, Track, TrackId},
    volume::Volume,
};
use tracing::{debug, info, warn};

/// Clamp a seek target into the playable range
///
/// NaN and infinite targets go to 0. A known duration (`> 0`) caps the
/// target; an unknown one only floors it at 0.
pub fn clamp_seek(target: f64, duration: f64) -> f64 {
    if !target.is_finite() {
        return 0.0;
    }

    let floored = target.max(0.0);
    if duration > 0.0 {
        floored.min(duration)
    } else {
        floored
    }
}

/// Playback state machine
pub struct PlaybackManager<S: AudioSession> {
    session: S,
    queue: Queue,
    volume: Volume,
    shuffle: bool,
    repeat: bool,
    restart_threshold: f64,

    current_track: Option<Track>,
    is_playing: bool,
    current_time: f64,
    duration: f64,

    // Handle currently bound to the session
    bound: Option<AudioHandle>,

    // Ticket of the one load whose result may still bind
    pending: Option<LoadTicket>,
    last_ticket: u64,

    last_phase: PlaybackPhase,

    pending_events: Vec<PlaybackEvent>,
    pending_loads: Vec<LoadRequest>,
    pending_releases: Vec<AudioHandle>,
}

impl<S: AudioSession> PlaybackManager<S> {
    /// Create new playback manager around `session`
    pub fn new(config: PlaybackConfig, mut session: S) -> Self {
        let volume = Volume::new(config.volume);
        session.set_volume(volume.level());

        Self {
            session,
            queue: Queue::new(),
            volume,
            shuffle: config.shuffle,
            repeat: config.repeat,
            restart_threshold: config.restart_threshold.as_secs_f64(),
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            bound: None,
            pending: None,
            last_ticket: 0,
            last_phase: PlaybackPhase::Idle,
            pending_events: Vec::new(),
            pending_loads: Vec::new(),
            pending_releases: Vec::new(),
        }
    }

    // ===== Queue =====

    /// Replace the queue
    ///
    /// The cursor goes back to "no selection". The current track, bound or
    /// loading, is left alone and keeps playing until the next transport
    /// command.
    pub fn set_queue(&mut self, tracks: Vec<Track>) {
        self.queue.set_tracks(tracks);
        info!(length = self.queue.len(), "Queue replaced");
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Replace the queue after a catalog refresh
    ///
    /// Like [`Self::set_queue`], except that when the current track is part of
    /// the new list the cursor is placed on it, so next/prev continue from
    /// where the listener is.
    pub fn refresh_queue(&mut self, tracks: Vec<Track>) {
        self.set_queue(tracks);

        let Some(current) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };
        if let Ok(index) = self.queue.position_of(&current) {
            // position_of only returns valid indices
            let _ = self.queue.select(index);
            debug!(track_id = %current, index, "Cursor re-anchored after refresh");
        }
    }

    // ===== Selection =====

    /// Select a queued track by identifier and start loading it
    ///
    /// An unknown identifier changes nothing and returns
    /// [`PlaybackError::SelectionNotFound`].
    pub fn play_by_id(&mut self, id: &TrackId) -> Result<()> {
        let index = self.queue.position_of(id)?;
        self.start_track(index)
    }

    /// Select a queued track by position and start loading it
    pub fn play_at_index(&mut self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.start_track(index)
    }

    /// Skip to next track
    ///
    /// Without shuffle, asking for the next track while already on the last
    /// one stops playback and keeps the track selected.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        self.advance();
        self.sync_phase();
    }

    /// Go to previous track
    ///
    /// Past the restart threshold the current track is rewound instead.
    /// From the first index this is a no-op.
    pub fn previous(&mut self) {
        if self.bound.is_some() && self.current_time > self.restart_threshold {
            debug!(position = self.current_time, "Restarting current track");
            self.seek(0.0);
            return;
        }

        let Some(index) = self.queue.prev() else {
            return;
        };
        if self.queue.is_at(index) {
            return;
        }

        if let Err(e) = self.start_track(index) {
            warn!(error = %e, "Previous track unavailable");
        }
    }

    // ===== Transport =====

    /// Flip between playing and paused
    ///
    /// No-op without a current track. While the track is still loading only
    /// the desired flag changes; the load applies it when it binds.
    pub fn toggle_play_pause(&mut self) {
        if self.current_track.is_none() {
            return;
        }

        if self.pending.is_some() {
            self.is_playing = !self.is_playing;
            debug!(is_playing = self.is_playing, "Play intent changed while loading");
            return;
        }

        if self.is_playing {
            self.session.pause();
            self.is_playing = false;
        } else if self.bound.is_none() {
            warn!(error = %PlaybackError::NoTrackLoaded, "Cannot resume");
        } else {
            self.is_playing = true;
            self.start_session();
        }

        self.sync_phase();
    }

    /// Seek within the bound track
    ///
    /// Ignored when nothing is bound. The position is updated right away,
    /// ahead of the session's next progress report.
    pub fn seek(&mut self, position: f64) {
        if self.bound.is_none() {
            debug!(position, "Seek ignored, no track bound");
            return;
        }

        let target = clamp_seek(position, self.duration);
        if let Err(e) = self.session.seek(target) {
            warn!(error = %e, target, "Seek failed");
            return;
        }

        self.current_time = target;
        self.push_position();
    }

    /// Set volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, level: f32) {
        let applied = self.volume.set_level(level);
        self.session.set_volume(applied);
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { level: applied });
    }

    /// Toggle shuffle; affects only future advances
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        debug!(shuffle = self.shuffle, "Shuffle toggled");
        self.shuffle
    }

    /// Toggle repeat; affects only future track ends
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        debug!(repeat = self.repeat, "Repeat toggled");
        self.repeat
    }

    // ===== Inbound notifications =====

    /// Apply a completed load
    ///
    /// Results for anything but the pending ticket are stale: their handle
    /// is queued for release and the state is not touched.
    pub fn handle_load_result(&mut self, result: LoadResult) {
        if self.pending != Some(result.ticket) {
            debug!(track_id = %result.track_id, "Discarding superseded load");
            if let Ok(handle) = result.outcome {
                self.pending_releases.push(handle);
            }
            return;
        }

        self.pending = None;

        match result.outcome {
            Ok(handle) => {
                if let Err(e) = self.session.load(&handle) {
                    warn!(track_id = %result.track_id, error = %e, "Audio session refused track");
                    self.pending_releases.push(handle);
                    self.is_playing = false;
                } else {
                    self.session.set_volume(self.volume.level());
                    info!(track_id = %result.track_id, handle = %handle.id(), "Track bound");
                    self.bound = Some(handle);
                    if self.is_playing {
                        self.start_session();
                    }
                }
            }
            Err(e) => {
                warn!(track_id = %result.track_id, error = %e, "Track load failed");
                self.is_playing = false;
            }
        }

        self.sync_phase();
    }

    /// Apply an event reported by the audio session
    ///
    /// Events about a source other than the bound one are dropped.
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        let bound = self.bound.as_ref().map(AudioHandle::id);
        if bound != Some(event.source) {
            debug!(source = %event.source, "Dropping event for unbound source");
            return;
        }

        match event.kind {
            SessionEventKind::Progress(position) => {
                self.current_time = if position.is_finite() {
                    position.max(0.0)
                } else {
                    0.0
                };
                self.push_position();
            }
            SessionEventKind::DurationKnown(duration) => {
                self.duration = if duration.is_finite() {
                    duration.max(0.0)
                } else {
                    0.0
                };
                self.push_position();
            }
            SessionEventKind::Ended => self.on_ended(),
        }
    }

    /// Unbind the session and forget any pending load
    ///
    /// Loads still in flight become stale and are released when they land.
    pub fn teardown(&mut self) {
        self.unbind();
        self.pending = None;
        self.is_playing = false;
        self.sync_phase();
    }

    // ===== Outboxes =====

    /// Drain pending events for UI
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Drain fetches the driver must start
    pub fn drain_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.pending_loads)
    }

    /// Drain handles the driver must hand back to the loader
    pub fn drain_releases(&mut self) -> Vec<AudioHandle> {
        std::mem::take(&mut self.pending_releases)
    }

    // ===== State Queries =====

    /// Snapshot for observers
    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            phase: self.phase(),
            current_track: self.current_track.clone(),
            is_playing: self.is_playing,
            current_time: self.current_time,
            duration: self.duration,
            volume: self.volume.level(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.cursor(),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.current_track.is_none() {
            PlaybackPhase::Idle
        } else if self.pending.is_some() {
            PlaybackPhase::Loading
        } else if self.is_playing && self.bound.is_some() {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.queue.cursor()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume.level()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Handle currently bound to the session
    pub fn bound_handle(&self) -> Option<&AudioHandle> {
        self.bound.as_ref()
    }

    /// True while a load result may still bind
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    // ===== Internals =====

    fn start_track(&mut self, index: usize) -> Result<()> {
        let track = self.queue.select(index)?.clone();

        self.unbind();

        let track_id = track.id.clone();
        let previous_track_id = self.current_track.replace(track).map(|t| t.id);
        self.is_playing = true;
        self.current_time = 0.0;
        self.duration = 0.0;

        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        self.pending = Some(ticket);
        self.pending_loads.push(LoadRequest {
            ticket,
            track_id: track_id.clone(),
        });

        info!(track_id = %track_id, index, "Loading track");
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id,
            previous_track_id,
        });
        self.sync_phase();
        Ok(())
    }

    fn advance(&mut self) {
        let Some(index) = self.queue.next(self.shuffle) else {
            return;
        };

        if !self.shuffle && self.queue.is_at(index) {
            debug!(index, "End of queue");
            self.stop_at_end();
            return;
        }

        if let Err(e) = self.start_track(index) {
            warn!(error = %e, "Next track unavailable");
        }
    }

    fn on_ended(&mut self) {
        if let Some(track) = &self.current_track {
            self.pending_events.push(PlaybackEvent::TrackFinished {
                track_id: track.id.clone(),
            });
        }

        if self.repeat && self.current_track.is_some() {
            self.current_time = 0.0;
            if let Err(e) = self.session.seek(0.0) {
                warn!(error = %e, "Rewind for repeat failed");
            }
            self.is_playing = true;
            self.start_session();
            self.push_position();
            self.sync_phase();
            return;
        }

        if self.queue.is_empty() {
            self.stop_at_end();
        } else {
            self.advance();
        }
        self.sync_phase();
    }

    fn stop_at_end(&mut self) {
        if self.is_playing {
            self.session.pause();
        }
        self.is_playing = false;
        self.sync_phase();
    }

    /// Call `play()` on the session; a rejection rolls `is_playing` back
    fn start_session(&mut self) {
        if let Err(e) = self.session.play() {
            warn!(error = %e, "Playback rejected");
            self.is_playing = false;
        }
    }

    fn unbind(&mut self) {
        if let Some(handle) = self.bound.take() {
            self.session.unload();
            debug!(handle = %handle.id(), "Unbound track");
            self.pending_releases.push(handle);
        }
    }

    fn push_position(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position: self.current_time,
            duration: self.duration,
        });
    }

    fn sync_phase(&mut self) {
        let phase = self.phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            self.pending_events.push(PlaybackEvent::StateChanged { phase });
        }
    }
}

impl<S: AudioSession + std::fmt::Debug> std::fmt::Debug for PlaybackManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("phase", &self.phase())
            .field("current_track", &self.current_track)
            .field("is_playing", &self.is_playing)
            .field("queue_len", &self.queue.len())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleAllocator;
    use crate::session::NullSession;
    use bytes::Bytes;

    fn tracks(n: u64) -> Vec<Track> {
        (1..=n)
            .map(|i| Track::new(i, format!("Track {i}"), "Me"))
            .collect()
    }

    fn manager_with(n: u64) -> PlaybackManager<NullSession> {
        let mut manager = PlaybackManager::new(PlaybackConfig::default(), NullSession::new());
        manager.set_queue(tracks(n));
        manager
    }

    /// Complete every pending load successfully
    fn complete_loads(manager: &mut PlaybackManager<NullSession>, allocator: &HandleAllocator) {
        for request in manager.drain_load_requests() {
            let handle = allocator.allocate(
                request.track_id.clone(),
                None,
                Bytes::from_static(b"ID3"),
            );
            manager.handle_load_result(LoadResult::new(request, Ok(handle)));
        }
    }

    #[test]
    fn clamp_seek_rules() {
        assert_eq!(clamp_seek(50.0, 30.0), 30.0);
        assert_eq!(clamp_seek(-1.0, 30.0), 0.0);
        assert_eq!(clamp_seek(50.0, 0.0), 50.0);
        assert_eq!(clamp_seek(f64::NAN, 30.0), 0.0);
        assert_eq!(clamp_seek(f64::INFINITY, 0.0), 0.0);
    }

    #[test]
    fn new_manager_is_idle() {
        let manager = manager_with(0);
        let state = manager.state();
        assert_eq!(state.phase, PlaybackPhase::Idle);
        assert!(!state.is_playing);
        assert_eq!(state.volume, 1.0);
    }

    #[test]
    fn play_by_id_enters_loading() {
        let mut manager = manager_with(3);
        manager.play_by_id(&TrackId::from(2u64)).unwrap();

        assert_eq!(manager.phase(), PlaybackPhase::Loading);
        assert_eq!(manager.current_index(), Some(1));
        assert!(manager.is_playing());

        let requests = manager.drain_load_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].track_id, TrackId::from("2"));
    }

    #[test]
    fn load_binds_and_plays() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(2);
        manager.play_by_id(&TrackId::from(1u64)).unwrap();
        complete_loads(&mut manager, &allocator);

        assert_eq!(manager.phase(), PlaybackPhase::Playing);
        assert!(manager.session().is_playing());
        assert_eq!(
            manager.session().bound(),
            manager.bound_handle().map(AudioHandle::id)
        );
    }

    #[test]
    fn unknown_id_changes_nothing() {
        let mut manager = manager_with(2);
        let before = manager.state();
        assert!(matches!(
            manager.play_by_id(&TrackId::from("nope")),
            Err(PlaybackError::SelectionNotFound(_))
        ));
        assert_eq!(manager.state(), before);
        assert!(manager.drain_load_requests().is_empty());
    }

    #[test]
    fn play_at_index_out_of_range() {
        let mut manager = manager_with(2);
        assert!(matches!(
            manager.play_at_index(2),
            Err(PlaybackError::IndexOutOfBounds(2))
        ));
        assert!(manager.current_track().is_none());
    }

    #[test]
    fn toggle_without_track_is_noop() {
        let mut manager = manager_with(2);
        manager.toggle_play_pause();
        assert!(!manager.is_playing());
        assert!(manager.drain_events().iter().all(|e| !matches!(e, PlaybackEvent::StateChanged { .. })));
    }

    #[test]
    fn toggle_while_loading_only_flips_intent() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(2);
        manager.play_at_index(0).unwrap();
        manager.toggle_play_pause();
        assert!(!manager.is_playing());
        assert_eq!(manager.phase(), PlaybackPhase::Loading);

        complete_loads(&mut manager, &allocator);
        assert_eq!(manager.phase(), PlaybackPhase::Paused);
        assert!(!manager.session().is_playing());
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(1);
        manager.play_at_index(0).unwrap();
        complete_loads(&mut manager, &allocator);

        manager.toggle_play_pause();
        assert!(!manager.is_playing());
        assert!(!manager.session().is_playing());

        manager.toggle_play_pause();
        assert!(manager.is_playing());
        assert!(manager.session().is_playing());
    }

    #[test]
    fn failed_load_stops_playing() {
        let mut manager = manager_with(2);
        manager.play_at_index(0).unwrap();
        for request in manager.drain_load_requests() {
            let track_id = request.track_id.clone();
            manager.handle_load_result(LoadResult::new(request, Err(crate::LoadError::NotFound(track_id))));
        }

        assert!(!manager.is_playing());
        assert_eq!(manager.phase(), PlaybackPhase::Paused);
        assert!(manager.bound_handle().is_none());
        assert_eq!(manager.current_index(), Some(0));
    }

    #[test]
    fn volume_is_clamped_and_forwarded() {
        let mut manager = manager_with(0);
        manager.set_volume(1.7);
        assert_eq!(manager.volume(), 1.0);
        assert_eq!(manager.session().volume(), 1.0);

        manager.set_volume(-3.0);
        assert_eq!(manager.state().volume, 0.0);

        let events = manager.drain_events();
        assert!(events.contains(&PlaybackEvent::VolumeChanged { level: 0.0 }));
    }

    #[test]
    fn seek_without_binding_is_ignored() {
        let mut manager = manager_with(2);
        manager.play_at_index(0).unwrap();
        manager.seek(10.0);
        assert_eq!(manager.current_time(), 0.0);
    }

    #[test]
    fn seek_is_optimistic() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(1);
        manager.play_at_index(0).unwrap();
        complete_loads(&mut manager, &allocator);

        manager.seek(42.0);
        assert_eq!(manager.current_time(), 42.0);
        assert_eq!(manager.session().position(), 42.0);
    }

    #[test]
    fn set_queue_keeps_current_track() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(2);
        manager.play_at_index(1).unwrap();
        complete_loads(&mut manager, &allocator);

        manager.set_queue(tracks(5));
        assert_eq!(manager.current_index(), None);
        assert_eq!(manager.current_track().map(|t| t.id.clone()), Some(TrackId::from(2u64)));
        assert!(manager.is_playing());
        assert!(manager.bound_handle().is_some());
    }

    #[test]
    fn refresh_queue_reanchors_cursor() {
        let mut manager = manager_with(3);
        manager.play_at_index(2).unwrap();

        let mut refreshed = tracks(4);
        refreshed.reverse();
        manager.refresh_queue(refreshed);
        assert_eq!(manager.current_index(), Some(1));

        manager.refresh_queue(vec![Track::new(9u64, "Other", "Me")]);
        assert_eq!(manager.current_index(), None);
    }

    #[test]
    fn teardown_releases_bound_handle() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(1);
        manager.play_at_index(0).unwrap();
        complete_loads(&mut manager, &allocator);

        manager.teardown();
        let released = manager.drain_releases();
        assert_eq!(released.len(), 1);
        assert!(manager.session().bound().is_none());
        assert!(!manager.is_playing());
    }

    #[test]
    fn phase_changes_are_announced_once() {
        let allocator = HandleAllocator::new();
        let mut manager = manager_with(1);
        manager.play_at_index(0).unwrap();
        complete_loads(&mut manager, &allocator);

        let phases: Vec<PlaybackPhase> = manager
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::StateChanged { phase } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![PlaybackPhase::Loading, PlaybackPhase::Playing]);
    }
}
