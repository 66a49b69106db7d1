//! Playback service - single-task event loop
//!
//! One tokio task owns the [`PlaybackManager`]. User commands, audio session
//! events and load completions all arrive on the same unbounded queue and are
//! applied one at a time, each to completion, before the next message is read.
//!
//! After every message the loop flushes the manager's outboxes: it spawns the
//! requested fetches, hands superseded handles back to the loader, broadcasts
//! events and publishes the new snapshot.
//!
//! Only [`PlaybackHandle`]s keep the queue alive. The session and the load
//! tasks hold weak senders, so dropping the last handle stops the loop.

use crate::{
    error::{LoadError, PlaybackError, Result},
    events::PlaybackEvent,
    loader::{LoadRequest, LoadResult, TrackLoader},
    manager::PlaybackManager,
    session::{AudioSession, SessionEvent},
    types::{PlaybackConfig, PlaybackState, Track, TrackId},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

const EVENT_CAPACITY: usize = 256;

/// Commands accepted by the playback service
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    SetQueue(Vec<Track>),
    RefreshQueue(Vec<Track>),
    PlayById(TrackId),
    PlayAtIndex(usize),
    TogglePlayPause,
    Next,
    Prev,
    Seek(f64),
    SetVolume(f32),
    ToggleShuffle,
    ToggleRepeat,
}

enum EngineMessage {
    Command(PlaybackCommand),
    Session(SessionEvent),
    Loaded(LoadResult),
    Shutdown(oneshot::Sender<()>),
}

/// Posts audio session events onto the engine queue
///
/// Handed to the session factory in [`PlaybackService::spawn`]. Cloneable and
/// usable from any thread.
#[derive(Clone)]
pub struct SessionEventSender {
    tx: mpsc::WeakUnboundedSender<EngineMessage>,
}

impl SessionEventSender {
    /// Queue an event; false once the service has stopped
    pub fn send(&self, event: SessionEvent) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(EngineMessage::Session(event)).is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for SessionEventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEventSender").finish_non_exhaustive()
    }
}

/// Handle to the playback service for sending commands
#[derive(Clone)]
pub struct PlaybackHandle {
    command_tx: mpsc::UnboundedSender<EngineMessage>,
    state_rx: watch::Receiver<PlaybackState>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.command_tx
            .send(EngineMessage::Command(command))
            .map_err(|_| PlaybackError::ChannelClosed)
    }

    pub fn set_queue(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(PlaybackCommand::SetQueue(tracks))
    }

    /// Replace the queue with a re-fetched catalog (e.g. after an upload)
    pub fn refresh_queue(&self, tracks: Vec<Track>) -> Result<()> {
        self.send(PlaybackCommand::RefreshQueue(tracks))
    }

    /// Unknown identifiers are ignored by the service
    pub fn play_by_id(&self, id: impl Into<TrackId>) -> Result<()> {
        self.send(PlaybackCommand::PlayById(id.into()))
    }

    pub fn play_at_index(&self, index: usize) -> Result<()> {
        self.send(PlaybackCommand::PlayAtIndex(index))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(PlaybackCommand::TogglePlayPause)
    }

    pub fn next(&self) -> Result<()> {
        self.send(PlaybackCommand::Next)
    }

    pub fn prev(&self) -> Result<()> {
        self.send(PlaybackCommand::Prev)
    }

    /// Seek to `position` seconds
    pub fn seek(&self, position: f64) -> Result<()> {
        self.send(PlaybackCommand::Seek(position))
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.send(PlaybackCommand::SetVolume(volume))
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleShuffle)
    }

    pub fn toggle_repeat(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleRepeat)
    }

    /// Latest published snapshot
    pub fn state(&self) -> PlaybackState {
        self.state_rx.borrow().clone()
    }

    /// Watch the snapshot
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_rx.clone()
    }

    /// Receive events emitted from now on
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events_tx.subscribe()
    }

    /// Stop the service
    ///
    /// Unbinds the session and releases the bound handle before returning.
    /// Loads still in flight release their handles when they finish.
    pub async fn shutdown(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.command_tx
            .send(EngineMessage::Shutdown(done_tx))
            .map_err(|_| PlaybackError::ChannelClosed)?;
        done_rx.await.map_err(|_| PlaybackError::ChannelClosed)
    }
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("closed", &self.command_tx.is_closed())
            .finish_non_exhaustive()
    }
}

/// The event loop owning the playback state
pub struct PlaybackService<S: AudioSession, L: TrackLoader> {
    manager: PlaybackManager<S>,
    loader: Arc<L>,
    load_timeout: Option<Duration>,
    self_tx: mpsc::WeakUnboundedSender<EngineMessage>,
    state_tx: watch::Sender<PlaybackState>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl<S: AudioSession, L: TrackLoader> PlaybackService<S, L> {
    /// Start the service on the current tokio runtime
    ///
    /// `make_session` receives the sender its media events must go through.
    pub fn spawn<F>(
        config: PlaybackConfig,
        make_session: F,
        loader: Arc<L>,
    ) -> (PlaybackHandle, JoinHandle<()>)
    where
        F: FnOnce(SessionEventSender) -> S,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let self_tx = command_tx.downgrade();

        let session = make_session(SessionEventSender {
            tx: self_tx.clone(),
        });
        let load_timeout = config.load_timeout;
        let manager = PlaybackManager::new(config, session);

        let (state_tx, state_rx) = watch::channel(manager.state());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let handle = PlaybackHandle {
            command_tx,
            state_rx,
            events_tx: events_tx.clone(),
        };

        let service = Self {
            manager,
            loader,
            load_timeout,
            self_tx,
            state_tx,
            events_tx,
        };
        let task = tokio::spawn(service.run(command_rx));

        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineMessage>) {
        info!(load_timeout = ?self.load_timeout, "Playback service started");
        let mut ack = None;

        while let Some(message) = rx.recv().await {
            match message {
                EngineMessage::Command(command) => self.apply(command),
                EngineMessage::Session(event) => self.manager.handle_session_event(event),
                EngineMessage::Loaded(result) => self.manager.handle_load_result(result),
                EngineMessage::Shutdown(done) => {
                    ack = Some(done);
                    break;
                }
            }
            self.flush();
        }

        self.manager.teardown();
        self.flush();

        // Nothing can be queued after close; whatever made it in is released here
        rx.close();
        while let Ok(message) = rx.try_recv() {
            match message {
                EngineMessage::Loaded(LoadResult {
                    outcome: Ok(handle),
                    ..
                }) => self.loader.release(handle),
                EngineMessage::Shutdown(done) => {
                    let _ = done.send(());
                }
                _ => {}
            }
        }

        info!("Playback service stopped");
        if let Some(done) = ack {
            let _ = done.send(());
        }
    }

    fn apply(&mut self, command: PlaybackCommand) {
        trace!(?command, "Applying command");
        match command {
            PlaybackCommand::SetQueue(tracks) => self.manager.set_queue(tracks),
            PlaybackCommand::RefreshQueue(tracks) => self.manager.refresh_queue(tracks),
            PlaybackCommand::PlayById(id) => {
                if let Err(e) = self.manager.play_by_id(&id) {
                    debug!(error = %e, "Ignoring selection");
                }
            }
            PlaybackCommand::PlayAtIndex(index) => {
                if let Err(e) = self.manager.play_at_index(index) {
                    debug!(error = %e, "Ignoring selection");
                }
            }
            PlaybackCommand::TogglePlayPause => self.manager.toggle_play_pause(),
            PlaybackCommand::Next => self.manager.next(),
            PlaybackCommand::Prev => self.manager.previous(),
            PlaybackCommand::Seek(position) => self.manager.seek(position),
            PlaybackCommand::SetVolume(level) => self.manager.set_volume(level),
            PlaybackCommand::ToggleShuffle => {
                self.manager.toggle_shuffle();
            }
            PlaybackCommand::ToggleRepeat => {
                self.manager.toggle_repeat();
            }
        }
    }

    fn flush(&mut self) {
        for request in self.manager.drain_load_requests() {
            self.dispatch_load(request);
        }

        for handle in self.manager.drain_releases() {
            debug!(handle = %handle.id(), track_id = %handle.track_id(), "Releasing handle");
            self.loader.release(handle);
        }

        for event in self.manager.drain_events() {
            trace!(kind = event.kind(), "Broadcasting event");
            // No subscribers is fine
            let _ = self.events_tx.send(event);
        }

        let snapshot = self.manager.state();
        self.state_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn dispatch_load(&self, request: LoadRequest) {
        let loader = Arc::clone(&self.loader);
        let tx = self.self_tx.clone();
        let timeout = self.load_timeout;

        tokio::spawn(async move {
            let outcome = match timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, loader.load(&request.track_id)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(LoadError::TimedOut(request.track_id.clone())),
                    }
                }
                None => loader.load(&request.track_id).await,
            };

            let message = EngineMessage::Loaded(LoadResult::new(request, outcome));
            let undelivered = match tx.upgrade() {
                Some(tx) => tx.send(message).err().map(|e| e.0),
                None => Some(message),
            };

            if let Some(EngineMessage::Loaded(LoadResult {
                outcome: Ok(handle),
                track_id,
                ..
            })) = undelivered
            {
                debug!(track_id = %track_id, "Service gone, releasing loaded handle");
                loader.release(handle);
            }
        });
    }
}
