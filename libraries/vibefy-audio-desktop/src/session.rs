//! Rodio-backed audio session
//!
//! The output stream lives on a dedicated thread. [`RodioSession`] sends it
//! commands over a crossbeam channel; calls whose outcome the engine needs
//! (load, play, seek) wait for a reply, the rest are fire-and-forget.
//!
//! Between commands the thread polls the sink every [`POLL_INTERVAL`] and
//! reports progress and completion through the engine's
//! [`SessionEventSender`].

use crate::error::{AudioError, Result};
use crate::playhead::Playhead;
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::io::Cursor;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};
use vibefy_playback::{
    AudioHandle, AudioSession, HandleId, SessionError, SessionEvent, SessionEventSender,
};

/// How often the output thread reports progress
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

const COMMAND_CAPACITY: usize = 32;

type Reply = Sender<std::result::Result<(), SessionError>>;

/// Commands sent to the output thread
enum AudioCommand {
    Load {
        source: HandleId,
        data: Bytes,
        reply: Reply,
    },
    Unload,
    Play(Reply),
    Pause,
    Seek(f64, Reply),
    SetVolume(f32),
    Shutdown,
}

/// Decode `data` and read its total length when the container reports one
pub fn decode(data: Bytes) -> Result<(Decoder<Cursor<Bytes>>, Option<Duration>)> {
    let decoder = Decoder::new(Cursor::new(data))?;
    let duration = decoder.total_duration();
    Ok((decoder, duration))
}

/// Clamp a seek target to `[0, duration]`, or `>= 0` when the length is unknown
pub fn seek_target(position: f64, duration: Option<Duration>) -> Duration {
    let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
    let position = match duration {
        Some(limit) => position.min(limit.as_secs_f64()),
        None => position,
    };
    Duration::from_secs_f64(position)
}

/// Audio session playing through the default output device
pub struct RodioSession {
    command_tx: Sender<AudioCommand>,
    thread: Option<JoinHandle<()>>,
}

impl RodioSession {
    /// Open the default output device
    ///
    /// Fails when no device is available; callers usually fall back to
    /// [`vibefy_playback::NullSession`].
    pub fn new(events: SessionEventSender) -> Result<Self> {
        let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
        let (ready_tx, ready_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name("vibefy-audio".into())
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(mut stream) => {
                        stream.log_on_drop(false);
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(AudioError::from(e)));
                        return;
                    }
                };
                Output::new(stream, events).run(&command_rx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("Audio output opened");
                Ok(Self {
                    command_tx,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::ThreadStopped)
            }
        }
    }

    /// Send a command and block until the output thread answers
    ///
    /// Load replies only after the source is decoded and probed.
    fn request(
        &self,
        make: impl FnOnce(Reply) -> AudioCommand,
    ) -> std::result::Result<(), SessionError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(make(reply_tx))
            .map_err(|_| SessionError::Disconnected)?;
        reply_rx.recv().map_err(|_| SessionError::Disconnected)?
    }

    fn post(&self, command: AudioCommand) {
        if self.command_tx.send(command).is_err() {
            debug!("Audio thread gone, dropping command");
        }
    }
}

impl AudioSession for RodioSession {
    fn load(&mut self, handle: &AudioHandle) -> std::result::Result<(), SessionError> {
        let source = handle.id();
        let data = handle.data().clone();
        self.request(|reply| AudioCommand::Load {
            source,
            data,
            reply,
        })
    }

    fn unload(&mut self) {
        self.post(AudioCommand::Unload);
    }

    fn play(&mut self) -> std::result::Result<(), SessionError> {
        self.request(AudioCommand::Play)
    }

    fn pause(&mut self) {
        self.post(AudioCommand::Pause);
    }

    fn seek(&mut self, position: f64) -> std::result::Result<(), SessionError> {
        self.request(|reply| AudioCommand::Seek(position, reply))
    }

    fn set_volume(&mut self, volume: f32) {
        self.post(AudioCommand::SetVolume(volume));
    }
}

impl Drop for RodioSession {
    fn drop(&mut self) {
        let _ = self.command_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Audio thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for RodioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSession")
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

/// State owned by the output thread
struct Output {
    stream: OutputStream,
    sink: Option<Sink>,
    data: Option<Bytes>,
    duration: Option<Duration>,
    volume: f32,
    playhead: Playhead,
    events: SessionEventSender,
}

impl Output {
    fn new(stream: OutputStream, events: SessionEventSender) -> Self {
        Self {
            stream,
            sink: None,
            data: None,
            duration: None,
            volume: 1.0,
            playhead: Playhead::new(),
            events,
        }
    }

    fn run(mut self, commands: &Receiver<AudioCommand>) {
        let mut last_poll = Instant::now();

        loop {
            match commands.recv_timeout(POLL_INTERVAL) {
                Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.apply(command),
                Err(RecvTimeoutError::Timeout) => {}
            }

            if last_poll.elapsed() >= POLL_INTERVAL {
                last_poll = Instant::now();
                self.poll();
            }
        }

        self.stop_sink();
        debug!("Audio thread stopped");
    }

    fn apply(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::Load {
                source,
                data,
                reply,
            } => {
                let _ = reply.send(self.load(source, data));
            }
            AudioCommand::Unload => {
                self.stop_sink();
                self.data = None;
                self.duration = None;
                self.playhead.clear();
            }
            AudioCommand::Play(reply) => {
                let _ = reply.send(self.play());
            }
            AudioCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                self.playhead.set_playing(false);
            }
            AudioCommand::Seek(position, reply) => {
                let _ = reply.send(self.seek(position));
            }
            AudioCommand::SetVolume(volume) => {
                self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
                if let Some(sink) = &self.sink {
                    sink.set_volume(self.volume);
                }
            }
            AudioCommand::Shutdown => {}
        }
    }

    fn load(&mut self, source: HandleId, data: Bytes) -> std::result::Result<(), SessionError> {
        self.stop_sink();
        self.playhead.clear();
        self.data = None;
        self.duration = None;

        let duration = self.attach(data.clone())?;
        self.data = Some(data);
        self.duration = duration;
        self.playhead.bind(source);
        debug!(%source, ?duration, "Source loaded");

        if let Some(duration) = duration {
            self.emit(SessionEvent::duration_known(source, duration.as_secs_f64()));
        }
        Ok(())
    }

    fn play(&mut self) -> std::result::Result<(), SessionError> {
        let data = self.data.clone().ok_or(SessionError::NoSource)?;
        if self.drained() {
            // Played through; start over from the top
            self.attach(data)?;
            self.playhead.moved();
        }

        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.playhead.set_playing(true);
        Ok(())
    }

    fn seek(&mut self, position: f64) -> std::result::Result<(), SessionError> {
        let data = self.data.clone().ok_or(SessionError::NoSource)?;
        if self.drained() {
            self.attach(data)?;
        }

        let target = seek_target(position, self.duration);
        if let Some(sink) = &self.sink {
            sink.try_seek(target).map_err(AudioError::from)?;
        }
        trace!(position = target.as_secs_f64(), "Seeked");
        self.playhead.moved();
        Ok(())
    }

    /// Decode `data` into a fresh paused sink, replacing the current one
    fn attach(&mut self, data: Bytes) -> Result<Option<Duration>> {
        let (decoder, duration) = decode(data)?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.pause();
        sink.append(decoder);

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        Ok(duration)
    }

    fn drained(&self) -> bool {
        match &self.sink {
            Some(sink) => sink.empty(),
            None => true,
        }
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn poll(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let position = sink.get_pos();
        let drained = sink.empty();

        for event in self.playhead.observe(position, drained) {
            self.emit(event);
        }
    }

    fn emit(&self, event: SessionEvent) {
        if !self.events.send(event) {
            warn!(source = %event.source, "Playback service gone, dropping session event");
        }
    }
}
