//! Interactive player
//!
//! Reads one command per line from stdin while printing what the engine
//! reports. All transport goes through the [`PlaybackHandle`].

use crate::display::{format_time, status_line};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use vibefy_playback::{PlaybackEvent, PlaybackHandle, PlaybackPhase};
use vibefy_server_client::VibefyClient;

const VOLUME_STEP: f32 = 0.1;
const NUDGE_SECONDS: f64 = 10.0;

pub const HELP: &str = "\
Commands:
  p            play / pause
  n            next track
  b            previous track (restarts past 2s)
  s            toggle shuffle
  r            toggle repeat
  + / -        volume up / down
  > / <        skip 10s forward / back
  seek <secs>  jump to position
  <number>     play track by queue position
  u <path>     upload a file and refresh the queue
  l            show the queue
  i            show status
  h            help
  q            quit";

/// One line of player input
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    TogglePlay,
    Next,
    Prev,
    Shuffle,
    Repeat,
    VolumeUp,
    VolumeDown,
    Nudge(f64),
    Seek(f64),
    /// 1-based queue position
    Select(usize),
    Upload(PathBuf),
    Queue,
    Status,
    Help,
    Quit,
}

pub fn parse_key(line: &str) -> Option<Key> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let key = match word {
        "p" | "play" | "pause" => Key::TogglePlay,
        "n" | "next" => Key::Next,
        "b" | "prev" => Key::Prev,
        "s" | "shuffle" => Key::Shuffle,
        "r" | "repeat" => Key::Repeat,
        "+" => Key::VolumeUp,
        "-" => Key::VolumeDown,
        ">" => Key::Nudge(NUDGE_SECONDS),
        "<" => Key::Nudge(-NUDGE_SECONDS),
        "seek" => Key::Seek(rest.parse().ok().filter(|s: &f64| s.is_finite())?),
        "u" | "upload" if !rest.is_empty() => Key::Upload(PathBuf::from(rest)),
        "l" | "queue" => Key::Queue,
        "i" | "status" => Key::Status,
        "h" | "help" | "?" => Key::Help,
        "q" | "quit" | "exit" => Key::Quit,
        number => match number.parse::<usize>() {
            Ok(n) if n > 0 && rest.is_empty() => Key::Select(n),
            _ => return None,
        },
    };
    Some(key)
}

pub struct Player {
    handle: PlaybackHandle,
    client: VibefyClient,
}

impl Player {
    pub fn new(handle: PlaybackHandle, client: VibefyClient) -> Self {
        Self { handle, client }
    }

    /// Run until `q` or end of input
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut events = self.handle.events();

        println!("{HELP}");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse_key(&line) {
                        Some(Key::Quit) => break,
                        Some(key) => self.apply(key).await?,
                        None if line.trim().is_empty() => {}
                        None => println!("Unknown command '{}', h for help", line.trim()),
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => self.show(&event),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "Player lagged behind events"),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        Ok(())
    }

    /// Apply one parsed command
    pub async fn apply(&self, key: Key) -> anyhow::Result<()> {
        let state = self.handle.state();
        match key {
            Key::TogglePlay => self.handle.toggle_play_pause()?,
            Key::Next => self.handle.next()?,
            Key::Prev => self.handle.prev()?,
            Key::Shuffle => self.handle.toggle_shuffle()?,
            Key::Repeat => self.handle.toggle_repeat()?,
            Key::VolumeUp => self.handle.set_volume(state.volume + VOLUME_STEP)?,
            Key::VolumeDown => self.handle.set_volume(state.volume - VOLUME_STEP)?,
            Key::Nudge(delta) => self.handle.seek(state.current_time + delta)?,
            Key::Seek(position) => self.handle.seek(position)?,
            Key::Select(position) => {
                if position > state.queue.len() {
                    println!("No track {position}; the queue has {}", state.queue.len());
                } else {
                    self.handle.play_at_index(position - 1)?;
                }
            }
            Key::Upload(path) => self.upload(path).await?,
            Key::Queue => {
                for (index, track) in state.queue.iter().enumerate() {
                    let marker = if state.current_index == Some(index) { '>' } else { ' ' };
                    let length = track
                        .duration
                        .map(|d| format_time(d.as_secs_f64()))
                        .unwrap_or_default();
                    println!("{marker}{:>3}. {} - {} {length}", index + 1, track.title, track.artist);
                }
            }
            Key::Status => println!("{}", status_line(&state)),
            Key::Help => println!("{HELP}"),
            Key::Quit => {}
        }
        Ok(())
    }

    /// Upload a file, then rebuild the queue from the fresh catalog
    ///
    /// Server failures are reported and leave the player running; only a
    /// stopped engine is an error.
    async fn upload(&self, path: PathBuf) -> anyhow::Result<()> {
        let receipt = match self.client.upload(&path).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Upload failed");
                println!("Upload failed: {e}");
                return Ok(());
            }
        };
        println!("{} ({})", receipt.message, receipt.file_name);

        match self.client.song_list().await {
            Ok(catalog) => self.handle.refresh_queue(catalog.tracks())?,
            Err(e) => {
                warn!(error = %e, "Song list refresh after upload failed");
                println!("Uploaded, but the song list could not be refreshed: {e}");
            }
        }
        Ok(())
    }

    fn show(&self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::TrackChanged { .. } | PlaybackEvent::StateChanged { .. } => {
                let state = self.handle.state();
                if state.phase != PlaybackPhase::Loading {
                    println!("{}", status_line(&state));
                }
            }
            PlaybackEvent::QueueChanged { length } => println!("Queue: {length} tracks"),
            PlaybackEvent::TrackFinished { .. }
            | PlaybackEvent::PositionUpdate { .. }
            | PlaybackEvent::VolumeChanged { .. } => {}
        }
    }
}
