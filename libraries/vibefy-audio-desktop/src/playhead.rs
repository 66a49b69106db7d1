//! Progress and completion tracking for the bound source
//!
//! The output thread polls the sink and feeds what it sees into a
//! [`Playhead`], which decides which session events to emit. `Ended` is
//! reported once per playthrough and only when the sink drained while
//! playing; a pause or an unload never counts as an ending.

use std::time::Duration;
use vibefy_playback::{HandleId, SessionEvent};

#[derive(Debug, Default, Clone)]
pub struct Playhead {
    source: Option<HandleId>,
    playing: bool,
    finished: bool,
    last_position: Option<f64>,
}

impl Playhead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a freshly bound source
    pub fn bind(&mut self, source: HandleId) {
        *self = Self {
            source: Some(source),
            ..Self::default()
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn source(&self) -> Option<HandleId> {
        self.source
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        if playing {
            self.finished = false;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True once the source played through to its end
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The position jumped; the next poll reports it unconditionally
    pub fn moved(&mut self) {
        self.finished = false;
        self.last_position = None;
    }

    /// Events for one poll of the sink
    pub fn observe(&mut self, position: Duration, drained: bool) -> Vec<SessionEvent> {
        let Some(source) = self.source else {
            return Vec::new();
        };
        if !self.playing || self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();
        let seconds = position.as_secs_f64();
        if self.last_position != Some(seconds) {
            self.last_position = Some(seconds);
            events.push(SessionEvent::progress(source, seconds));
        }

        if drained {
            self.finished = true;
            self.playing = false;
            events.push(SessionEvent::ended(source));
        }

        events
    }
}
