//! Play queue with a cursor
//!
//! Insertion order is playback order. The cursor is either "no selection" or
//! a valid index into the current track list; replacing the list always
//! resets it.
//!
//! Resolution methods (`next`, `prev`, `position_of`) never move the cursor.
//! The manager commits a selection with [`Queue::select`] once it has decided
//! to act on it.

use crate::error::{PlaybackError, Result};
use crate::shuffle::random_index;
use crate::types::{Track, TrackId};

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue wholesale
    ///
    /// Resets the cursor to "no selection"; nothing is auto-selected.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor = None;
    }

    /// Linear lookup by identifier
    pub fn position_of(&self, id: &TrackId) -> Result<usize> {
        self.tracks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| PlaybackError::SelectionNotFound(id.clone()))
    }

    /// Resolve the track after the cursor
    ///
    /// With `shuffle` any index in `[0, len)` is picked uniformly, the current
    /// one included. Without it the cursor advances and clamps at the last
    /// index; it never wraps. `None` only for an empty queue.
    pub fn next(&self, shuffle: bool) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        if shuffle {
            return Some(random_index(self.tracks.len()));
        }

        let last = self.tracks.len() - 1;
        Some(self.cursor.map_or(0, |c| (c + 1).min(last)))
    }

    /// Resolve the track before the cursor, clamping at 0
    pub fn prev(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        Some(self.cursor.map_or(0, |c| c.saturating_sub(1)))
    }

    /// True when `index` is where the cursor already sits
    pub fn is_at(&self, index: usize) -> bool {
        self.cursor == Some(index)
    }

    /// Move the cursor onto `index`
    pub fn select(&mut self, index: usize) -> Result<&Track> {
        match self.tracks.get(index) {
            Some(track) => {
                self.cursor = Some(index);
                Ok(track)
            }
            None => Err(PlaybackError::IndexOutOfBounds(index)),
        }
    }

    /// Get track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Current cursor
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// All tracks in playback order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: u64) -> Track {
        Track::new(id, format!("Track {}", id), "Test Artist")
    }

    fn queue_of(n: u64) -> Queue {
        let mut queue = Queue::new();
        queue.set_tracks((1..=n).map(create_test_track).collect());
        queue
    }

    #[test]
    fn create_empty_queue() {
        let queue = Queue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), None);
    }

    #[test]
    fn set_tracks_resets_cursor() {
        let mut queue = queue_of(3);
        queue.select(2).unwrap();
        assert_eq!(queue.cursor(), Some(2));

        queue.set_tracks(vec![create_test_track(9)]);
        assert_eq!(queue.cursor(), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn position_of_compares_normalized_ids() {
        let queue = queue_of(3);
        assert_eq!(queue.position_of(&TrackId::from("2")).unwrap(), 1);
        assert_eq!(queue.position_of(&TrackId::from(3u64)).unwrap(), 2);
        assert!(matches!(
            queue.position_of(&TrackId::from("99")),
            Err(PlaybackError::SelectionNotFound(_))
        ));
    }

    #[test]
    fn next_from_no_selection_is_first() {
        let queue = queue_of(3);
        assert_eq!(queue.next(false), Some(0));
    }

    #[test]
    fn next_clamps_at_end() {
        let mut queue = queue_of(3);
        queue.select(1).unwrap();
        assert_eq!(queue.next(false), Some(2));

        queue.select(2).unwrap();
        assert_eq!(queue.next(false), Some(2));
        assert!(queue.is_at(2));
    }

    #[test]
    fn prev_clamps_at_start() {
        let mut queue = queue_of(3);
        assert_eq!(queue.prev(), Some(0));

        queue.select(2).unwrap();
        assert_eq!(queue.prev(), Some(1));

        queue.select(0).unwrap();
        assert_eq!(queue.prev(), Some(0));
    }

    #[test]
    fn empty_queue_resolves_nothing() {
        let queue = Queue::new();
        assert_eq!(queue.next(false), None);
        assert_eq!(queue.next(true), None);
        assert_eq!(queue.prev(), None);
    }

    #[test]
    fn shuffle_stays_in_range() {
        let mut queue = queue_of(4);
        queue.select(3).unwrap();
        for _ in 0..200 {
            let index = queue.next(true).unwrap();
            assert!(index < 4);
        }
    }

    #[test]
    fn select_out_of_bounds_keeps_cursor() {
        let mut queue = queue_of(2);
        queue.select(1).unwrap();
        assert!(matches!(
            queue.select(5),
            Err(PlaybackError::IndexOutOfBounds(5))
        ));
        assert_eq!(queue.cursor(), Some(1));
    }
}
