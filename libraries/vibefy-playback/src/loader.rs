//! Track resource loading
//!
//! The manager never fetches anything itself. Selecting a track queues a
//! [`LoadRequest`] stamped with a fresh [`LoadTicket`]; whoever runs the
//! manager performs the fetch and hands back a [`LoadResult`] with the same
//! ticket. Results whose ticket is no longer the pending one are stale and
//! only get released.

use crate::error::LoadError;
use crate::handle::AudioHandle;
use crate::types::TrackId;
use async_trait::async_trait;

/// Resolves track identifiers to playable bytes
#[async_trait]
pub trait TrackLoader: Send + Sync + 'static {
    /// Fetch the audio bytes for `track_id` and wrap them in a handle
    async fn load(&self, track_id: &TrackId) -> std::result::Result<AudioHandle, LoadError>;

    /// Revoke a handle this loader created
    ///
    /// Called exactly once per successfully created handle, including
    /// handles whose load was superseded before it finished.
    fn release(&self, handle: AudioHandle);
}

/// Stamp identifying one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub(crate) u64);

/// A fetch the manager wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub track_id: TrackId,
}

/// Completion of a [`LoadRequest`]
#[derive(Debug)]
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub track_id: TrackId,
    pub outcome: std::result::Result<AudioHandle, LoadError>,
}

impl LoadResult {
    pub fn new(
        request: LoadRequest,
        outcome: std::result::Result<AudioHandle, LoadError>,
    ) -> Self {
        Self {
            ticket: request.ticket,
            track_id: request.track_id,
            outcome,
        }
    }
}
