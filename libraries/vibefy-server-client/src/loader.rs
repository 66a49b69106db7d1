//! HTTP track loader
//!
//! Resolves track ids through `/api/playSong/{id}` and wraps the bytes in
//! revocable [`AudioHandle`]s for the playback engine.

use crate::client::VibefyClient;
use crate::error::ServerClientError;
use async_trait::async_trait;
use tracing::{debug, warn};
use vibefy_playback::{AudioHandle, HandleAllocator, LoadError, TrackId, TrackLoader};

/// [`TrackLoader`] backed by a [`VibefyClient`]
#[derive(Debug)]
pub struct HttpTrackLoader {
    client: VibefyClient,
    allocator: HandleAllocator,
}

impl HttpTrackLoader {
    pub fn new(client: VibefyClient) -> Self {
        Self {
            client,
            allocator: HandleAllocator::new(),
        }
    }

    /// Handles handed out and not yet released
    pub fn live_handles(&self) -> usize {
        self.allocator.live()
    }
}

#[async_trait]
impl TrackLoader for HttpTrackLoader {
    async fn load(&self, track_id: &TrackId) -> Result<AudioHandle, LoadError> {
        let bytes = self
            .client
            .fetch_track(track_id)
            .await
            .map_err(|e| load_error(track_id, e))?;

        let handle = self
            .allocator
            .allocate(bytes.track_id, bytes.content_type, bytes.data);
        debug!(handle = %handle.id(), track_id = %track_id, size = handle.len(), "Track handle created");
        Ok(handle)
    }

    fn release(&self, handle: AudioHandle) {
        debug!(handle = %handle.id(), track_id = %handle.track_id(), "Track handle revoked");
        self.allocator.revoke(handle);
    }
}

fn load_error(track_id: &TrackId, error: ServerClientError) -> LoadError {
    warn!(track_id = %track_id, error = %error, "Track fetch failed");
    match error {
        ServerClientError::ServerError { status: 404, .. } => LoadError::NotFound(track_id.clone()),
        ServerClientError::ServerError { status, message } => LoadError::Server { status, message },
        ServerClientError::AuthRequired => LoadError::Server {
            status: 401,
            message: "Not logged in".to_string(),
        },
        ServerClientError::AuthFailed(message) => LoadError::Server {
            status: 401,
            message,
        },
        other => LoadError::Network(other.to_string()),
    }
}
