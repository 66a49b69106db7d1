//! Audio handles
//!
//! An [`AudioHandle`] is the local, revocable reference to a track's fetched
//! bytes. Handles are move-only: the only way to give one up is to pass it to
//! [`crate::TrackLoader::release`] (or drop it), so a handle cannot be
//! released twice.

use crate::types::TrackId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Identity of one handle, carried on session events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(u64);

impl HandleId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

/// Fetched audio bytes bound (or about to be bound) to an audio session
pub struct AudioHandle {
    id: HandleId,
    track_id: TrackId,
    content_type: Option<String>,
    data: Bytes,
}

impl AudioHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// MIME type reported by the byte stream, if any
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The audio bytes; cloning `Bytes` is a refcount bump
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("id", &self.id)
            .field("track_id", &self.track_id)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Mints handles and tracks how many are still live
///
/// Each loader owns one; `live()` reaching zero after teardown means every
/// handle was released.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: AtomicU64,
    live: AtomicUsize,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap fetched bytes in a new handle
    pub fn allocate(
        &self,
        track_id: TrackId,
        content_type: Option<String>,
        data: Bytes,
    ) -> AudioHandle {
        let id = HandleId(self.next.fetch_add(1, Ordering::Relaxed) + 1);
        self.live.fetch_add(1, Ordering::AcqRel);
        AudioHandle {
            id,
            track_id,
            content_type,
            data,
        }
    }

    /// Revoke a handle, freeing its bytes
    pub fn revoke(&self, handle: AudioHandle) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        drop(handle);
    }

    /// Handles allocated and not yet revoked
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}
