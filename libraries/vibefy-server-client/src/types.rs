//! Types for Vibefy server API requests and responses.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use vibefy_playback::{Track, TrackId};

/// Name of the session cookie set by `/api/login`
pub const SESSION_COOKIE: &str = "vibe_session";

/// Configuration for connecting to a Vibefy server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "http://localhost:8080")
    pub url: String,
    /// Value of the session cookie (if logged in)
    pub session: Option<String>,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: None,
        }
    }

    /// Create a config with an existing session.
    pub fn with_session(url: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: Some(session.into()),
        }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the register endpoint.
#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Message returned by the server
    pub message: String,
    /// Session cookie value now stored in the client
    pub session: String,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Size as reported by the server: a preformatted label or a byte count
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SizeField {
    Bytes(u64),
    Fractional(f64),
    Text(String),
}

/// One entry of the user's song list.
///
/// The server is loose about field names, so every known spelling is
/// accepted and resolved through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<TrackId>,
    #[serde(default)]
    pub song_id: Option<TrackId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub size: Option<SizeField>,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    /// Preformatted duration label
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl CatalogEntry {
    /// Identifier used for `/api/playSong`
    ///
    /// `id`, then `songId`, then the 1-based position in the list.
    pub fn track_id(&self, index: usize) -> TrackId {
        self.id
            .clone()
            .or_else(|| self.song_id.clone())
            .unwrap_or_else(|| TrackId::from(index + 1))
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.file_name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn display_owner(&self) -> &str {
        self.owner
            .as_deref()
            .or(self.artist.as_deref())
            .unwrap_or("Me")
    }

    /// Upload date as sent by the server, unparsed
    pub fn uploaded(&self) -> Option<&str> {
        self.last_modified
            .as_deref()
            .or(self.uploaded_at.as_deref())
    }

    /// Size in bytes when the server sent a number
    pub fn size_bytes(&self) -> Option<u64> {
        match &self.size {
            Some(SizeField::Bytes(n)) => Some(*n),
            Some(SizeField::Fractional(n)) if n.is_finite() && *n >= 0.0 => {
                Some(n.round() as u64)
            }
            _ => self.size_in_bytes,
        }
    }

    /// Size label when the server sent one preformatted
    pub fn size_label(&self) -> Option<&str> {
        match &self.size {
            Some(SizeField::Text(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Duration, when the server reported a usable one
    pub fn duration(&self) -> Option<Duration> {
        self.duration_seconds
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Queue entry for this song
    pub fn to_track(&self, index: usize) -> Track {
        let track = Track::new(
            self.track_id(index),
            self.display_title(),
            self.display_owner(),
        );
        match self.duration() {
            Some(duration) => track.with_duration(duration),
            None => track,
        }
    }
}

/// Song list response: a bare array, or an object wrapping one
///
/// Entries stay raw until [`CatalogResponse::into_entries`] so one malformed
/// entry cannot hide the rest of the list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogResponse {
    Entries(Vec<serde_json::Value>),
    Songs { songs: Vec<serde_json::Value> },
    List { list: Vec<serde_json::Value> },
    Other(serde_json::Value),
}

impl CatalogResponse {
    /// Entries in server order
    ///
    /// Entries that do not parse are skipped; unknown shapes yield none.
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        let raw = match self {
            CatalogResponse::Entries(entries)
            | CatalogResponse::Songs { songs: entries }
            | CatalogResponse::List { list: entries } => entries,
            CatalogResponse::Other(body) => {
                warn!(kind = json_kind(&body), "Unrecognized song list shape");
                return Vec::new();
            }
        };

        raw.into_iter()
            .enumerate()
            .filter_map(|(position, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(position, error = %e, "Skipping malformed song list entry");
                    None
                }
            })
            .collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The user's song list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Queue built from the list, in server order
    pub fn tracks(&self) -> Vec<Track> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.to_track(index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Stream / Upload Types
// =============================================================================

/// Raw audio fetched from `/api/playSong/{id}`.
#[derive(Debug, Clone)]
pub struct TrackBytes {
    pub track_id: TrackId,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Receipt for a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub file_name: String,
    pub size: u64,
    /// Message returned by the server
    pub message: String,
}
