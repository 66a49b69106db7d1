//! Vibefy Server Client
//!
//! HTTP client library for the Vibefy server API.
//!
//! # Features
//!
//! - **Authentication**: login (cookie session) and signup
//! - **Library**: the user's song list, tolerant of loose response shapes
//! - **Streaming**: raw track bytes, plus an [`HttpTrackLoader`] for the
//!   playback engine
//! - **Upload**: multipart upload of audio files
//!
//! # Example
//!
//! ```ignore
//! use vibefy_server_client::{ServerConfig, VibefyClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VibefyClient::new(ServerConfig::new("http://localhost:8080"))?;
//!
//!     client.login("me@example.com", "password").await?;
//!
//!     let catalog = client.song_list().await?;
//!     for track in catalog.tracks() {
//!         println!("{} - {}", track.title, track.artist);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
mod library;
mod loader;
mod stream;
mod types;
mod upload;

pub use client::VibefyClient;
pub use error::{Result, ServerClientError};
pub use loader::HttpTrackLoader;
pub use types::{
    Catalog, CatalogEntry, CatalogResponse, LoginResponse, ServerConfig, SizeField, TrackBytes,
    UploadReceipt, SESSION_COOKIE,
};
pub use upload::mime_type_for_file;

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use library::LibraryClient;
pub use stream::StreamClient;
pub use upload::UploadClient;
