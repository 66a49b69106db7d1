//! Main Vibefy server client.

use crate::auth::AuthClient;
use crate::error::{Result, ServerClientError};
use crate::library::LibraryClient;
use crate::stream::StreamClient;
use crate::types::{Catalog, LoginResponse, ServerConfig, TrackBytes, UploadReceipt, SESSION_COOKIE};
use crate::upload::UploadClient;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;
use vibefy_playback::TrackId;

/// Client for a Vibefy server.
///
/// Holds the session cookie obtained at login and sends it with every
/// request that needs one. Cloning is cheap and clones share the session.
///
/// # Example
///
/// ```ignore
/// use vibefy_server_client::{ServerConfig, VibefyClient};
///
/// let client = VibefyClient::new(ServerConfig::new("http://localhost:8080"))?;
/// client.login("me@example.com", "hunter2").await?;
///
/// let catalog = client.song_list().await?;
/// println!("Found {} songs", catalog.len());
/// ```
#[derive(Clone)]
pub struct VibefyClient {
    http: Client,
    config: Arc<RwLock<ServerConfig>>,
}

impl VibefyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let url = normalize_url(&config.url)?;

        let normalized_config = ServerConfig {
            url,
            session: config.session,
        };

        // Create HTTP client with reasonable defaults
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Vibefy/{} (CLI)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServerClientError::Request)?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(normalized_config)),
        })
    }

    /// Get the server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client holds a session.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.session.is_some()
    }

    /// Current session cookie value.
    pub async fn session(&self) -> Option<String> {
        self.config.read().await.session.clone()
    }

    /// Set the session directly (e.g., from stored configuration).
    pub async fn set_session(&self, session: impl Into<String>) {
        self.config.write().await.session = Some(session.into());
    }

    /// Forget the session.
    pub async fn logout(&self) {
        self.config.write().await.session = None;
        info!("Logged out");
    }

    /// Login with email and password.
    ///
    /// On success, the session cookie is stored for subsequent requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let url = self.url().await;

        let auth_client = AuthClient::new(&self.http, &url);
        let response = auth_client.login(email, password).await?;

        self.config.write().await.session = Some(response.session.clone());

        Ok(response)
    }

    /// Register a new account. Does not log in.
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> Result<String> {
        let url = self.url().await;
        AuthClient::new(&self.http, &url)
            .signup(email, username, password)
            .await
    }

    /// Fetch the logged-in user's song list.
    pub async fn song_list(&self) -> Result<Catalog> {
        let (url, cookie) = self.authenticated().await?;
        LibraryClient::new(&self.http, &url, &cookie)
            .get_song_list()
            .await
    }

    /// Fetch the audio bytes of one track.
    pub async fn fetch_track(&self, track_id: &TrackId) -> Result<TrackBytes> {
        let (url, cookie) = self.authenticated().await?;
        StreamClient::new(&self.http, &url, &cookie)
            .fetch_track(track_id)
            .await
    }

    /// Upload an audio file.
    pub async fn upload(&self, file_path: &Path) -> Result<UploadReceipt> {
        let (url, cookie) = self.authenticated().await?;
        UploadClient::new(&self.http, &url, &cookie)
            .upload_track(file_path)
            .await
    }

    /// Base URL and `Cookie` header value, or `AuthRequired`
    async fn authenticated(&self) -> Result<(String, String)> {
        let config = self.config.read().await;
        let session = config
            .session
            .as_deref()
            .ok_or(ServerClientError::AuthRequired)?;
        let cookie = format!("{}={}", SESSION_COOKIE, session);
        let url = config.url.clone();
        drop(config);

        debug!(url = %url, "Using stored session");
        Ok((url, cookie))
    }
}

impl std::fmt::Debug for VibefyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VibefyClient").finish_non_exhaustive()
    }
}

/// Validate a server URL and strip trailing slashes
fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        ServerClientError::InvalidUrl(format!(
            "{}: URL must start with http:// or https://",
            e
        ))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ServerClientError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(ServerClientError::InvalidUrl("URL has no host".into()));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
