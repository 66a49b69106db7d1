/// Client configuration
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vibefy_playback::PlaybackConfig;

/// Read when no `--config` is given and the file exists
pub const DEFAULT_CONFIG_FILE: &str = "vibefy.toml";

const ENV_PREFIX: &str = "VIBEFY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Session cookie; takes precedence over the session file
    #[serde(default)]
    pub session: Option<String>,

    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default)]
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default)]
    pub shuffle: bool,

    #[serde(default)]
    pub repeat: bool,

    /// Give up on a track fetch after this many seconds
    #[serde(default)]
    pub load_timeout_secs: Option<u64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            shuffle: false,
            repeat: false,
            load_timeout_secs: None,
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `VIBEFY_*` variables override the file; nested keys use a double
    /// underscore (`VIBEFY_PLAYBACK__VOLUME=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(File::from(default_path));
                }
            }
        }

        let config: Self = settings.add_source(environment).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Server URL is required (set VIBEFY_SERVER_URL)".to_string(),
            ));
        }

        let volume = self.playback.volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::Message(format!(
                "Volume must be between 0.0 and 1.0, got {volume}"
            )));
        }

        Ok(())
    }

    /// Engine settings derived from the `[playback]` table
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.playback.volume,
            shuffle: self.playback.shuffle,
            repeat: self.playback.repeat,
            load_timeout: self.playback.load_timeout_secs.map(Duration::from_secs),
            ..PlaybackConfig::default()
        }
    }

    /// Session cookie from the configuration, else from the session file
    pub async fn resolve_session(&self) -> Option<String> {
        if let Some(session) = self.session.as_deref().filter(|s| !s.is_empty()) {
            return Some(session.to_string());
        }

        match tokio::fs::read_to_string(&self.session_file).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|s| !s.is_empty()),
            Err(_) => None,
        }
    }

    pub async fn save_session(&self, session: &str) -> std::io::Result<()> {
        tokio::fs::write(&self.session_file, session).await
    }

    pub async fn clear_session(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.session_file).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

// Default values
fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".vibefy-session")
}

fn default_volume() -> f32 {
    1.0
}
