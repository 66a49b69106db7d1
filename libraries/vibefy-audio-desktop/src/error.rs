/// Audio output errors
use thiserror::Error;
use vibefy_playback::SessionError;

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open the default output device
    #[error("Failed to open output stream: {0}")]
    StreamOpen(String),

    /// The bytes are not a format the decoder understands
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Seeking failed inside the decoder
    #[error("Seek error: {0}")]
    Seek(String),

    /// Failed to start the output thread
    #[error("Failed to spawn audio thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The output thread exited
    #[error("Audio thread stopped")]
    ThreadStopped,
}

impl From<rodio::StreamError> for AudioError {
    fn from(err: rodio::StreamError) -> Self {
        AudioError::StreamOpen(err.to_string())
    }
}

impl From<rodio::decoder::DecoderError> for AudioError {
    fn from(err: rodio::decoder::DecoderError) -> Self {
        AudioError::UnsupportedFormat(err.to_string())
    }
}

impl From<rodio::source::SeekError> for AudioError {
    fn from(err: rodio::source::SeekError) -> Self {
        AudioError::Seek(err.to_string())
    }
}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::UnsupportedFormat(message) => SessionError::Decode(message),
            AudioError::ThreadStopped => SessionError::Disconnected,
            other => SessionError::PlaybackRejected(other.to_string()),
        }
    }
}
