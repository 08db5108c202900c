//! Error types for the player

/// Errors raised by audio backends and the coordinator handle.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Fetching a remote audio resource failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Remote server answered with a non-success status.
    #[error("Fetch failed for {uri}: HTTP {status}")]
    HttpStatus { uri: String, status: u16 },

    /// Local file access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The resource could not be decoded as audio.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The audio output device could not be opened or used.
    #[error("Audio output error: {0}")]
    Output(String),

    /// The session was already released by the backend.
    #[error("Audio session is no longer available")]
    SessionClosed,

    /// The coordinator worker has shut down.
    #[error("Playback coordinator is shut down")]
    CoordinatorClosed,

    /// A track list could not be parsed.
    #[error("Invalid track list: {0}")]
    Library(String),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
