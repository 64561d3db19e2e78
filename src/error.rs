//! Error types for Beacon Sight

use thiserror::Error;

/// Result type alias for Beacon Sight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while narrating
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, bad config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Object detector failed to load or to run
    #[error("detector error: {0}")]
    Detector(String),

    /// Video source missing or unopenable
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// No speech was heard before the listen timeout
    #[error("listen timed out")]
    ListenTimeout,

    /// Speech was heard but produced no usable transcript
    #[error("speech was unintelligible")]
    Unintelligible,

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Commentary service error
    #[error("commentary error: {0}")]
    Commentary(String),

    /// Keyboard input error
    #[error("input error: {0}")]
    Input(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this is an expected "nothing usable was heard" outcome
    ///
    /// The command listener loops again silently on these.
    #[must_use]
    pub const fn is_recognition_miss(&self) -> bool {
        matches!(self, Self::ListenTimeout | Self::Unintelligible)
    }
}
