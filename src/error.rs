//! Error types for the vaani relay

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Transliteration error
    #[error("transliteration error: {0}")]
    Transliterate(String),

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
    /// Pipeline stage this error belongs to, used in client-facing error events
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Stt(_) => "transcription",
            Self::Chat(_) => "chat",
            Self::Tts(_) => "synthesis",
            Self::Transliterate(_) => "transliteration",
            Self::Config(_) => "config",
            Self::Io(_) | Self::Http(_) | Self::Serialization(_) | Self::Toml(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_pipeline_stages() {
        assert_eq!(Error::Stt("x".into()).stage(), "transcription");
        assert_eq!(Error::Chat("x".into()).stage(), "chat");
        assert_eq!(Error::Tts("x".into()).stage(), "synthesis");
        assert_eq!(Error::Transliterate("x".into()).stage(), "transliteration");
    }
}
