//! TOML configuration file loading
//!
//! Supports `~/.config/vaani/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct RelayConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// API keys for the remote services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Chat model configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Language selection configuration
    #[serde(default)]
    pub language: LanguageFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Websocket server port
    pub port: Option<u16>,

    /// Timeout for each outbound remote call, in seconds
    pub request_timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub sarvam: Option<String>,
    pub chat: Option<String>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Endpoint URL
    pub endpoint: Option<String>,

    /// Model identifier (e.g. "saarika:v2")
    pub model: Option<String>,

    /// Speaker count hint passed to the service
    pub num_speakers: Option<u32>,
}

/// Chat model configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    /// OpenAI-compatible chat-completions endpoint URL
    pub endpoint: Option<String>,

    /// Model identifier (e.g. "llama-3.3-70b-versatile")
    pub model: Option<String>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Endpoint URL
    pub endpoint: Option<String>,

    /// Model identifier (e.g. "bulbul:v1")
    pub model: Option<String>,

    /// Speaker identity (e.g. "meera")
    pub speaker: Option<String>,

    /// Pitch shift
    pub pitch: Option<f32>,

    /// Speaking pace multiplier
    pub pace: Option<f32>,

    /// Loudness multiplier
    pub loudness: Option<f32>,

    /// Output sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Whether the service preprocesses input text
    pub enable_preprocessing: Option<bool>,
}

/// Language selection configuration
#[derive(Debug, Default, Deserialize)]
pub struct LanguageFileConfig {
    /// Normalizer strategy: "none", "transliterate", or "detect"
    pub strategy: Option<String>,

    /// Target language policy: "detected" or a fixed locale code
    pub target: Option<String>,

    /// Fallback locale for failed or unmapped detection
    pub fallback: Option<String>,

    /// Client-selectable locale allow-set
    pub allowed: Option<Vec<String>>,

    /// Transliteration endpoint URL
    pub transliterate_endpoint: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `RelayConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> RelayConfigFile {
    let Some(path) = config_file_path() else {
        return RelayConfigFile::default();
    };

    if !path.exists() {
        return RelayConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                RelayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            RelayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vaani/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vaani").join("config.toml"))
}
