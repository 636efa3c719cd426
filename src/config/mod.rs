//! Configuration management for the vaani relay

pub mod file;

use std::time::Duration;

use crate::language::{
    Strategy, TargetLanguage, DEFAULT_ALLOWED_LOCALES, DEFAULT_FALLBACK_LOCALE,
};
use crate::speech::VoiceParams;

/// Relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server/runtime configuration
    pub server: ServerConfig,

    /// API keys for the remote services
    pub api_keys: ApiKeys,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Chat model configuration
    pub chat: ChatConfig,

    /// Text-to-speech configuration
    pub tts: TtsConfig,

    /// Language selection configuration
    pub language: LanguageConfig,
}

/// Server/runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Websocket server port
    pub port: u16,

    /// Timeout applied to every outbound remote call
    pub request_timeout: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Sarvam.ai subscription key (STT, TTS, transliteration)
    pub sarvam: Option<String>,

    /// Chat completion API key (Groq by default)
    pub chat: Option<String>,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Endpoint URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Speaker count hint passed to the service
    pub num_speakers: u32,
}

/// Chat model configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// OpenAI-compatible chat-completions endpoint URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Endpoint URL
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Voice parameters for synthesis
    pub voice: VoiceParams,
}

/// Language selection configuration
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Normalizer strategy
    pub strategy: Strategy,

    /// Target language policy for synthesis
    pub target: TargetLanguage,

    /// Fallback locale for failed or unmapped detection
    pub fallback: String,

    /// Client-selectable locale allow-set
    pub allowed: Vec<String>,

    /// Transliteration endpoint URL
    pub transliterate_endpoint: String,
}

impl Config {
    /// Load configuration with priority env > config file > default
    #[must_use]
    pub fn load() -> Self {
        Self::from_file(file::load_config_file())
    }

    /// Build configuration from a file overlay, applying env overrides
    #[must_use]
    pub fn from_file(fc: file::RelayConfigFile) -> Self {
        let api_keys = ApiKeys {
            sarvam: std::env::var("SARVAM_API_KEY").ok().or(fc.api_keys.sarvam),
            chat: std::env::var("GROQ_API_KEY").ok().or(fc.api_keys.chat),
        };

        let server = ServerConfig {
            port: std::env::var("VAANI_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(8790),
            request_timeout: Duration::from_secs(
                std::env::var("VAANI_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .or(fc.server.request_timeout_secs)
                    .unwrap_or(30),
            ),
        };

        let stt = SttConfig {
            endpoint: std::env::var("VAANI_STT_ENDPOINT")
                .ok()
                .or(fc.stt.endpoint)
                .unwrap_or_else(|| "https://api.sarvam.ai/speech-to-text".to_string()),
            model: std::env::var("VAANI_STT_MODEL")
                .ok()
                .or(fc.stt.model)
                .unwrap_or_else(|| "saarika:v2".to_string()),
            num_speakers: fc.stt.num_speakers.unwrap_or(1),
        };

        let chat = ChatConfig {
            endpoint: std::env::var("VAANI_CHAT_ENDPOINT")
                .ok()
                .or(fc.chat.endpoint)
                .unwrap_or_else(|| {
                    "https://api.groq.com/openai/v1/chat/completions".to_string()
                }),
            model: std::env::var("VAANI_CHAT_MODEL")
                .ok()
                .or(fc.chat.model)
                .unwrap_or_else(|| "llama-3.3-70b-versatile".to_string()),
        };

        let default_voice = VoiceParams::default();
        let tts = TtsConfig {
            endpoint: std::env::var("VAANI_TTS_ENDPOINT")
                .ok()
                .or(fc.tts.endpoint)
                .unwrap_or_else(|| "https://api.sarvam.ai/text-to-speech".to_string()),
            model: std::env::var("VAANI_TTS_MODEL")
                .ok()
                .or(fc.tts.model)
                .unwrap_or_else(|| "bulbul:v1".to_string()),
            voice: VoiceParams {
                speaker: std::env::var("VAANI_TTS_SPEAKER")
                    .ok()
                    .or(fc.tts.speaker)
                    .unwrap_or(default_voice.speaker),
                pitch: fc.tts.pitch.unwrap_or(default_voice.pitch),
                pace: fc.tts.pace.unwrap_or(default_voice.pace),
                loudness: fc.tts.loudness.unwrap_or(default_voice.loudness),
                sample_rate: fc.tts.sample_rate.unwrap_or(default_voice.sample_rate),
                enable_preprocessing: fc
                    .tts
                    .enable_preprocessing
                    .unwrap_or(default_voice.enable_preprocessing),
            },
        };

        let language = LanguageConfig {
            strategy: std::env::var("VAANI_LANGUAGE_STRATEGY")
                .ok()
                .or(fc.language.strategy)
                .map_or_else(Strategy::default, |s| Strategy::from_str(&s)),
            target: std::env::var("VAANI_TARGET_LANGUAGE")
                .ok()
                .or(fc.language.target)
                .map_or_else(TargetLanguage::default, |s| TargetLanguage::from_str(&s)),
            fallback: std::env::var("VAANI_FALLBACK_LOCALE")
                .ok()
                .or(fc.language.fallback)
                .unwrap_or_else(|| DEFAULT_FALLBACK_LOCALE.to_string()),
            allowed: fc.language.allowed.unwrap_or_else(|| {
                DEFAULT_ALLOWED_LOCALES.iter().map(|&s| s.to_string()).collect()
            }),
            transliterate_endpoint: fc
                .language
                .transliterate_endpoint
                .unwrap_or_else(|| "https://api.sarvam.ai/transliterate".to_string()),
        };

        Self {
            server,
            api_keys,
            stt,
            chat,
            tts,
            language,
        }
    }
}
