//! Text-to-speech (TTS) processing

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Fixed voice parameters for synthesis requests.
///
/// Defaults match the service's low-bandwidth telephony profile: 8 kHz
/// output with preprocessing disabled.
#[derive(Debug, Clone)]
pub struct VoiceParams {
    /// Speaker identity, e.g. `meera`
    pub speaker: String,
    /// Pitch shift, 0 = neutral
    pub pitch: f32,
    /// Speaking pace multiplier
    pub pace: f32,
    /// Loudness multiplier
    pub loudness: f32,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Whether the service preprocesses the input text
    pub enable_preprocessing: bool,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            speaker: "meera".to_string(),
            pitch: 0.0,
            pace: 1.65,
            loudness: 1.5,
            sample_rate: 8000,
            enable_preprocessing: false,
        }
    }
}

/// Request body for the Sarvam text-to-speech API
#[derive(serde::Serialize)]
struct SarvamTtsRequest<'a> {
    inputs: [&'a str; 1],
    target_language_code: &'a str,
    speaker: &'a str,
    pitch: f32,
    pace: f32,
    loudness: f32,
    speech_sample_rate: u32,
    enable_preprocessing: bool,
    model: &'a str,
}

/// Synthesizes speech from text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given locale, returning raw audio bytes
    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>>;
}

/// Synthesizer backed by the Sarvam.ai text-to-speech endpoint
pub struct SarvamTts {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: VoiceParams,
}

impl SarvamTts {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        voice: VoiceParams,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Sarvam API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            voice,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for SarvamTts {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), locale, "starting synthesis");

        let request = SarvamTtsRequest {
            inputs: [text],
            target_language_code: locale,
            speaker: &self.voice.speaker,
            pitch: self.voice.pitch,
            pace: self.voice.pace,
            loudness: self.voice.loudness,
            speech_sample_rate: self.voice.sample_rate,
            enable_preprocessing: self.voice.enable_preprocessing,
            model: &self.model,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-subscription-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "TTS request failed");
                Error::Tts(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "TTS API error");
            return Err(Error::Tts(format!("API error {status}: {body}")));
        }

        let audio = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "failed to read TTS audio body");
            Error::Tts(format!("failed to read audio: {e}"))
        })?;

        tracing::info!(audio_bytes = audio.len(), locale, "synthesis complete");
        Ok(audio.to_vec())
    }
}
