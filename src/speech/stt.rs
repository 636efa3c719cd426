//! Speech-to-text (STT) processing

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Response from the Sarvam speech-to-text API
#[derive(serde::Deserialize)]
struct SarvamSttResponse {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    language_code: Option<String>,
}

/// One transcribed utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcription {
    /// Transcript text; empty when the service heard nothing usable
    pub transcript: String,
    /// Detected language tag, e.g. `hi-IN`
    pub language_code: String,
}

/// Transcribes speech to text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete WAV-framed utterance
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription>;
}

/// Transcriber backed by the Sarvam.ai speech-to-text endpoint
pub struct SarvamStt {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    num_speakers: u32,
    fallback_language: String,
}

impl SarvamStt {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        num_speakers: u32,
        fallback_language: String,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Sarvam API key required for STT".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            num_speakers,
            fallback_language,
        })
    }
}

#[async_trait]
impl Transcriber for SarvamStt {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("streamed_audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language_code", "unknown")
            .text("with_timestamps", "false")
            .text("with_diarization", "false")
            .text("num_speakers", self.num_speakers.to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-subscription-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "STT request failed");
                Error::Stt(format!("request failed: {e}"))
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "STT API error");
            return Err(Error::Stt(format!("API error {status}: {body}")));
        }

        let result: SarvamSttResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse STT response");
            Error::Stt(format!("failed to parse response: {e}"))
        })?;

        let language_code = result
            .language_code
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| self.fallback_language.clone());

        tracing::info!(transcript = %result.transcript, language = %language_code, "transcription complete");
        Ok(Transcription {
            transcript: result.transcript,
            language_code,
        })
    }
}
