//! Transliteration client for rendering native-script text in Roman characters

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Response from the Sarvam transliteration API
#[derive(serde::Deserialize)]
struct TransliterateResponse {
    transliterated_text: String,
}

/// Request body for the Sarvam transliteration API
#[derive(serde::Serialize)]
struct TransliterateRequest<'a> {
    input: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
}

/// Renders text from a native script into another script without translating
#[async_trait]
pub trait Transliterator: Send + Sync {
    /// Transliterate `text` from the `source` locale's script to `target`'s
    async fn transliterate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Transliterator backed by the Sarvam.ai transliteration endpoint
pub struct SarvamTransliterator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SarvamTransliterator {
    /// Create a new transliterator
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: String, endpoint: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Sarvam API key required for transliteration".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Transliterator for SarvamTransliterator {
    async fn transliterate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        tracing::debug!(source, target, chars = text.len(), "starting transliteration");

        let request = TransliterateRequest {
            input: text,
            source_language_code: source,
            target_language_code: target,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-subscription-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Transliterate(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transliterate(format!(
                "API error {status}: {body}"
            )));
        }

        let result: TransliterateResponse = response
            .json()
            .await
            .map_err(|e| Error::Transliterate(format!("failed to parse response: {e}")))?;

        Ok(result.transliterated_text)
    }
}
