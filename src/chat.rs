//! Chat-completion client that produces the loan agent's scripted reply

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Persona instruction sent as the system message on every turn.
///
/// The length ceiling keeps replies short enough for low-bitrate synthesis;
/// the model treats it as a target, not a hard bound.
pub const LOAN_AGENT_PROMPT: &str = "You are a loan agent. Explain the loan eligibility criteria, \
    restrictions, and who can or cannot apply. Always answer in the language of the user's input. \
    Please keep your response under 500 characters.";

/// Generates a reply to a transcribed utterance
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Produce a reply for the (possibly normalized) transcript
    async fn respond(&self, transcript: &str) -> Result<String>;
}

/// Response generator backed by an OpenAI-compatible chat-completions endpoint
pub struct ChatResponder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl ChatResponder {
    /// Create a new responder with the loan agent persona
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(api_key: String, endpoint: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("chat API key required".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            system_prompt: LOAN_AGENT_PROMPT.to_string(),
        })
    }

    /// Override the persona instruction
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl ResponseGenerator for ChatResponder {
    async fn respond(&self, transcript: &str) -> Result<String> {
        tracing::debug!(model = %self.model, "starting chat completion");

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: transcript,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                Error::Chat(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Chat(format!("API error {status}: {body}")));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Chat(format!("failed to parse response: {e}")))?;

        let reply = result
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();

        tracing::info!(chars = reply.len(), "chat completion done");
        Ok(reply)
    }
}

#[derive(serde::Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(serde::Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(serde::Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
