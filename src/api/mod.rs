//! HTTP API server for the vaani relay

pub mod health;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chat::{ChatResponder, ResponseGenerator};
use crate::config::Config;
use crate::language::{LanguagePolicy, SarvamTransliterator, Strategy};
use crate::session::Session;
use crate::speech::{SarvamStt, SarvamTts, SpeechSynthesizer, Transcriber};
use crate::Result;

/// Shared state for API handlers: the remote adapters and language policy
/// every session is wired to
pub struct ApiState {
    pub transcriber: Arc<dyn Transcriber>,
    pub responder: Arc<dyn ResponseGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub language: Arc<LanguagePolicy>,
}

impl ApiState {
    /// Build the remote adapters and language policy from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.server.request_timeout;
        let sarvam_key = config.api_keys.sarvam.clone().unwrap_or_default();
        let chat_key = config.api_keys.chat.clone().unwrap_or_default();

        let transcriber = Arc::new(SarvamStt::new(
            sarvam_key.clone(),
            config.stt.endpoint.clone(),
            config.stt.model.clone(),
            config.stt.num_speakers,
            config.language.fallback.clone(),
            timeout,
        )?);

        let responder = Arc::new(ChatResponder::new(
            chat_key,
            config.chat.endpoint.clone(),
            config.chat.model.clone(),
            timeout,
        )?);

        let synthesizer = Arc::new(SarvamTts::new(
            sarvam_key.clone(),
            config.tts.endpoint.clone(),
            config.tts.model.clone(),
            config.tts.voice.clone(),
            timeout,
        )?);

        let mut language =
            LanguagePolicy::new(config.language.strategy, config.language.target.clone())
                .fallback(config.language.fallback.clone())
                .allowed(config.language.allowed.clone());

        if config.language.strategy == Strategy::Transliterate {
            let transliterator = SarvamTransliterator::new(
                sarvam_key,
                config.language.transliterate_endpoint.clone(),
                timeout,
            )?;
            language = language.transliterator(Arc::new(transliterator));
        }

        Ok(Self {
            transcriber,
            responder,
            synthesizer,
            language: Arc::new(language),
        })
    }

    /// Create a session bound to this state's adapters
    #[must_use]
    pub fn new_session(&self, id: impl Into<String>) -> Session {
        Session::new(
            id,
            Arc::clone(&self.transcriber),
            Arc::clone(&self.responder),
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.language),
        )
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ApiState::from_config(config)?),
            port: config.server.port,
        })
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        // CORS layer for cross-origin requests from browser clients
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .nest("/ws", websocket::router(Arc::clone(&self.state)))
            .merge(health::router())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
