//! Per-session turn orchestration
//!
//! Each websocket connection owns one [`Session`]. A session sequences the
//! pipeline for one utterance at a time: accumulate chunks, transcribe,
//! normalize, generate a reply, synthesize, emit. Overlapping stream-end
//! signals are rejected, never queued.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::buffer::UtteranceBuffer;
use crate::chat::ResponseGenerator;
use crate::language::LanguagePolicy;
use crate::speech::{SpeechSynthesizer, Transcriber, Transcription};

/// Turn lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Waiting for audio
    #[default]
    Idle,
    /// Receiving chunks for the current utterance
    Accumulating,
    /// Pipeline running for the current utterance
    Processing,
}

/// Terminal result of one stream-end signal.
///
/// Exactly one outcome is produced per signal: audio, an error, or a busy
/// rejection while another turn's pipeline is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Synthesized reply audio, ready to send as a binary event
    Completed(Vec<u8>),
    /// A turn was already in flight; this utterance was discarded
    Rejected,
    /// A pipeline stage failed
    Failed {
        /// Stage identifier for the client-facing error event
        stage: &'static str,
        /// Human-readable failure description
        message: String,
    },
}

struct Inner {
    buffer: UtteranceBuffer,
    state: TurnState,
}

/// Orchestrates the transcribe → normalize → respond → synthesize pipeline
/// for a single client session
pub struct Session {
    id: String,
    inner: Mutex<Inner>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn ResponseGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    language: Arc<LanguagePolicy>,
}

impl Session {
    /// Create a session wired to the given adapters
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn ResponseGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        language: Arc<LanguagePolicy>,
    ) -> Self {
        Self {
            id: id.into(),
            inner: Mutex::new(Inner {
                buffer: UtteranceBuffer::new(),
                state: TurnState::Idle,
            }),
            transcriber,
            responder,
            synthesizer,
            language,
        }
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current turn state
    pub async fn state(&self) -> TurnState {
        self.inner.lock().await.state
    }

    /// Bytes accumulated for the current utterance
    pub async fn buffered_bytes(&self) -> usize {
        self.inner.lock().await.buffer.len()
    }

    /// Append an inbound audio chunk. Always succeeds; chunks are processed
    /// strictly in arrival order.
    pub async fn append_chunk(&self, chunk: &[u8]) {
        let mut inner = self.inner.lock().await;
        inner.buffer.append(chunk);
        if inner.state == TurnState::Idle {
            inner.state = TurnState::Accumulating;
        }
    }

    /// Handle the end-of-stream signal: run the pipeline over the accumulated
    /// audio and produce exactly one terminal outcome.
    ///
    /// `client_language` is the client's declared locale preference, validated
    /// against the allow-set by the language policy.
    pub async fn finish_stream(&self, client_language: Option<&str>) -> TurnOutcome {
        let audio = {
            let mut inner = self.inner.lock().await;
            if inner.state == TurnState::Processing {
                tracing::warn!(session = %self.id, "turn already in flight, rejecting stream end");
                inner.buffer.reset();
                return TurnOutcome::Rejected;
            }
            inner.buffer.drain()
        };

        // Transcribe before claiming the turn: an utterance that cannot be
        // transcribed never enters Processing.
        let transcription = match self.transcriber.transcribe(&audio).await {
            Ok(t) => t,
            Err(e) => {
                self.end_turn().await;
                return TurnOutcome::Failed {
                    stage: e.stage(),
                    message: e.to_string(),
                };
            }
        };

        if transcription.transcript.trim().is_empty() {
            self.end_turn().await;
            return TurnOutcome::Failed {
                stage: "transcription",
                message: "could not transcribe audio".to_string(),
            };
        }

        {
            let mut inner = self.inner.lock().await;
            if inner.state == TurnState::Processing {
                inner.buffer.reset();
                return TurnOutcome::Rejected;
            }
            inner.state = TurnState::Processing;
        }

        let outcome = self.run_pipeline(&transcription, client_language).await;
        self.end_turn().await;
        outcome
    }

    /// Reset the buffer and return to `Idle`. Runs on every turn exit path.
    async fn end_turn(&self) {
        let mut inner = self.inner.lock().await;
        inner.buffer.reset();
        inner.state = TurnState::Idle;
    }

    async fn run_pipeline(
        &self,
        transcription: &Transcription,
        client_language: Option<&str>,
    ) -> TurnOutcome {
        let target = self.language.target_locale(
            &transcription.transcript,
            &transcription.language_code,
            client_language,
        );

        // Transliteration failure degrades to the raw transcript rather than
        // aborting the turn.
        let prompt_text = match self
            .language
            .normalize_text(&transcription.transcript, &transcription.language_code)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "normalization failed, using raw transcript");
                transcription.transcript.clone()
            }
        };

        let reply = match self.responder.respond(&prompt_text).await {
            Ok(reply) => reply,
            Err(e) => {
                return TurnOutcome::Failed {
                    stage: e.stage(),
                    message: e.to_string(),
                }
            }
        };
        if reply.is_empty() {
            return TurnOutcome::Failed {
                stage: "chat",
                message: "model returned an empty reply".to_string(),
            };
        }

        tracing::info!(session = %self.id, locale = %target, "reply generated, synthesizing");

        match self.synthesizer.synthesize(&reply, &target).await {
            Ok(audio) if audio.is_empty() => TurnOutcome::Failed {
                stage: "synthesis",
                message: "synthesis returned no audio".to_string(),
            },
            Ok(audio) => TurnOutcome::Completed(audio),
            Err(e) => TurnOutcome::Failed {
                stage: e.stage(),
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{Strategy, TargetLanguage};
    use crate::{Error, Result};
    use async_trait::async_trait;

    struct StubTranscriber(Result<Transcription>);

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, _audio: &[u8]) -> Result<Transcription> {
            match &self.0 {
                Ok(t) => Ok(t.clone()),
                Err(_) => Err(Error::Stt("upstream unreachable".to_string())),
            }
        }
    }

    struct StubResponder(String);

    #[async_trait]
    impl ResponseGenerator for StubResponder {
        async fn respond(&self, _transcript: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct StubSynthesizer(Vec<u8>);

    #[async_trait]
    impl SpeechSynthesizer for StubSynthesizer {
        async fn synthesize(&self, _text: &str, _locale: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn session_with(transcriber: StubTranscriber) -> Session {
        Session::new(
            "test",
            Arc::new(transcriber),
            Arc::new(StubResponder("ok".to_string())),
            Arc::new(StubSynthesizer(vec![0, 1])),
            Arc::new(LanguagePolicy::new(Strategy::None, TargetLanguage::Detected)),
        )
    }

    #[tokio::test]
    async fn append_moves_idle_to_accumulating() {
        let session = session_with(StubTranscriber(Ok(Transcription {
            transcript: "hi".to_string(),
            language_code: "hi-IN".to_string(),
        })));
        assert_eq!(session.state().await, TurnState::Idle);
        session.append_chunk(b"RIFF").await;
        assert_eq!(session.state().await, TurnState::Accumulating);
        assert_eq!(session.buffered_bytes().await, 4);
    }

    #[tokio::test]
    async fn transcription_error_resets_and_returns_to_idle() {
        let session = session_with(StubTranscriber(Err(Error::Stt(String::new()))));
        session.append_chunk(b"RIFFdata").await;

        let outcome = session.finish_stream(None).await;
        assert!(matches!(
            outcome,
            TurnOutcome::Failed { stage: "transcription", .. }
        ));
        assert_eq!(session.state().await, TurnState::Idle);
        assert_eq!(session.buffered_bytes().await, 0);
    }

    #[tokio::test]
    async fn successful_turn_clears_buffer() {
        let session = session_with(StubTranscriber(Ok(Transcription {
            transcript: "What is the loan eligibility?".to_string(),
            language_code: "en-IN".to_string(),
        })));
        session.append_chunk(b"RIFF").await;
        session.append_chunk(b"more wav bytes").await;

        let outcome = session.finish_stream(None).await;
        assert_eq!(outcome, TurnOutcome::Completed(vec![0, 1]));
        assert_eq!(session.state().await, TurnState::Idle);
        assert_eq!(session.buffered_bytes().await, 0);
    }
}
