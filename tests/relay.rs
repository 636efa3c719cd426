//! Relay pipeline integration tests
//!
//! Drives the session orchestrator end-to-end with mock remote adapters,
//! without requiring network access or live service credentials.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vaani_relay::{
    Error, LanguagePolicy, ResponseGenerator, Result, Session, SpeechSynthesizer, Strategy,
    TargetLanguage, Transcriber, Transcription, Transliterator, TurnOutcome, TurnState,
};

struct MockTranscriber {
    transcript: &'static str,
    language: &'static str,
    fail: bool,
}

impl MockTranscriber {
    fn returning(transcript: &'static str, language: &'static str) -> Self {
        Self {
            transcript,
            language,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            transcript: "",
            language: "",
            fail: true,
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Transcription> {
        if self.fail {
            return Err(Error::Stt("service unreachable".to_string()));
        }
        Ok(Transcription {
            transcript: self.transcript.to_string(),
            language_code: self.language.to_string(),
        })
    }
}

struct MockResponder {
    reply: &'static str,
    fail: bool,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockResponder {
    fn returning(reply: &'static str) -> Self {
        Self {
            reply,
            fail: false,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: "",
            fail: true,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseGenerator for MockResponder {
    async fn respond(&self, transcript: &str) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.prompts.lock().unwrap().push(transcript.to_string());
        if self.fail {
            return Err(Error::Chat("model unavailable".to_string()));
        }
        Ok(self.reply.to_string())
    }
}

struct MockSynthesizer {
    audio: Vec<u8>,
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSynthesizer {
    fn returning(audio: &[u8]) -> Self {
        Self {
            audio: audio.to_vec(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            audio: Vec::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), locale.to_string()));
        if self.fail {
            return Err(Error::Tts("service unreachable".to_string()));
        }
        Ok(self.audio.clone())
    }
}

struct FailingTransliterator;

#[async_trait]
impl Transliterator for FailingTransliterator {
    async fn transliterate(&self, _: &str, _: &str, _: &str) -> Result<String> {
        Err(Error::Transliterate("service unreachable".to_string()))
    }
}

fn detect_policy() -> Arc<LanguagePolicy> {
    Arc::new(LanguagePolicy::new(Strategy::Detect, TargetLanguage::Detected))
}

fn make_session(
    transcriber: MockTranscriber,
    responder: Arc<MockResponder>,
    synthesizer: Arc<MockSynthesizer>,
    language: Arc<LanguagePolicy>,
) -> Session {
    Session::new(
        "test-session",
        Arc::new(transcriber),
        responder,
        synthesizer,
        language,
    )
}

#[tokio::test]
async fn end_to_end_turn_emits_audio_and_clears_buffer() {
    let responder = Arc::new(MockResponder::returning("You must be 21+ with steady income."));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"\x00\x01audio"));
    let session = make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFF...").await;
    session.append_chunk(b"...more wav bytes...").await;
    assert_eq!(session.state().await, TurnState::Accumulating);

    let outcome = session.finish_stream(None).await;

    assert_eq!(outcome, TurnOutcome::Completed(b"\x00\x01audio".to_vec()));
    assert_eq!(session.buffered_bytes().await, 0);
    assert_eq!(session.state().await, TurnState::Idle);

    let calls = synthesizer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "You must be 21+ with steady income.");
}

#[tokio::test]
async fn empty_transcript_fails_without_running_the_pipeline() {
    let responder = Arc::new(MockResponder::returning("unused"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"unused"));
    let session = make_session(
        MockTranscriber::returning("", "hi-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(
        outcome,
        TurnOutcome::Failed { stage: "transcription", ref message } if !message.is_empty()
    ));
    assert_eq!(session.buffered_bytes().await, 0);
    assert_eq!(session.state().await, TurnState::Idle);
    // No pipeline run: neither the chat model nor synthesis was reached
    assert!(responder.calls().is_empty());
    assert!(synthesizer.calls().is_empty());
}

#[tokio::test]
async fn transcription_failure_surfaces_its_stage() {
    let responder = Arc::new(MockResponder::returning("unused"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"unused"));
    let session = make_session(
        MockTranscriber::failing(),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(
        outcome,
        TurnOutcome::Failed { stage: "transcription", .. }
    ));
    assert!(responder.calls().is_empty());
    assert_eq!(session.buffered_bytes().await, 0);
}

#[tokio::test]
async fn chat_failure_surfaces_its_stage_and_skips_synthesis() {
    let responder = Arc::new(MockResponder::failing());
    let synthesizer = Arc::new(MockSynthesizer::returning(b"unused"));
    let session = make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(outcome, TurnOutcome::Failed { stage: "chat", .. }));
    assert!(synthesizer.calls().is_empty());
    assert_eq!(session.state().await, TurnState::Idle);
    assert_eq!(session.buffered_bytes().await, 0);
}

#[tokio::test]
async fn empty_reply_short_circuits_before_synthesis() {
    let responder = Arc::new(MockResponder::returning(""));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"unused"));
    let session = make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(outcome, TurnOutcome::Failed { stage: "chat", .. }));
    assert!(synthesizer.calls().is_empty());
}

#[tokio::test]
async fn synthesis_failure_surfaces_its_stage() {
    let responder = Arc::new(MockResponder::returning("You must be 21+ with steady income."));
    let synthesizer = Arc::new(MockSynthesizer::failing());
    let session = make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(
        outcome,
        TurnOutcome::Failed { stage: "synthesis", .. }
    ));
    assert_eq!(session.state().await, TurnState::Idle);
    assert_eq!(session.buffered_bytes().await, 0);
}

#[tokio::test]
async fn concurrent_stream_end_is_rejected_not_queued() {
    let responder =
        Arc::new(MockResponder::returning("You must be 21+ with steady income.")
            .with_delay(Duration::from_millis(200)));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"\x00\x01audio"));
    let session = Arc::new(make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    ));

    session.append_chunk(b"RIFFdata").await;

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.finish_stream(None).await })
    };

    // Let the first turn claim the pipeline, then signal again mid-flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.append_chunk(b"next utterance").await;
    let second = session.finish_stream(None).await;

    assert_eq!(second, TurnOutcome::Rejected);
    // The rejected event's audio is discarded
    assert_eq!(session.buffered_bytes().await, 0);

    let first = first.await.unwrap();
    assert_eq!(first, TurnOutcome::Completed(b"\x00\x01audio".to_vec()));

    // Only one pipeline ran
    assert_eq!(synthesizer.calls().len(), 1);
    assert_eq!(session.state().await, TurnState::Idle);
}

#[tokio::test]
async fn allow_listed_client_preference_overrides_detection() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    let session = make_session(
        MockTranscriber::returning("how are you", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(Some("hi-IN")).await;

    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    let calls = synthesizer.calls();
    assert_eq!(calls[0].1, "hi-IN");
}

#[tokio::test]
async fn unmapped_detection_falls_back_to_default_locale() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    // Greek transcript: detectable, but outside the locale table
    let session = make_session(
        MockTranscriber::returning("Καλημέρα, τι κάνεις σήμερα; Όλα καλά εδώ.", "el-GR"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    assert_eq!(synthesizer.calls()[0].1, "hi-IN");
}

#[tokio::test]
async fn fixed_target_policy_forces_the_output_locale() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    let session = make_session(
        MockTranscriber::returning("कर्ज़ के लिए कौन आवेदन कर सकता है", "hi-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        Arc::new(LanguagePolicy::new(
            Strategy::None,
            TargetLanguage::Fixed("en-IN".to_string()),
        )),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    assert_eq!(synthesizer.calls()[0].1, "en-IN");
}

#[tokio::test]
async fn roman_transcript_reaches_the_model_unchanged() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    let session = make_session(
        MockTranscriber::returning("what is the interest rate", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        Arc::new(LanguagePolicy::new(
            Strategy::Transliterate,
            TargetLanguage::Detected,
        )),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    assert_eq!(responder.calls(), vec!["what is the interest rate".to_string()]);
}

#[tokio::test]
async fn transliteration_failure_degrades_to_raw_transcript() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    let policy = LanguagePolicy::new(Strategy::Transliterate, TargetLanguage::Detected)
        .transliterator(Arc::new(FailingTransliterator));
    let session = make_session(
        MockTranscriber::returning("कर्ज़ चाहिए", "hi-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        Arc::new(policy),
    );

    session.append_chunk(b"RIFFdata").await;
    let outcome = session.finish_stream(None).await;

    // The turn still completes; the model sees the untransliterated text
    assert!(matches!(outcome, TurnOutcome::Completed(_)));
    assert_eq!(responder.calls(), vec!["कर्ज़ चाहिए".to_string()]);
}

#[tokio::test]
async fn back_to_back_turns_reuse_the_session() {
    let responder = Arc::new(MockResponder::returning("reply"));
    let synthesizer = Arc::new(MockSynthesizer::returning(b"audio"));
    let session = make_session(
        MockTranscriber::returning("What is the loan eligibility?", "en-IN"),
        Arc::clone(&responder),
        Arc::clone(&synthesizer),
        detect_policy(),
    );

    for _ in 0..3 {
        session.append_chunk(b"RIFFdata").await;
        let outcome = session.finish_stream(None).await;
        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(session.buffered_bytes().await, 0);
        assert_eq!(session.state().await, TurnState::Idle);
    }

    assert_eq!(synthesizer.calls().len(), 3);
}
