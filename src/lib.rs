//! Vaani Relay - voice relay gateway for a multilingual loan assistant
//!
//! This library provides the core functionality for the relay:
//! - Per-session audio accumulation and turn orchestration
//! - Remote speech adapters (Sarvam.ai STT/TTS, transliteration)
//! - Loan-agent reply generation via an OpenAI-compatible chat model
//! - Language selection: client preference, text detection, locale mapping
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Client (websocket)                   │
//! │   binary audio chunks  │  audio_stream_end event    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Vaani Relay                         │
//! │   Session  │  Language Policy  │  Event emission    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Remote services (HTTP)                  │
//! │   STT  │  Chat  │  TTS  │  Transliteration          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod language;
pub mod session;
pub mod speech;

pub use chat::{ChatResponder, ResponseGenerator, LOAN_AGENT_PROMPT};
pub use config::Config;
pub use error::{Error, Result};
pub use language::{LanguagePolicy, Strategy, TargetLanguage, Transliterator};
pub use session::{Session, TurnOutcome, TurnState, UtteranceBuffer};
pub use speech::{
    SarvamStt, SarvamTts, SpeechSynthesizer, Transcriber, Transcription, VoiceParams,
};
