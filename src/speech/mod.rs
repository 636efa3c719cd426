//! Remote speech service adapters
//!
//! STT and TTS are single blocking round-trips to the Sarvam.ai HTTP APIs,
//! one call per turn. No retries; the orchestrator surfaces failures.

mod stt;
mod tts;

pub use stt::{SarvamStt, Transcriber, Transcription};
pub use tts::{SarvamTts, SpeechSynthesizer, VoiceParams};
