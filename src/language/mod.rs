//! Language selection and normalization
//!
//! One policy object, parameterized two ways: a normalizer strategy
//! (pass-through, transliterate to Roman script, or detect-from-text) and a
//! target-language policy (follow the resolved language, or force a fixed
//! locale).

mod detect;
mod transliterate;

pub use detect::{detect_locale, locale_for};
pub use transliterate::{SarvamTransliterator, Transliterator};

use std::sync::Arc;

use crate::Result;

/// Default fallback locale when detection fails or maps to nothing
pub const DEFAULT_FALLBACK_LOCALE: &str = "hi-IN";

/// Roman-script locale used as the transliteration target
pub const DEFAULT_ROMAN_LOCALE: &str = "en-IN";

/// Locale codes a client may request explicitly
pub const DEFAULT_ALLOWED_LOCALES: &[&str] = &[
    "bn-IN", "gu-IN", "hi-IN", "kn-IN", "ml-IN", "mr-IN", "od-IN", "pa-IN", "ta-IN", "te-IN",
];

/// How the transcript is normalized before it reaches the chat model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Pass the transcript through unchanged
    None,
    /// Transliterate non-Roman transcripts into Roman script
    Transliterate,
    /// Ignore the STT language tag and detect the language from the text
    #[default]
    Detect,
}

impl Strategy {
    /// Parse from a config string; unknown values fall back to the default
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "transliterate" => Self::Transliterate,
            "detect" => Self::Detect,
            other => {
                tracing::warn!(value = other, "unknown normalizer strategy, using detect");
                Self::Detect
            }
        }
    }
}

/// Which locale the synthesized reply is rendered in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetLanguage {
    /// Follow the resolved language of the turn
    #[default]
    Detected,
    /// Always synthesize in one fixed locale regardless of the turn language
    Fixed(String),
}

impl TargetLanguage {
    /// Parse from a config string: `"detected"` or a fixed locale code
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("detected") {
            Self::Detected
        } else {
            Self::Fixed(s.to_string())
        }
    }
}

/// Resolves the transcript text and synthesis locale for one turn
pub struct LanguagePolicy {
    strategy: Strategy,
    target: TargetLanguage,
    fallback: String,
    allowed: Vec<String>,
    roman_locale: String,
    transliterator: Option<Arc<dyn Transliterator>>,
}

impl LanguagePolicy {
    /// Create a policy with the given strategy and target-language choice
    #[must_use]
    pub fn new(strategy: Strategy, target: TargetLanguage) -> Self {
        Self {
            strategy,
            target,
            fallback: DEFAULT_FALLBACK_LOCALE.to_string(),
            allowed: DEFAULT_ALLOWED_LOCALES.iter().map(|&s| s.to_string()).collect(),
            roman_locale: DEFAULT_ROMAN_LOCALE.to_string(),
            transliterator: None,
        }
    }

    /// Override the fallback locale
    #[must_use]
    pub fn fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = locale.into();
        self
    }

    /// Override the client-selectable locale allow-set
    #[must_use]
    pub fn allowed(mut self, locales: Vec<String>) -> Self {
        self.allowed = locales;
        self
    }

    /// Set the transliterator used by [`Strategy::Transliterate`]
    #[must_use]
    pub fn transliterator(mut self, t: Arc<dyn Transliterator>) -> Self {
        self.transliterator = Some(t);
        self
    }

    /// Resolve the synthesis locale for a turn.
    ///
    /// A fixed target policy forces its locale unconditionally. Otherwise the
    /// precedence is: allow-listed client preference, then the strategy's own
    /// language resolution, then the fallback locale.
    #[must_use]
    pub fn target_locale(
        &self,
        transcript: &str,
        detected_tag: &str,
        client_preference: Option<&str>,
    ) -> String {
        if let TargetLanguage::Fixed(locale) = &self.target {
            return locale.clone();
        }

        if let Some(pref) = client_preference {
            if self.allowed.iter().any(|a| a == pref) {
                return pref.to_string();
            }
            tracing::debug!(preference = pref, "client language not in allow-set, ignoring");
        }

        match self.strategy {
            Strategy::Detect => detect_locale(transcript, &self.fallback),
            Strategy::None | Strategy::Transliterate => {
                if detected_tag.is_empty() {
                    self.fallback.clone()
                } else {
                    detected_tag.to_string()
                }
            }
        }
    }

    /// Normalize the transcript text for the chat model.
    ///
    /// Only [`Strategy::Transliterate`] rewrites the text, and only when the
    /// detected language differs from the Roman target. Failures propagate so
    /// the orchestrator can decide between degrading and aborting.
    ///
    /// # Errors
    ///
    /// Returns error if the transliteration call fails
    pub async fn normalize_text(&self, transcript: &str, detected_tag: &str) -> Result<String> {
        if self.strategy != Strategy::Transliterate || detected_tag == self.roman_locale {
            return Ok(transcript.to_string());
        }

        let Some(transliterator) = &self.transliterator else {
            tracing::warn!("transliterate strategy configured without a transliterator");
            return Ok(transcript.to_string());
        };

        transliterator
            .transliterate(transcript, detected_tag, &self.roman_locale)
            .await
    }
}
