//! Text-based language detection and locale mapping

use whatlang::Lang;

/// Map a detected language to the locale code accepted by the speech services.
///
/// Closed table: anything outside it (or a failed detection) falls back to
/// the configured default locale. `or` is what detectors commonly report for
/// Oriya, which the synthesis service spells `od-IN`.
#[must_use]
pub fn locale_for(lang: Lang) -> Option<&'static str> {
    match lang {
        Lang::Ben => Some("bn-IN"),
        Lang::Guj => Some("gu-IN"),
        Lang::Hin => Some("hi-IN"),
        Lang::Kan => Some("kn-IN"),
        Lang::Mal => Some("ml-IN"),
        Lang::Mar => Some("mr-IN"),
        Lang::Ori => Some("od-IN"),
        Lang::Pan => Some("pa-IN"),
        Lang::Tam => Some("ta-IN"),
        Lang::Tel => Some("te-IN"),
        Lang::Eng => Some("en-US"),
        _ => None,
    }
}

/// Detect the language of `text` and map it to a synthesis locale.
///
/// Detection is deterministic for a given input. Unmapped languages and
/// failed detections (e.g. empty or too-short text) return `fallback`.
#[must_use]
pub fn detect_locale(text: &str, fallback: &str) -> String {
    whatlang::detect_lang(text)
        .and_then(locale_for)
        .map_or_else(|| fallback.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_supported_languages() {
        assert_eq!(locale_for(Lang::Hin), Some("hi-IN"));
        assert_eq!(locale_for(Lang::Ori), Some("od-IN"));
        assert_eq!(locale_for(Lang::Eng), Some("en-US"));
        assert_eq!(locale_for(Lang::Tam), Some("ta-IN"));
    }

    #[test]
    fn unmapped_languages_yield_none() {
        assert_eq!(locale_for(Lang::Fra), None);
        assert_eq!(locale_for(Lang::Deu), None);
        assert_eq!(locale_for(Lang::Jpn), None);
    }

    #[test]
    fn detects_tamil_script() {
        let locale = detect_locale("வணக்கம், நீங்கள் எப்படி இருக்கிறீர்கள்", "hi-IN");
        assert_eq!(locale, "ta-IN");
    }

    #[test]
    fn detects_telugu_script() {
        let locale = detect_locale("నమస్కారం, మీరు ఎలా ఉన్నారు", "hi-IN");
        assert_eq!(locale, "te-IN");
    }

    #[test]
    fn unmapped_detection_falls_back() {
        // Greek detects fine but is outside the locale table
        let locale = detect_locale("Καλημέρα, τι κάνεις σήμερα; Όλα καλά εδώ.", "hi-IN");
        assert_eq!(locale, "hi-IN");
    }

    #[test]
    fn empty_text_falls_back() {
        assert_eq!(detect_locale("", "hi-IN"), "hi-IN");
    }
}
