//! Best-effort language identification
//!
//! Wraps a statistical detector and maps its output to two-letter ISO-639-1
//! codes. Detection is advisory: on empty text, an inconclusive detector
//! result, or a language without a two-letter code this returns `None` and
//! the caller applies its own site-specific default.

/// Identify the language of `text` as an ISO-639-1 code.
///
/// Returns `None` when the text is empty, the detector cannot classify it,
/// or the detected language has no two-letter code.
#[must_use]
pub fn detect(text: &str) -> Option<&'static str> {
    let info = whatlang::detect(text)?;
    let code = info.lang().code();
    isolang::Language::from_639_3(code).and_then(|lang| lang.to_639_1())
}

/// Identify the language of `text`, falling back to `default` when
/// detection is inconclusive.
#[must_use]
pub fn detect_or<'a>(text: &str, default: &'a str) -> &'a str {
    detect(text).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_arabic() {
        assert_eq!(detect("كيف أسقي نبات الصبار في الصيف؟"), Some("ar"));
    }

    #[test]
    fn detects_english() {
        assert_eq!(
            detect("How often should I water a cactus during the summer months?"),
            Some("en")
        );
    }

    #[test]
    fn empty_text_is_inconclusive() {
        assert_eq!(detect(""), None);
    }

    #[test]
    fn fallback_applies_per_call_site() {
        // The answer path defaults to Arabic, the synthesis path to English;
        // both flow through the same helper.
        assert_eq!(detect_or("", "ar"), "ar");
        assert_eq!(detect_or("", "en"), "en");
    }
}
