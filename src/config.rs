//! Configuration for the flora gateway
//!
//! Environment-first, with an optional partial TOML overlay file
//! (`flora.toml`). All file fields are optional — the file overlays the
//! built-in defaults, and `GEMINI_API_KEY` always comes from the environment.

use std::collections::HashMap;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::{Error, Result};

/// Default Gemini model for plant answers
pub const DEFAULT_ORACLE_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini REST endpoint base
pub const DEFAULT_ORACLE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default speech recognition endpoint
pub const DEFAULT_STT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Default speech synthesis endpoint (gTTS-style service)
pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Oracle (plant expert model) configuration
    pub oracle: OracleConfig,

    /// Speech recognition configuration
    pub stt: SttConfig,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// Whether error/apology answers are also synthesized to speech.
    /// The HTTP gateway runs with `false`, the interactive loop with `true`;
    /// a `[pipeline]` file entry overrides either.
    pub speak_errors: Option<bool>,
}

/// Oracle model configuration
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// API key, from `GEMINI_API_KEY`
    pub api_key: Option<SecretString>,

    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: String,

    /// REST endpoint base
    pub endpoint: String,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Locale attempted first (e.g. "ar-EG")
    pub primary_locale: String,

    /// Locale attempted after a service failure (e.g. "en-US")
    pub fallback_locale: String,

    /// Recognition endpoint
    pub endpoint: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Language code → engine voice code
    pub voices: HashMap<String, String>,

    /// Voice used when the language has no table entry
    pub default_voice: String,

    /// Maximum utterance length per engine call, in characters
    pub chunk_chars: usize,

    /// Synthesis endpoint
    pub endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle: OracleConfig {
                api_key: None,
                model: DEFAULT_ORACLE_MODEL.to_string(),
                endpoint: DEFAULT_ORACLE_ENDPOINT.to_string(),
            },
            stt: SttConfig {
                primary_locale: "ar-EG".to_string(),
                fallback_locale: "en-US".to_string(),
                endpoint: DEFAULT_STT_ENDPOINT.to_string(),
            },
            tts: TtsConfig {
                voices: default_voices(),
                default_voice: "en".to_string(),
                chunk_chars: 200,
                endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            },
            speak_errors: None,
        }
    }
}

/// Built-in voice table: Arabic and English voices registered out of the box
fn default_voices() -> HashMap<String, String> {
    let mut voices = HashMap::new();
    voices.insert("ar".to_string(), "ar".to_string());
    voices.insert("en".to_string(), "en".to_string());
    voices
}

impl Config {
    /// Load configuration: defaults, then the optional TOML overlay,
    /// then the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing key is not an error here — the two entry points react
    /// differently (serve warns and degrades, repl refuses to start).
    ///
    /// # Errors
    ///
    /// Returns error if the overlay file exists but cannot be read or parsed.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = file {
            if path.exists() {
                let raw = std::fs::read_to_string(path)?;
                let overlay: ConfigFile = toml::from_str(&raw)?;
                config.apply_overlay(overlay);
                tracing::debug!(path = %path.display(), "applied config overlay");
            } else {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
            }
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.oracle.api_key = Some(SecretString::from(key));
            }
        }

        if config.tts.chunk_chars == 0 {
            return Err(Error::Config(
                "tts.chunk_chars must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// Whether the oracle credential is present
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.oracle.api_key.is_some()
    }

    fn apply_overlay(&mut self, file: ConfigFile) {
        if let Some(model) = file.oracle.model {
            self.oracle.model = model;
        }
        if let Some(endpoint) = file.oracle.endpoint {
            self.oracle.endpoint = endpoint;
        }
        if let Some(locale) = file.stt.primary_locale {
            self.stt.primary_locale = locale;
        }
        if let Some(locale) = file.stt.fallback_locale {
            self.stt.fallback_locale = locale;
        }
        if let Some(endpoint) = file.stt.endpoint {
            self.stt.endpoint = endpoint;
        }
        if let Some(voices) = file.tts.voices {
            self.tts.voices = voices;
        }
        if let Some(voice) = file.tts.default_voice {
            self.tts.default_voice = voice;
        }
        if let Some(chars) = file.tts.chunk_chars {
            self.tts.chunk_chars = chars;
        }
        if let Some(endpoint) = file.tts.endpoint {
            self.tts.endpoint = endpoint;
        }
        if let Some(speak) = file.pipeline.speak_errors {
            self.speak_errors = Some(speak);
        }
    }
}

/// Top-level TOML overlay schema; every field optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    oracle: OracleFileConfig,

    #[serde(default)]
    stt: SttFileConfig,

    #[serde(default)]
    tts: TtsFileConfig,

    #[serde(default)]
    pipeline: PipelineFileConfig,
}

#[derive(Debug, Default, Deserialize)]
struct OracleFileConfig {
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SttFileConfig {
    primary_locale: Option<String>,
    fallback_locale: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TtsFileConfig {
    voices: Option<HashMap<String, String>>,
    default_voice: Option<String>,
    chunk_chars: Option<usize>,
    endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineFileConfig {
    speak_errors: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locales_and_chunking() {
        let config = Config::default();
        assert_eq!(config.stt.primary_locale, "ar-EG");
        assert_eq!(config.stt.fallback_locale, "en-US");
        assert_eq!(config.tts.chunk_chars, 200);
        assert_eq!(config.tts.voices.get("ar").map(String::as_str), Some("ar"));
    }

    #[test]
    fn overlay_is_partial() {
        let overlay: ConfigFile = toml::from_str(
            r#"
            [stt]
            primary_locale = "ar-SA"

            [pipeline]
            speak_errors = true
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_overlay(overlay);

        assert_eq!(config.stt.primary_locale, "ar-SA");
        // Untouched fields keep their defaults
        assert_eq!(config.stt.fallback_locale, "en-US");
        assert_eq!(config.speak_errors, Some(true));
    }
}
