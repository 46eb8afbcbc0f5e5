//! Speech-to-text processing
//!
//! A recognition engine behind a trait seam, plus the locale-fallback policy
//! layered on top. The policy layer never returns an error: inaudible speech
//! and service failures both collapse to user-facing message strings that
//! flow through the rest of the pipeline like any recognized text.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::SttConfig;

/// User-facing text when speech was heard but not understood
pub const MSG_UNCLEAR: &str = "الصوت غير واضح، حاول مرة أخرى.";

/// User-facing text when recognition itself failed
pub const MSG_PROCESSING_FAILED: &str = "حدث خطأ أثناء معالجة الصوت.";

/// How a single recognition attempt failed
#[derive(Debug, Clone)]
pub enum SttEngineError {
    /// The engine processed the audio but could not make out speech
    Unintelligible,

    /// Transport or protocol failure talking to the engine
    Service(String),
}

impl std::fmt::Display for SttEngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unintelligible => write!(f, "speech unintelligible"),
            Self::Service(msg) => write!(f, "service failure: {msg}"),
        }
    }
}

/// Recognition engine seam
///
/// The engine reads the waveform from a scratch file; the caller owns the
/// file's lifetime and guarantees cleanup.
#[async_trait]
pub trait SttEngine: Send + Sync {
    /// Recognize speech in `wav` using the given BCP-47 locale
    async fn recognize(&self, wav: &Path, locale: &str) -> Result<String, SttEngineError>;
}

/// Response from the speech recognition API
#[derive(serde::Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(serde::Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(serde::Deserialize)]
struct SpeechAlternative {
    transcript: String,
}

/// Google speech recognition backend
pub struct GoogleSpeech {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleSpeech {
    /// Create a recognition backend against the configured endpoint
    #[must_use]
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl SttEngine for GoogleSpeech {
    async fn recognize(&self, wav: &Path, locale: &str) -> Result<String, SttEngineError> {
        let audio = tokio::fs::read(wav)
            .await
            .map_err(|e| SttEngineError::Service(e.to_string()))?;

        tracing::debug!(audio_bytes = audio.len(), locale, "starting recognition");

        let body = serde_json::json!({
            "config": {
                "languageCode": locale,
                "encoding": "LINEAR16",
            },
            "audio": {
                "content": STANDARD.encode(&audio),
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SttEngineError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "speech API error");
            return Err(SttEngineError::Service(format!(
                "speech API error {status}: {body}"
            )));
        }

        let result: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| SttEngineError::Service(e.to_string()))?;

        // An empty result set is the engine's "could not understand audio"
        let transcript = result
            .results
            .first()
            .and_then(|r| r.alternatives.first())
            .map(|a| a.transcript.clone())
            .ok_or(SttEngineError::Unintelligible)?;

        if transcript.is_empty() {
            return Err(SttEngineError::Unintelligible);
        }

        tracing::info!(transcript = %transcript, locale, "recognition complete");
        Ok(transcript)
    }
}

/// Which locale produced the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleHint {
    /// Recognized with the primary locale
    Primary,
    /// Recognized with the fallback locale
    Secondary,
    /// Not recognized; the text is a fallback message
    None,
}

/// Outcome of one recognition pass. Always text, never an error.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Recognized transcript, or a user-facing fallback message
    pub text: String,

    /// Which locale produced the transcript, if any
    pub hint: LocaleHint,
}

/// Locale-fallback recognition policy
///
/// Attempts the primary locale first. Inaudible speech is a valid negative
/// outcome and short-circuits to a soft-failure message; only a service
/// failure triggers the fallback locale.
pub struct SpeechRecognizer {
    engine: Arc<dyn SttEngine>,
    primary_locale: String,
    fallback_locale: String,
}

impl SpeechRecognizer {
    /// Create a recognizer over `engine` with the configured locales
    #[must_use]
    pub fn new(engine: Arc<dyn SttEngine>, config: &SttConfig) -> Self {
        Self {
            engine,
            primary_locale: config.primary_locale.clone(),
            fallback_locale: config.fallback_locale.clone(),
        }
    }

    /// Recognize speech from raw waveform bytes
    ///
    /// The bytes are spooled through a scratch file for the engine call;
    /// the file is removed on every exit path.
    pub async fn recognize(&self, audio: &[u8]) -> Recognition {
        let wav = match spool(audio) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(error = %e, "failed to spool audio for recognition");
                return Recognition {
                    text: MSG_PROCESSING_FAILED.to_string(),
                    hint: LocaleHint::None,
                };
            }
        };

        match self.engine.recognize(wav.path(), &self.primary_locale).await {
            Ok(text) => Recognition {
                text,
                hint: LocaleHint::Primary,
            },
            Err(SttEngineError::Unintelligible) => {
                tracing::info!(locale = %self.primary_locale, "speech unintelligible");
                Recognition {
                    text: MSG_UNCLEAR.to_string(),
                    hint: LocaleHint::None,
                }
            }
            Err(SttEngineError::Service(err)) => {
                tracing::warn!(
                    error = %err,
                    locale = %self.primary_locale,
                    "recognition failed, retrying with fallback locale"
                );

                match self.engine.recognize(wav.path(), &self.fallback_locale).await {
                    Ok(text) => Recognition {
                        text,
                        hint: LocaleHint::Secondary,
                    },
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            locale = %self.fallback_locale,
                            "recognition failed in both locales"
                        );
                        Recognition {
                            text: MSG_PROCESSING_FAILED.to_string(),
                            hint: LocaleHint::None,
                        }
                    }
                }
            }
        }
    }
}

/// Write waveform bytes to a scratch file removed on drop
fn spool(audio: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".wav").tempfile()?;
    file.write_all(audio)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;

    /// Engine double that replays scripted outcomes and records call details
    struct ScriptedEngine {
        script: Mutex<Vec<Result<String, SttEngineError>>>,
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    impl ScriptedEngine {
        fn new(script: Vec<Result<String, SttEngineError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SttEngine for ScriptedEngine {
        async fn recognize(&self, wav: &Path, locale: &str) -> Result<String, SttEngineError> {
            self.calls
                .lock()
                .unwrap()
                .push((wav.to_path_buf(), locale.to_string()));
            self.script.lock().unwrap().remove(0)
        }
    }

    fn recognizer(engine: Arc<ScriptedEngine>) -> SpeechRecognizer {
        SpeechRecognizer::new(engine, &crate::config::Config::default().stt)
    }

    #[tokio::test]
    async fn primary_success_carries_primary_hint() {
        let engine = Arc::new(ScriptedEngine::new(vec![Ok("مرحبا".to_string())]));
        let result = recognizer(Arc::clone(&engine)).recognize(b"wav").await;

        assert_eq!(result.text, "مرحبا");
        assert_eq!(result.hint, LocaleHint::Primary);

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "ar-EG");
    }

    #[tokio::test]
    async fn unintelligible_short_circuits_without_fallback() {
        let engine = Arc::new(ScriptedEngine::new(vec![Err(
            SttEngineError::Unintelligible,
        )]));
        let result = recognizer(Arc::clone(&engine)).recognize(b"wav").await;

        assert_eq!(result.text, MSG_UNCLEAR);
        assert_eq!(result.hint, LocaleHint::None);
        // The fallback locale must NOT be attempted for a soft failure
        assert_eq!(engine.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn service_failure_retries_with_fallback_locale() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Err(SttEngineError::Service("boom".to_string())),
            Ok("hello".to_string()),
        ]));
        let result = recognizer(Arc::clone(&engine)).recognize(b"wav").await;

        assert_eq!(result.text, "hello");
        assert_eq!(result.hint, LocaleHint::Secondary);

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, "ar-EG");
        assert_eq!(calls[1].1, "en-US");
    }

    #[tokio::test]
    async fn exhausted_attempts_yield_processing_failure_text() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Err(SttEngineError::Service("down".to_string())),
            Err(SttEngineError::Unintelligible),
        ]));
        let result = recognizer(engine).recognize(b"wav").await;

        assert_eq!(result.text, MSG_PROCESSING_FAILED);
        assert_eq!(result.hint, LocaleHint::None);
    }

    #[tokio::test]
    async fn scratch_file_is_removed_after_recognition() {
        let engine = Arc::new(ScriptedEngine::new(vec![Err(
            SttEngineError::Unintelligible,
        )]));
        let _ = recognizer(Arc::clone(&engine)).recognize(b"wav").await;

        let calls = engine.calls.lock().unwrap();
        assert!(!calls[0].0.exists(), "scratch file must be cleaned up");
    }

    #[test]
    fn spooled_bytes_round_trip() {
        let file = spool(b"RIFF....WAVE").unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"RIFF....WAVE");
    }
}
