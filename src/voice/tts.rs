//! Text-to-speech processing
//!
//! A synthesis engine behind a trait seam, plus the voice-selection and
//! chunking policy on top. The engine caps utterance length, so long answers
//! are split into fixed-size character chunks and synthesized sequentially;
//! chunk seams may fall mid-word. Synthesis failures degrade to "no audio",
//! never to a pipeline error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::{Error, Result};

/// MIME type of synthesized audio on the transport
pub const TTS_MIME: &str = "audio/mp3";

/// Synthesis engine seam
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Synthesize `text` with the given engine voice code, returning MP3 bytes
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}

/// Google Translate TTS backend (the gTTS service contract)
pub struct TranslateTts {
    client: reqwest::Client,
    endpoint: String,
}

impl TranslateTts {
    /// Create a synthesis backend against the configured endpoint
    #[must_use]
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl TtsEngine for TranslateTts {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={voice}&q={}",
            self.endpoint,
            urlencoding::encode(text)
        );

        tracing::debug!(chars = text.chars().count(), voice, "starting synthesis");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "TTS API error");
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Voice-selection and chunking policy over a synthesis engine
pub struct SpeechSynthesizer {
    engine: Arc<dyn TtsEngine>,
    voices: HashMap<String, String>,
    default_voice: String,
    chunk_chars: usize,
}

impl SpeechSynthesizer {
    /// Create a synthesizer over `engine` with the configured voice table
    #[must_use]
    pub fn new(engine: Arc<dyn TtsEngine>, config: &TtsConfig) -> Self {
        Self {
            engine,
            voices: config.voices.clone(),
            default_voice: config.default_voice.clone(),
            chunk_chars: config.chunk_chars,
        }
    }

    /// Voice for a language: table entry when registered, engine default otherwise
    fn voice_for(&self, language: &str) -> &str {
        self.voices
            .get(language)
            .map_or(&self.default_voice, String::as_str)
    }

    /// Synthesize `text` spoken in `language`
    ///
    /// Returns `None` when text is empty (synthesis skipped) or when the
    /// engine fails (degrade to text-only); concatenated MP3 bytes otherwise.
    pub async fn synthesize(&self, text: &str, language: &str) -> Option<Vec<u8>> {
        if text.is_empty() {
            tracing::debug!("empty text, synthesis skipped");
            return None;
        }

        let voice = self.voice_for(language);
        let mut audio = Vec::new();

        for chunk in chunk_by_chars(text, self.chunk_chars) {
            match self.engine.synthesize(chunk, voice).await {
                Ok(bytes) => audio.extend(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, voice, "synthesis failed, answer stays text-only");
                    return None;
                }
            }
        }

        tracing::info!(
            bytes = audio.len(),
            chars = text.chars().count(),
            voice,
            "synthesis complete"
        );
        Some(audio)
    }
}

/// Split `text` into slices of at most `limit` characters.
///
/// Boundaries are character boundaries (never inside a code point) but may
/// fall mid-word; the engine's utterance cap is by length, not by phrasing.
fn chunk_by_chars(text: &str, limit: usize) -> Vec<&str> {
    if limit == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (i, _) in text.char_indices() {
        if count == limit {
            chunks.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}
