//! The conversation pipeline
//!
//! One request/response cycle: decode audio if present, recognize speech,
//! answer through the plant oracle, synthesize the reply, assemble the
//! response. Every sub-call failure degrades to a textual message; the
//! pipeline itself never fails.

use std::sync::Arc;

use crate::config::Config;
use crate::language;
use crate::oracle::{AnswerOracle, GeminiOracle};
use crate::voice::codec;
use crate::voice::stt::{GoogleSpeech, SpeechRecognizer};
use crate::voice::tts::{SpeechSynthesizer, TTS_MIME, TranslateTts};

/// One inbound conversation turn
#[derive(Debug, Clone, Default)]
pub struct ConversationRequest {
    /// Typed text, if any
    pub text: Option<String>,

    /// Encoded audio payload, optionally data-URI prefixed
    pub audio: Option<String>,
}

/// The assembled outcome of one turn
#[derive(Debug, Clone)]
pub struct ConversationResponse {
    /// Text actually used as the question: recognized speech when audio was
    /// supplied and recognizable, the typed text otherwise, absent when
    /// neither produced anything
    pub user_message: Option<String>,

    /// Answer text, or a flagged status message
    pub response_text: String,

    /// True when `response_text` is an apology/status message
    pub error: bool,

    /// Synthesized answer as a `data:audio/mp3;base64,` payload, when spoken
    pub audio: Option<String>,

    /// The original inbound audio payload, echoed unchanged
    pub echoed_user_audio: Option<String>,
}

/// Orchestrates recognizer, oracle and synthesizer for single turns
pub struct ConversationPipeline {
    recognizer: SpeechRecognizer,
    oracle: AnswerOracle,
    synthesizer: SpeechSynthesizer,
    speak_errors: bool,
}

impl ConversationPipeline {
    /// Assemble a pipeline from already-built policy components
    #[must_use]
    pub const fn new(
        recognizer: SpeechRecognizer,
        oracle: AnswerOracle,
        synthesizer: SpeechSynthesizer,
        speak_errors: bool,
    ) -> Self {
        Self {
            recognizer,
            oracle,
            synthesizer,
            speak_errors,
        }
    }

    /// Build a pipeline with the production engines.
    ///
    /// `speak_errors` defaults per entry point (false for the HTTP gateway,
    /// true for the interactive loop); a config override wins over either.
    #[must_use]
    pub fn from_config(config: &Config, speak_errors: bool) -> Self {
        let recognizer = SpeechRecognizer::new(
            Arc::new(GoogleSpeech::new(config.stt.endpoint.clone())),
            &config.stt,
        );
        let oracle = AnswerOracle::new(Arc::new(GeminiOracle::new(&config.oracle)));
        let synthesizer = SpeechSynthesizer::new(
            Arc::new(TranslateTts::new(config.tts.endpoint.clone())),
            &config.tts,
        );

        Self::new(
            recognizer,
            oracle,
            synthesizer,
            config.speak_errors.unwrap_or(speak_errors),
        )
    }

    /// Process one conversation turn
    ///
    /// Never returns an error: every stage degrades per its contract and the
    /// response is always well-formed.
    pub async fn process(&self, request: ConversationRequest) -> ConversationResponse {
        let mut user_text = request.text;

        // Audio takes precedence over simultaneously-supplied text
        if let Some(payload) = request.audio.as_deref() {
            match codec::decode_payload(payload) {
                Ok(waveform) => {
                    let recognition = self.recognizer.recognize(&waveform).await;
                    if !recognition.text.is_empty() {
                        user_text = Some(recognition.text);
                    }
                }
                Err(e) => {
                    // Undecodable audio means "no audio": fall back to any
                    // typed text rather than failing the request
                    tracing::warn!(error = %e, "audio payload undecodable, using typed text");
                }
            }
        }

        let answer = self.oracle.answer(user_text.as_deref()).await;

        let audio = if answer.error && !self.speak_errors {
            tracing::debug!("error answer, synthesis suppressed");
            None
        } else {
            let lang = language::detect_or(&answer.text, "en");
            self.synthesizer
                .synthesize(&answer.text, lang)
                .await
                .map(|bytes| codec::encode_payload(&bytes, TTS_MIME))
        };

        ConversationResponse {
            user_message: user_text,
            response_text: answer.text,
            error: answer.error,
            audio,
            echoed_user_audio: request.audio,
        }
    }
}
