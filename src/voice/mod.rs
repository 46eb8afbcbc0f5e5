//! Voice processing module
//!
//! Transport audio codec, speech recognition and synthesis policy layers,
//! and local playback for the interactive loop.

pub mod codec;
mod playback;
pub mod stt;
pub mod tts;

pub use playback::Speaker;
pub use stt::{GoogleSpeech, LocaleHint, Recognition, SpeechRecognizer, SttEngine, SttEngineError};
pub use tts::{SpeechSynthesizer, TTS_MIME, TranslateTts, TtsEngine};
