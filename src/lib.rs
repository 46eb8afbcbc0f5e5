//! Flora Gateway - voice question-answering for plant care
//!
//! This library provides the core functionality for the flora gateway:
//! - Transport audio codec (base64 / data-URI payloads)
//! - Speech recognition with locale fallback (Arabic first, English second)
//! - Domain-restricted plant-expert oracle
//! - Speech synthesis with per-language voice selection and chunking
//! - The conversation pipeline tying one turn together
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        HTTP (POST /chat)   │   Terminal loop         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Conversation Pipeline                   │
//! │  Codec │ Recognizer │ Detector │ Oracle │ Synthesizer│
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              External services                       │
//! │        STT   │   Gemini oracle   │   TTS            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod language;
pub mod oracle;
pub mod pipeline;
pub mod repl;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use oracle::{Answer, AnswerOracle, OracleEngine, OracleReply};
pub use pipeline::{ConversationPipeline, ConversationRequest, ConversationResponse};
pub use voice::{SpeechRecognizer, SpeechSynthesizer};
