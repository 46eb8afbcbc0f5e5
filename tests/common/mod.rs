//! Shared test utilities
//!
//! Mock engines for the three external services, plus a pipeline builder
//! wiring them behind the production policy layers.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flora_gateway::oracle::{AnswerOracle, OracleEngine, OracleReply};
use flora_gateway::voice::stt::{SttEngine, SttEngineError};
use flora_gateway::voice::tts::TtsEngine;
use flora_gateway::voice::{SpeechRecognizer, SpeechSynthesizer};
use flora_gateway::{Config, ConversationPipeline};

/// Scripted recognition behavior
#[derive(Clone)]
pub enum SttBehavior {
    /// Every attempt yields this transcript
    Transcript(String),
    /// Every attempt reports unintelligible speech
    Unintelligible,
    /// Every attempt fails at the service level
    Down,
}

/// Recognition engine double
pub struct MockStt {
    behavior: SttBehavior,
    pub calls: AtomicUsize,
}

impl MockStt {
    pub fn new(behavior: SttBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SttEngine for MockStt {
    async fn recognize(&self, _wav: &Path, _locale: &str) -> Result<String, SttEngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SttBehavior::Transcript(text) => Ok(text.clone()),
            SttBehavior::Unintelligible => Err(SttEngineError::Unintelligible),
            SttBehavior::Down => Err(SttEngineError::Service("mock outage".to_string())),
        }
    }
}

/// Scripted oracle behavior
#[derive(Clone)]
pub enum OracleBehavior {
    /// Reply with this answer text
    Answer(String),
    /// Reply without extractable text
    Empty,
    /// Fail at the transport level
    Unavailable,
}

/// Oracle engine double recording every prompt
pub struct MockOracle {
    behavior: OracleBehavior,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl MockOracle {
    pub fn new(behavior: OracleBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl OracleEngine for MockOracle {
    async fn complete(&self, prompt: &str) -> flora_gateway::Result<OracleReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.behavior {
            OracleBehavior::Answer(text) => Ok(OracleReply {
                text: Some(text.clone()),
            }),
            OracleBehavior::Empty => Ok(OracleReply { text: None }),
            OracleBehavior::Unavailable => Err(flora_gateway::Error::Oracle(
                "mock outage".to_string(),
            )),
        }
    }
}

/// Synthesis engine double echoing its input as "audio"
pub struct MockTts {
    pub calls: AtomicUsize,
}

impl MockTts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsEngine for MockTts {
    async fn synthesize(&self, text: &str, _voice: &str) -> flora_gateway::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text.as_bytes().to_vec())
    }
}

/// Wire mock engines behind the production policy layers
pub fn build_pipeline(
    stt: Arc<MockStt>,
    oracle: Arc<MockOracle>,
    tts: Arc<MockTts>,
    speak_errors: bool,
) -> ConversationPipeline {
    let config = Config::default();
    ConversationPipeline::new(
        SpeechRecognizer::new(stt, &config.stt),
        AnswerOracle::new(oracle),
        SpeechSynthesizer::new(tts, &config.tts),
        speak_errors,
    )
}
