//! Domain-restricted answer oracle
//!
//! Wraps the external language model behind a trait seam and layers the
//! plant-domain policy on top: prompt construction, empty-input
//! short-circuit, and classification of every outcome into a user-facing
//! answer. The policy layer never returns an error; failures become apology
//! strings flagged with `error = true`.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};

use crate::config::OracleConfig;
use crate::{Error, Result};

/// User-facing text when there is no question to answer
pub const MSG_NO_INPUT: &str = "لا يمكنني الحصول على المعلومات الآن";

/// User-facing text when the model reply carried no extractable answer
pub const MSG_MALFORMED: &str = "حدث خطأ في النظام. يرجى المحاولة لاحقاً";

/// User-facing text when the expert service could not be reached
pub const MSG_UNAVAILABLE: &str = "خدمة الخبراء غير متوفرة حالياً";

/// Reply from the oracle engine
///
/// `text` is the extractable answer; `None` means the service replied but
/// the reply carried no usable text.
#[derive(Debug, Clone)]
pub struct OracleReply {
    /// Extractable answer text, when present
    pub text: Option<String>,
}

/// Oracle engine seam
#[async_trait]
pub trait OracleEngine: Send + Sync {
    /// Submit a prompt and return the reply
    ///
    /// # Errors
    ///
    /// Returns error on transport or quota failure.
    async fn complete(&self, prompt: &str) -> Result<OracleReply>;
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini `generateContent` backend
pub struct GeminiOracle {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiOracle {
    /// Create an oracle backend from configuration
    #[must_use]
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl OracleEngine for GeminiOracle {
    async fn complete(&self, prompt: &str) -> Result<OracleReply> {
        let Some(key) = self.api_key.as_ref() else {
            return Err(Error::Oracle("no API key configured".to_string()));
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint,
            self.model,
            key.expose_secret()
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }],
            }],
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "querying oracle");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "oracle API error");
            return Err(Error::Oracle(format!("oracle API error {status}: {body}")));
        }

        let result: GenerateResponse = response.json().await?;

        // Concatenate the first candidate's text parts; an answerless reply
        // is a valid response shape, not a transport failure
        let text = result.candidates.first().and_then(|candidate| {
            let parts = candidate.content.as_ref()?;
            let answer: String = parts
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            if answer.is_empty() { None } else { Some(answer) }
        });

        Ok(OracleReply { text })
    }
}

/// A classified answer: either domain advice or a flagged apology message
#[derive(Debug, Clone)]
pub struct Answer {
    /// Answer text, or a user-facing status message when `error` is set
    pub text: String,

    /// True when `text` is an apology/status message, not a domain answer
    pub error: bool,
}

/// Plant-domain policy over an oracle engine
pub struct AnswerOracle {
    engine: Arc<dyn OracleEngine>,
}

impl AnswerOracle {
    /// Create the policy layer over `engine`
    #[must_use]
    pub fn new(engine: Arc<dyn OracleEngine>) -> Self {
        Self { engine }
    }

    /// Answer a user question
    ///
    /// Empty or absent input short-circuits without touching the engine.
    /// A single engine call, no retries; every failure mode collapses to a
    /// flagged message string.
    pub async fn answer(&self, text: Option<&str>) -> Answer {
        let Some(question) = text.filter(|t| !t.is_empty()) else {
            return Answer {
                text: MSG_NO_INPUT.to_string(),
                error: true,
            };
        };

        let lang = crate::language::detect_or(question, "ar");
        tracing::debug!(lang, chars = question.chars().count(), "answering question");

        match self.engine.complete(&build_prompt(question)).await {
            Ok(OracleReply { text: Some(answer) }) => {
                tracing::info!(chars = answer.chars().count(), "oracle answered");
                Answer {
                    text: answer,
                    error: false,
                }
            }
            Ok(OracleReply { text: None }) => {
                tracing::warn!("oracle reply carried no extractable text");
                Answer {
                    text: MSG_MALFORMED.to_string(),
                    error: true,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "oracle unavailable");
                Answer {
                    text: MSG_UNAVAILABLE.to_string(),
                    error: true,
                }
            }
        }
    }
}

/// Build the domain-constrained prompt around the user's literal question
fn build_prompt(question: &str) -> String {
    format!(
        "You are a plant expert. Answer concisely in the same language as the question. \
         If not plant-related, say 'أسئلة النباتات فقط' in Arabic or 'Plant questions only' \
         in English.\n\nQuestion: {question}"
    )
}
