//! Conversation endpoint
//!
//! `POST /chat` runs one pipeline turn. The response is always HTTP 200;
//! callers distinguish a domain answer from an apology by the `error` flag,
//! not by the transport status.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::pipeline::{ConversationRequest, ConversationResponse};

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

/// Inbound chat body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Typed question
    #[serde(default)]
    pub message: Option<String>,

    /// Recorded question, base64 with optional data-URI header
    #[serde(default)]
    pub audio: Option<String>,
}

/// Outbound chat body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Text the pipeline actually answered (typed or recognized)
    pub user_message: Option<String>,

    /// Answer text, or a flagged status message
    pub response: String,

    /// True when `response` is a status message, not a domain answer
    pub error: bool,

    /// Spoken answer as a `data:audio/mp3;base64,` payload
    pub audio: Option<String>,

    /// The inbound audio payload, echoed unchanged
    pub user_audio: Option<String>,
}

impl From<ConversationResponse> for ChatResponse {
    fn from(outcome: ConversationResponse) -> Self {
        Self {
            user_message: outcome.user_message,
            response: outcome.response_text,
            error: outcome.error,
            audio: outcome.audio,
            user_audio: outcome.echoed_user_audio,
        }
    }
}

/// Run one conversation turn
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let request_id = uuid::Uuid::new_v4();
    tracing::debug!(
        %request_id,
        has_text = request.message.is_some(),
        has_audio = request.audio.is_some(),
        "chat turn started"
    );

    let outcome = state
        .pipeline
        .process(ConversationRequest {
            text: request.message,
            audio: request.audio,
        })
        .await;

    tracing::info!(
        %request_id,
        error = outcome.error,
        spoken = outcome.audio.is_some(),
        "chat turn complete"
    );

    Json(ChatResponse::from(outcome))
}
