//! Interactive terminal loop
//!
//! The standalone variant of the gateway: prompt for a question, run one
//! pipeline turn, print the answer and speak it aloud. Unlike the HTTP
//! surface this variant speaks every message, apologies included, and
//! refuses to start without the oracle credential.

use dialoguer::Input;

use crate::config::Config;
use crate::pipeline::{ConversationPipeline, ConversationRequest};
use crate::voice::{Speaker, codec};

/// Run the interactive loop until the user types `exit`
///
/// # Errors
///
/// Returns error when `GEMINI_API_KEY` is missing or the terminal prompt
/// fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    if !config.has_api_key() {
        anyhow::bail!("Missing API key. Set GEMINI_API_KEY as an environment variable.");
    }

    let pipeline = ConversationPipeline::from_config(&config, true);

    let speaker = match Speaker::new() {
        Ok(speaker) => Some(speaker),
        Err(e) => {
            tracing::warn!(error = %e, "no audio output, answers will be text-only");
            None
        }
    };

    println!("Flora plant expert. Ask about plants in Arabic or English; type 'exit' to quit.");

    loop {
        let question: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;

        if question.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let outcome = pipeline
            .process(ConversationRequest {
                text: Some(question),
                audio: None,
            })
            .await;

        println!("flora: {}", outcome.response_text);

        if let (Some(speaker), Some(payload)) = (speaker.as_ref(), outcome.audio.as_deref()) {
            speak(speaker, payload);
        }
    }

    println!("مع السلامة");
    Ok(())
}

/// Decode the pipeline's transport audio and play it; playback failures
/// only log — the answer was already printed
fn speak(speaker: &Speaker, payload: &str) {
    match codec::decode_payload(payload) {
        Ok(mp3) => {
            if let Err(e) = speaker.say(&mp3) {
                tracing::warn!(error = %e, "playback failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "synthesized audio undecodable"),
    }
}
