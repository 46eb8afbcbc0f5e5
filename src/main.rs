use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flora_gateway::api::{self, ApiState};
use flora_gateway::voice::{Speaker, SpeechSynthesizer, TranslateTts};
use flora_gateway::{Config, ConversationPipeline, language, repl};

/// Flora - voice question-answering gateway for plant care
#[derive(Parser)]
#[command(name = "flora", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "FLORA_PORT", default_value = "5001")]
    port: u16,

    /// Path to a TOML config overlay
    #[arg(long, env = "FLORA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of static web assets (embedded page when omitted)
    #[arg(long, env = "FLORA_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal loop (speaks every answer, apologies included)
    Repl,

    /// Synthesize a sample utterance and play it
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! I am the plant expert.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,flora_gateway=info",
        1 => "info,flora_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Repl => repl::run(config).await,
            Command::Say { text } => say(&config, &text).await,
        };
    }

    // The HTTP gateway serves without the credential, degraded: every oracle
    // call classifies as service-unavailable until the key is provided
    if !config.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; expert answers will be unavailable");
    }

    tracing::info!(port = cli.port, "starting flora gateway");

    let pipeline = ConversationPipeline::from_config(&config, false);
    let state = Arc::new(ApiState { pipeline });

    api::serve(state, cli.static_dir, cli.port).await?;

    Ok(())
}

/// Synthesize a sample utterance and play it
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let synthesizer = SpeechSynthesizer::new(
        Arc::new(TranslateTts::new(config.tts.endpoint.clone())),
        &config.tts,
    );

    let lang = language::detect_or(text, "en");
    println!("Synthesizing \"{text}\" ({lang})...");

    let Some(mp3) = synthesizer.synthesize(text, lang).await else {
        anyhow::bail!("synthesis failed");
    };
    println!("Got {} bytes of audio data", mp3.len());

    println!("Playing audio...");
    let speaker = Speaker::new()?;
    speaker.say(&mp3)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
