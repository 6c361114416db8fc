//! Phisdebate CLI - command-line entry point for the chat-message
//! detection pipeline.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use phisdebate_llm::OpenAiCompatProvider;
use phisdebate_triage::Message;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "telephisdebate")]
#[command(about = "Phishing and social-engineering detection pipeline for chat messages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the detection pipeline (library entry point; no built-in
    /// network listener of its own — a chat adapter drives `analyze`).
    Start {
        #[arg(short, long, default_value = "config/phisdebate.toml")]
        config: PathBuf,
    },
    /// Validate a configuration file without starting anything.
    Check {
        #[arg(short, long, default_value = "config/phisdebate.toml")]
        config: PathBuf,
    },
    /// Show build and configuration status.
    Status {
        #[arg(short, long, default_value = "config/phisdebate.toml")]
        config: PathBuf,
    },
    /// Run the pipeline once against a JSON message fixture and print the
    /// resulting `DetectionResult`. The fixture is a single object with
    /// `id`, `sender_id`, `text`, and `sent_at_unix` fields.
    Analyze {
        #[arg(short, long, default_value = "config/phisdebate.toml")]
        config: PathBuf,
        /// Path to the JSON message fixture.
        message: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Start { config }) => {
            let app_config = config::load(&config)?;
            println!("phisdebate pipeline configured against {} ({})", app_config.provider.base_url, app_config.provider.model);
            println!("no built-in network listener; drive Pipeline::analyze from a chat adapter");
        }
        Some(Commands::Check { config }) => {
            config::load(&config)?;
            println!("configuration at {} is valid", config.display());
        }
        Some(Commands::Status { config }) => {
            let app_config = config::load(&config)?;
            print_status(&app_config);
        }
        Some(Commands::Analyze { config, message }) => {
            return run_analyze(&config, &message);
        }
        None => {
            println!("telephisdebate v{} - use --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn print_status(config: &AppConfig) {
    println!("provider: {} @ {}", config.provider.model, config.provider.base_url);
    println!("api key present: {}", config.provider.api_key().is_some());
    println!("mad mode: {:?}", config.pipeline.mad.mode);
    println!("mad max rounds: {}", config.pipeline.mad.orchestrator.max_rounds);
}

fn run_analyze(config_path: &Path, message_path: &Path) -> Result<()> {
    let app_config = config::load(config_path)?;
    let text = std::fs::read_to_string(message_path)
        .with_context(|| format!("reading message fixture at {}", message_path.display()))?;
    let message: Message =
        serde_json::from_str(&text).with_context(|| format!("parsing message fixture at {}", message_path.display()))?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        let provider: Arc<dyn phisdebate_llm::LlmProvider> = Arc::new(OpenAiCompatProvider::new(
            "openai-compat",
            app_config.provider.base_url.clone(),
            app_config.provider.model.clone(),
            app_config.provider.api_key(),
            app_config.provider.timeout(),
        ));
        let pipeline = phisdebate_core::Pipeline::new(app_config.pipeline, provider)
            .context("building detection pipeline")?;
        let sender_id = message.sender_id.clone();
        let result = pipeline.analyze(&message, &sender_id, None).await;
        let output = serde_json::to_string_pretty(&result).context("serializing detection result")?;
        println!("{output}");
        Ok(())
    })
}
