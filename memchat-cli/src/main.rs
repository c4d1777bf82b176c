use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod core;
mod models;

use crate::core::{
    config::{Overrides, Settings},
    gateway::OpenAiGateway,
    repl::run_chat,
};
use memchat_core::{CallLog, JsonFileStore, LanguageModelGateway, LoggingGateway, MemoryChat};

#[derive(Parser)]
#[command(name = "memchat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat assistant with persistent long-term memory", long_about = None)]
struct Cli {
    /// Extra configuration file, layered over config/default and config/local
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Memory file location (overrides memory.file)
    #[arg(short, long)]
    memory_file: Option<PathBuf>,

    /// Model identifier (overrides llm.model)
    #[arg(long)]
    model: Option<String>,
}

impl Cli {
    fn overrides(self) -> Overrides {
        Overrides {
            config_file: self.config,
            memory_file: self.memory_file,
            model: self.model,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::new(&cli.overrides()).context("Failed to load configuration")?;

    let http = OpenAiGateway::new(&settings.llm).context("Failed to create model gateway")?;
    info!("Using model {} at {}", settings.llm.model, http.endpoint());

    // Call log is optional; both variants go behind the same trait object
    let gateway: Box<dyn LanguageModelGateway> = match settings.log.path() {
        Some(path) => {
            info!("Writing call log to {}", path.display());
            Box::new(LoggingGateway::new(http, CallLog::new(path)))
        },
        None => Box::new(http),
    };

    let store = JsonFileStore::new(&settings.memory.file);
    let mut chat = MemoryChat::open(gateway, store, settings.chat_options())
        .await
        .with_context(|| {
            format!(
                "Failed to load memories from {}",
                settings.memory.file.display()
            )
        })?;

    info!(
        "Session uses model {} with a {}-message window, memories at {}",
        chat.options().model.model,
        chat.options().context_window,
        chat.store().path().display()
    );

    println!(
        "memchat: {} memories loaded. Type exit, quit or q to leave.",
        chat.memories().len()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let turns = run_chat(&mut chat, stdin, &mut stdout).await?;

    info!("Session ended after {} turns", turns);
    Ok(())
}
