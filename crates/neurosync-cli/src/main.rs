use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt};

use neurosync_application::FlowController;
use neurosync_core::StudyGenerator;
use neurosync_interaction::{GeminiStudyGenerator, LoadedConfig, default_config_dir, load_config};

mod command;
mod helper;
mod repl;

#[derive(Parser)]
#[command(name = "neurosync")]
#[command(about = "NeuroSync - turn study material into an interactive study session", long_about = None)]
struct Cli {
    /// Study material to load on startup (.pdf, .md or .txt)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Gemini model name, overriding config.toml and secret.json
    #[arg(short, long)]
    model: Option<String>,

    /// Directory holding secret.json and config.toml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    let LoadedConfig {
        credential,
        mut settings,
    } = load_config(&config_dir)?;
    if let Some(model) = cli.model {
        settings.model = model;
    }
    tracing::info!(config_dir = %config_dir.display(), model = %settings.model, "starting neurosync");

    let flow = FlowController::boot(credential, |credential| {
        let generator = GeminiStudyGenerator::new(credential, &settings)?;
        Ok(Arc::new(generator) as Arc<dyn StudyGenerator>)
    });
    if let Some(message) = flow.config_error() {
        eprintln!("{}", "Configuration error".red().bold());
        eprintln!("{}", message.red());
        anyhow::bail!("cannot start without a valid API key");
    }

    let mut repl = repl::Repl::new(flow);
    if let Some(path) = cli.file {
        repl.load_file(&path);
    }
    repl.run().await
}
