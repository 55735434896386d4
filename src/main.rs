use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use council::config::CouncilConfig;
use council::controller::local::LocalController;
use council::tui::runner::run_tui;

#[derive(Parser)]
#[command(
    name = "council",
    about = "Ask several models at once. They rank each other, a chairman answers."
)]
struct Cli {
    /// Config file (defaults to ~/.council/config.yaml, then .council/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file; the terminal belongs to the TUI
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Delay between council stages, in milliseconds
    #[arg(long)]
    stage_delay_ms: Option<u64>,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("council=info".parse()?);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => CouncilConfig::load_from(path)?,
        None => CouncilConfig::load()?,
    };
    if let Some(delay) = cli.stage_delay_ms {
        config.stage_delay_ms = delay;
    }

    info!(
        members = config.council_models.len(),
        chairman = %config.chairman_model,
        "council starting"
    );

    let tick = Duration::from_millis(config.tick_ms);
    let mut controller = LocalController::new(config);
    run_tui(&mut controller, tick).await
}
