use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

const LOG_FILE_VAR: &str = "MOUNTAINWATCH_LOG_FILE";

#[derive(Parser)]
#[command(name = "mountainwatch")]
#[command(
    about = "Watches Outdooractive conditions and notifies on new records and status changes",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store new conditions, detect status changes and notify (default)
    Run,
    /// List stored conditions ordered by start date
    List,
    /// Fetch one condition and notify about it, even if already processed
    Process {
        /// Outdooractive id of the condition
        id: String,
    },
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var_os(LOG_FILE_VAR).filter(|path| !path.is_empty()) {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        },
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run_watch().await?,
        Commands::List => commands::list::run_list()?,
        Commands::Process { id } => commands::run::run_process(&id).await?,
    }

    Ok(())
}
