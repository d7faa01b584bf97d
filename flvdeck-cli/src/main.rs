//! Flvdeck CLI - Command-line interface
//!
//! Provides command-line access to the player and overlay controllers.

mod commands;
mod console;

use std::path::PathBuf;

use clap::Parser;
use flvdeck_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "flvdeck")]
#[command(about = "Control deck for an FLV live stream and its OSD transcoder")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,
    /// Directory receiving the full trace of the last run
    #[arg(long)]
    logs_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    if let Err(e) = commands::handle_command(cli.command).await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
