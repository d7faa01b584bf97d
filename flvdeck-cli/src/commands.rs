//! CLI command implementations

use std::sync::Arc;

use clap::Subcommand;
use flvdeck_core::config::{DeckConfig, PlayerDefaults};
use flvdeck_core::osd::{OsdSessionController, OverlayConfig, PushOutcome};
use flvdeck_core::{DeckError, HttpOsdClient, OsdClient, PlaybackConfig, Result};

use crate::console;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the source descriptor built from raw URL input
    Source {
        /// URL as typed, with or without http://
        input: String,
        /// Seekable VOD instead of live
        #[arg(long)]
        vod: bool,
        /// Stream carries no video track
        #[arg(long)]
        no_video: bool,
        /// Stream carries no audio track
        #[arg(long)]
        no_audio: bool,
    },
    /// Push an overlay filter graph to the transcoder
    SetOsd {
        /// Filter expression, repeat in pipeline order
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Switch the transcoder to the plain passthrough pipeline
        #[arg(long)]
        disabled: bool,
        /// Overlay service base URL
        #[arg(long)]
        osd_url: Option<String>,
    },
    /// End the transcoder's overlay session
    Close {
        /// Overlay service base URL
        #[arg(long)]
        osd_url: Option<String>,
    },
    /// Drive a control deck from stdin with a dry-run player
    Console {
        /// Name of the video surface to bind
        #[arg(long, default_value = "monitor")]
        surface: String,
        /// Overlay service base URL
        #[arg(long)]
        osd_url: Option<String>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Source {
            input,
            vod,
            no_video,
            no_audio,
        } => show_source(&input, vod, no_video, no_audio),
        Commands::SetOsd {
            filters,
            disabled,
            osd_url,
        } => set_osd(filters, disabled, osd_url).await,
        Commands::Close { osd_url } => close_session(osd_url).await,
        Commands::Console { surface, osd_url } => {
            console::run_console(deck_config(osd_url), surface).await
        }
    }
}

fn deck_config(osd_url: Option<String>) -> DeckConfig {
    let config = DeckConfig::from_env();
    match osd_url {
        Some(url) => config.with_osd_base_url(url),
        None => config,
    }
}

/// Print the normalized source descriptor as JSON
///
/// # Errors
/// - `DeckError::Configuration` - Input does not form a valid http(s) URL
pub fn show_source(input: &str, vod: bool, no_video: bool, no_audio: bool) -> Result<()> {
    let config = PlaybackConfig::from_defaults(PlayerDefaults {
        is_live: !vod,
        has_video: !no_video,
        has_audio: !no_audio,
    })
    .with_source_input(input);
    config.validate()?;

    let json = serde_json::to_string_pretty(&config.source_descriptor()).map_err(|e| {
        DeckError::Configuration {
            reason: format!("source descriptor not serializable: {e}"),
        }
    })?;
    println!("{json}");

    Ok(())
}

/// Push one overlay configuration
///
/// # Errors
/// - `DeckError::Osd` - Service unreachable or request rejected
pub async fn set_osd(filters: Vec<String>, disabled: bool, osd_url: Option<String>) -> Result<()> {
    let config = deck_config(osd_url);
    let client = HttpOsdClient::new(&config.osd)?;
    let (session, _notifications) = OsdSessionController::new(Arc::new(client));

    let overlay = OverlayConfig::new(!disabled, filters);
    println!("Pushing filter graph: {:?}", overlay.effective_filters());

    match session.push(&overlay).await? {
        PushOutcome::Applied {
            pipeline,
            acknowledgement,
            ..
        } => {
            println!("{pipeline} started");
            if !acknowledgement.is_empty() {
                println!("  Service replied: {acknowledgement}");
            }
        }
        PushOutcome::Superseded { seq } => println!("Push {seq} was superseded"),
    }

    Ok(())
}

/// Close the overlay session and wait for the reply
///
/// # Errors
/// - `DeckError::Osd` - Service unreachable or request rejected
pub async fn close_session(osd_url: Option<String>) -> Result<()> {
    let config = deck_config(osd_url);
    let client = HttpOsdClient::new(&config.osd)?;

    let acknowledgement = client.close().await?;
    println!("Overlay session closed");
    if !acknowledgement.is_empty() {
        println!("  Service replied: {acknowledgement}");
    }

    Ok(())
}
