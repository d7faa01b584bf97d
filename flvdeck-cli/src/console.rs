//! Line-oriented control deck on stdin
//!
//! Each line maps to one control on the deck. Overlay confirmations arrive
//! asynchronously and are printed as they come in. EOF or `quit` runs page
//! teardown.

use std::sync::Arc;

use flvdeck_core::osd::OsdSessionController;
use flvdeck_core::playback::DryRunEngine;
use flvdeck_core::{ControlDeck, DeckConfig, DeckEdit, HttpOsdClient, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  url <text>              set the stream URL (blank clears it)
  live|video|audio on|off toggle stream flags
  osd on|off              toggle the overlay
  filters <expr>...       replace the overlay filter list
  load | play | pause | stop
  status | help | quit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Edit(DeckEdit),
    Load,
    Play,
    Pause,
    Stop,
    Status,
    Help,
    Quit,
}

/// Parses one input line.
///
/// # Errors
/// Returns a message describing why the line was not understood
pub fn parse_command(line: &str) -> std::result::Result<ConsoleCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "url" => ConsoleCommand::Edit(DeckEdit::SourceUrl(rest.to_string())),
        "live" => ConsoleCommand::Edit(DeckEdit::IsLive(parse_switch(rest)?)),
        "video" => ConsoleCommand::Edit(DeckEdit::HasVideo(parse_switch(rest)?)),
        "audio" => ConsoleCommand::Edit(DeckEdit::HasAudio(parse_switch(rest)?)),
        "osd" => ConsoleCommand::Edit(DeckEdit::OverlayEnabled(parse_switch(rest)?)),
        "filters" => ConsoleCommand::Edit(DeckEdit::Filters(
            rest.split_whitespace().map(str::to_string).collect(),
        )),
        "load" => ConsoleCommand::Load,
        "play" => ConsoleCommand::Play,
        "pause" => ConsoleCommand::Pause,
        "stop" => ConsoleCommand::Stop,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(command)
}

fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {other:?}")),
    }
}

/// Runs the console until EOF or `quit`.
///
/// # Errors
/// - `DeckError::Osd` - Overlay client could not be built
/// - `DeckError::Io` - Reading stdin failed
pub async fn run_console(config: DeckConfig, surface: String) -> Result<()> {
    let client = HttpOsdClient::new(&config.osd)?;
    let (osd, mut notifications) = OsdSessionController::new(Arc::new(client));
    let mut deck = ControlDeck::new(DryRunEngine::new(), osd, &config);

    deck.mount(surface)?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => println!("* {notification}"),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = execute(&mut deck, command) {
                            println!("! {}", e.user_message());
                        }
                    }
                    Err(message) => println!("! {message}"),
                }
            }
        }
    }

    deck.teardown().await;
    Ok(())
}

fn execute(deck: &mut ControlDeck<DryRunEngine>, command: ConsoleCommand) -> Result<()> {
    match command {
        ConsoleCommand::Edit(edit) => {
            let reaction = deck.apply(edit)?;
            if reaction.player_rebuilt {
                println!("player rebuilt: {}", deck.player().state());
            }
        }
        ConsoleCommand::Load => {
            deck.playback().validate()?;
            deck.load()?;
        }
        ConsoleCommand::Play => deck.play(),
        ConsoleCommand::Pause => deck.pause(),
        ConsoleCommand::Stop => deck.stop(),
        ConsoleCommand::Status => print_status(deck),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn print_status(deck: &ControlDeck<DryRunEngine>) {
    let playback = deck.playback();
    let overlay = deck.overlay();

    println!("player:  {}", deck.player().state());
    println!(
        "source:  {}",
        playback.source_url.as_deref().unwrap_or("(none)")
    );
    println!(
        "flags:   live={} video={} audio={}",
        playback.is_live, playback.has_video, playback.has_audio
    );
    println!(
        "overlay: enabled={} filters={:?} effective={:?}",
        overlay.enabled,
        overlay.filters,
        overlay.effective_filters()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_keeps_raw_text() {
        assert_eq!(
            parse_command("url localhost:9000/live?x=1"),
            Ok(ConsoleCommand::Edit(DeckEdit::SourceUrl(
                "localhost:9000/live?x=1".to_string()
            )))
        );
        assert_eq!(
            parse_command("url"),
            Ok(ConsoleCommand::Edit(DeckEdit::SourceUrl(String::new())))
        );
    }

    #[test]
    fn test_parse_switches() {
        assert_eq!(
            parse_command("audio off"),
            Ok(ConsoleCommand::Edit(DeckEdit::HasAudio(false)))
        );
        assert_eq!(
            parse_command("OSD on"),
            Ok(ConsoleCommand::Edit(DeckEdit::OverlayEnabled(true)))
        );
        assert!(parse_command("live maybe").is_err());
    }

    #[test]
    fn test_parse_filters_keeps_order_and_duplicates() {
        assert_eq!(
            parse_command("filters drawtext=text=live scale=640:360 drawtext=text=live"),
            Ok(ConsoleCommand::Edit(DeckEdit::Filters(vec![
                "drawtext=text=live".to_string(),
                "scale=640:360".to_string(),
                "drawtext=text=live".to_string(),
            ])))
        );
        assert_eq!(
            parse_command("filters"),
            Ok(ConsoleCommand::Edit(DeckEdit::Filters(Vec::new())))
        );
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse_command(" load "), Ok(ConsoleCommand::Load));
        assert_eq!(parse_command("stop"), Ok(ConsoleCommand::Stop));
        assert_eq!(parse_command("exit"), Ok(ConsoleCommand::Quit));
        assert!(parse_command("rewind").is_err());
        assert!(parse_command("   ").is_err());
    }
}
