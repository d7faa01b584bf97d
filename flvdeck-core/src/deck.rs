//! Control deck tying user edits and page lifecycle to both controllers.
//!
//! Every edit produces a replacement playback config and overlay config.
//! Each is diffed against the current one: a playback change rebuilds the
//! player, an overlay change issues exactly one push. The two controllers
//! share nothing beyond reacting to the same edit.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::DeckConfig;
use crate::osd::{OsdError, OsdSessionController, OverlayConfig, PushOutcome};
use crate::playback::{PlaybackConfig, PlaybackEngine, PlayerController};
use crate::{DeckError, Result};

/// One user edit from the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckEdit {
    /// Raw URL field text, normalized before use
    SourceUrl(String),
    IsLive(bool),
    HasVideo(bool),
    HasAudio(bool),
    OverlayEnabled(bool),
    Filters(Vec<String>),
}

/// What an edit set in motion.
#[derive(Debug, Default)]
pub struct DeckReaction {
    /// A new player handle was built
    pub player_rebuilt: bool,
    /// The overlay push issued for this edit, if the overlay changed
    pub push: Option<JoinHandle<std::result::Result<PushOutcome, OsdError>>>,
}

/// Owns the player controller and the OSD session for one page.
pub struct ControlDeck<E: PlaybackEngine> {
    player: PlayerController<E>,
    osd: OsdSessionController,
    overlay: OverlayConfig,
    close_grace: Duration,
    torn_down: bool,
}

impl<E: PlaybackEngine> ControlDeck<E> {
    pub fn new(engine: E, osd: OsdSessionController, config: &DeckConfig) -> Self {
        Self {
            player: PlayerController::new(engine, PlaybackConfig::from_defaults(config.player)),
            osd,
            overlay: OverlayConfig::default(),
            close_grace: config.osd.close_grace,
            torn_down: false,
        }
    }

    pub fn player(&self) -> &PlayerController<E> {
        &self.player
    }

    pub fn playback(&self) -> &PlaybackConfig {
        self.player.config()
    }

    pub fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }

    pub fn osd(&self) -> &OsdSessionController {
        &self.osd
    }

    /// Surface became available; binds a player to it.
    ///
    /// # Errors
    ///
    /// - `DeckError::Player` - The engine could not bind a player
    pub fn mount(&mut self, surface: E::Surface) -> Result<()> {
        self.player.set_surface(Some(surface))?;
        Ok(())
    }

    /// Surface went away; the player is destroyed unconditionally.
    pub fn unmount(&mut self) {
        self.player.unmount();
    }

    /// Applies one edit and reacts to whatever it changed.
    ///
    /// The overlay push is issued before the player is rebuilt, so a player
    /// failure never suppresses it. Must be called from within a Tokio
    /// runtime when the edit touches the overlay.
    ///
    /// # Errors
    ///
    /// - `DeckError::Player` - The rebuilt player could not be bound
    pub fn apply(&mut self, edit: DeckEdit) -> Result<DeckReaction> {
        let playback = self.player.config();
        let (next_playback, next_overlay) = match edit {
            DeckEdit::SourceUrl(raw) => (playback.with_source_input(&raw), self.overlay.clone()),
            DeckEdit::IsLive(v) => (playback.with_live(v), self.overlay.clone()),
            DeckEdit::HasVideo(v) => (playback.with_video(v), self.overlay.clone()),
            DeckEdit::HasAudio(v) => (playback.with_audio(v), self.overlay.clone()),
            DeckEdit::OverlayEnabled(v) => (playback.clone(), self.overlay.with_enabled(v)),
            DeckEdit::Filters(filters) => (playback.clone(), self.overlay.with_filters(filters)),
        };

        let mut reaction = DeckReaction::default();

        if next_overlay != self.overlay {
            self.overlay = next_overlay;
            reaction.push = Some(self.osd.spawn_push(&self.overlay));
        }

        reaction.player_rebuilt = self.player.reconfigure(next_playback)?;
        Ok(reaction)
    }

    /// Load button.
    ///
    /// # Errors
    ///
    /// - `DeckError::Player` - No surface to bind a player to
    pub fn load(&mut self) -> Result<()> {
        self.player.load().map_err(DeckError::from)
    }

    /// Play button.
    pub fn play(&mut self) {
        self.player.play();
    }

    /// Pause button.
    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// Stop button: releases the player but keeps the surface.
    pub fn stop(&mut self) {
        self.player.destroy();
    }

    /// Page teardown.
    ///
    /// Destroys the player and issues the session close exactly once. The
    /// close is given at most the configured grace period to leave; it keeps
    /// running detached if it has not finished by then.
    pub async fn teardown(&mut self) {
        if self.torn_down {
            debug!("Deck already torn down");
            return;
        }
        self.torn_down = true;

        self.player.unmount();

        let Some(close) = self.osd.close() else {
            return;
        };
        match tokio::time::timeout(self.close_grace, close).await {
            Ok(_) => info!("Deck torn down"),
            Err(_) => debug!(
                grace_ms = self.close_grace.as_millis() as u64,
                "Close request still in flight at teardown"
            ),
        }
    }
}
