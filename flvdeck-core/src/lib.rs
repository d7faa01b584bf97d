//! Flvdeck Core - Player lifecycle and remote OSD session control
//!
//! This crate provides the two controllers behind the Flvdeck control surface:
//! the player controller that keeps exactly one playback handle bound to a
//! video surface, and the OSD session controller that keeps the remote
//! transcoder's overlay filter graph in step with local settings. The
//! control deck ties both to user edits and page-lifecycle events.

pub mod config;
pub mod deck;
pub mod osd;
pub mod playback;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::DeckConfig;
pub use deck::{ControlDeck, DeckEdit, DeckReaction};
pub use osd::{HttpOsdClient, Notification, OsdClient, OsdError, OsdSessionController};
pub use playback::{PlaybackConfig, PlaybackEngine, PlayerController, PlayerError, PlayerHandle};

/// Errors that can bubble up from any Flvdeck subsystem.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    #[error("OSD error: {0}")]
    Osd(#[from] OsdError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeckError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            DeckError::Player(e) => match e {
                PlayerError::NoSurface => "The video surface is not ready yet".to_string(),
                PlayerError::EngineUnsupported => {
                    "Live FLV playback is not supported here".to_string()
                }
                PlayerError::Engine { .. } => "Playback engine error occurred".to_string(),
            },
            DeckError::Osd(e) => match e {
                OsdError::RemoteUnreachable { endpoint, .. } => {
                    format!("Could not reach the overlay service at {endpoint}")
                }
                OsdError::RemoteRejected { status, .. } => {
                    format!("The overlay service refused the request (HTTP {status})")
                }
                OsdError::InvalidEndpoint(_) => "Overlay service address is invalid".to_string(),
                OsdError::ClientSetup { .. } => "Could not set up the HTTP client".to_string(),
            },
            DeckError::Configuration { reason } => format!("Invalid setting: {reason}"),
            DeckError::Io(_) => "I/O error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DeckError::Configuration { .. } | DeckError::Osd(OsdError::InvalidEndpoint(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_missing_surface() {
        let error = DeckError::from(PlayerError::NoSurface);
        assert_eq!(error.user_message(), "The video surface is not ready yet");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_configuration_errors_are_user_errors() {
        let error = DeckError::Configuration {
            reason: "bad url".to_string(),
        };
        assert!(error.is_user_error());
        assert_eq!(error.user_message(), "Invalid setting: bad url");
    }

    #[test]
    fn test_rejected_push_message_carries_status() {
        let error = DeckError::from(OsdError::RemoteRejected {
            status: 500,
            body: "ffmpeg exited".to_string(),
        });
        assert!(error.user_message().contains("HTTP 500"));
    }
}
