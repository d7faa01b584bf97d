//! Playback configuration and player lifecycle management
//!
//! The decoding engine is an opaque collaborator reached through the
//! [`PlaybackEngine`] and [`PlayerHandle`] traits. [`PlayerController`] owns
//! the single live handle and rebuilds it whenever the configuration or the
//! surface changes, since the engine cannot be reconfigured in place.

pub mod controller;
pub mod dry_run;
pub mod engine;
pub mod test_mocks;

use serde::{Deserialize, Serialize};

pub use controller::{Playback, PlayerController, PlayerState};
pub use dry_run::{DryRunEngine, DryRunHandle};
pub use engine::{PlaybackEngine, PlayerHandle};
pub use test_mocks::{EngineCall, MockSurface, RecordingEngine};

use crate::DeckError;
use crate::config::PlayerDefaults;

/// Media container kind understood by the engine.
///
/// Fixed to FLV; the transcoder only publishes HTTP-FLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Flv,
}

/// What to play and how to play it.
///
/// Value object: every edit produces a new config, which the player
/// controller diffs against the one its handle was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Absolute http(s) URL, absent until the user types one
    pub source_url: Option<String>,
    /// Minimize buffering for live playback instead of seekable VOD
    pub is_live: bool,
    pub has_video: bool,
    pub has_audio: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::from_defaults(PlayerDefaults::default())
    }
}

impl PlaybackConfig {
    /// Creates a config with no source and the given track flags.
    pub fn from_defaults(defaults: PlayerDefaults) -> Self {
        Self {
            source_url: None,
            is_live: defaults.is_live,
            has_video: defaults.has_video,
            has_audio: defaults.has_audio,
        }
    }

    /// Returns a copy whose source is the normalized form of raw user input.
    pub fn with_source_input(&self, raw: &str) -> Self {
        Self {
            source_url: normalize_source_url(raw),
            ..self.clone()
        }
    }

    pub fn with_live(&self, is_live: bool) -> Self {
        Self {
            is_live,
            ..self.clone()
        }
    }

    pub fn with_video(&self, has_video: bool) -> Self {
        Self {
            has_video,
            ..self.clone()
        }
    }

    pub fn with_audio(&self, has_audio: bool) -> Self {
        Self {
            has_audio,
            ..self.clone()
        }
    }

    /// Builds the descriptor handed to the engine's player factory.
    pub fn source_descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            kind: ContainerKind::Flv,
            is_live: self.is_live,
            has_video: self.has_video,
            has_audio: self.has_audio,
            url: self.source_url.clone(),
        }
    }

    /// Confirms a present source URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// - `DeckError::Configuration` - URL does not parse or uses another scheme
    pub fn validate(&self) -> Result<(), DeckError> {
        let Some(source) = &self.source_url else {
            return Ok(());
        };

        let parsed = url::Url::parse(source).map_err(|e| DeckError::Configuration {
            reason: format!("source URL {source:?} is not valid: {e}"),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DeckError::Configuration {
                reason: format!("source URL scheme {scheme:?} is not http or https"),
            }),
        }
    }
}

/// Serialized form of the source handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    #[serde(rename = "type")]
    pub kind: ContainerKind,
    pub is_live: bool,
    pub has_video: bool,
    pub has_audio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Normalizes raw URL field input into a scheme-qualified URL.
///
/// Surrounding whitespace is dropped and blank input means no source. Input
/// already carrying `http://` or `https://` (any ASCII case) is kept as
/// typed; anything else is treated as `host:port/path` and prefixed with
/// `http://`.
///
/// # Examples
/// ```
/// use flvdeck_core::playback::normalize_source_url;
///
/// assert_eq!(
///     normalize_source_url("localhost:9000/live?x=1").as_deref(),
///     Some("http://localhost:9000/live?x=1")
/// );
/// assert_eq!(normalize_source_url("   "), None);
/// ```
pub fn normalize_source_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if has_http_scheme(raw) {
        Some(raw.to_string())
    } else {
        Some(format!("http://{raw}"))
    }
}

fn has_http_scheme(raw: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Errors raised by player lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("video surface is not attached")]
    NoSurface,

    #[error("playback engine does not support this environment")]
    EngineUnsupported,

    #[error("playback engine failed: {reason}")]
    Engine { reason: String },
}
