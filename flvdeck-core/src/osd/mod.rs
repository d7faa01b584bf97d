//! Remote on-screen-display control
//!
//! The transcoder composes the overlay server-side from a filter-graph
//! string. This module collapses the local [`OverlayConfig`] into that
//! string, pushes it over HTTP, and closes the remote session on teardown.

pub mod client;
pub mod session;
pub mod test_mocks;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use client::{HttpOsdClient, OsdClient};
pub use session::{OsdSessionController, PushOutcome};
pub use test_mocks::{MockOsdClient, OsdCall};

/// Separator joining filter expressions into one graph description.
pub const FILTER_SEPARATOR: &str = ",";

/// Local overlay settings.
///
/// Filter order is significant and duplicates are kept; the remote pipeline
/// composes them left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub filters: Vec<String>,
}

impl OverlayConfig {
    pub fn new(enabled: bool, filters: Vec<String>) -> Self {
        Self { enabled, filters }
    }

    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self {
            enabled,
            ..self.clone()
        }
    }

    pub fn with_filters(&self, filters: Vec<String>) -> Self {
        Self {
            filters,
            ..self.clone()
        }
    }

    /// Collapses the config into the string sent to the overlay service.
    ///
    /// Empty when the overlay is disabled or has no filters, whatever the
    /// filter list holds.
    ///
    /// # Examples
    /// ```
    /// use flvdeck_core::osd::OverlayConfig;
    ///
    /// let filters = vec!["a".to_string(), "b".to_string()];
    /// assert_eq!(OverlayConfig::new(true, filters.clone()).effective_filters(), "a,b");
    /// assert_eq!(OverlayConfig::new(false, filters).effective_filters(), "");
    /// ```
    pub fn effective_filters(&self) -> String {
        if !self.enabled || self.filters.is_empty() {
            return String::new();
        }
        self.filters.join(FILTER_SEPARATOR)
    }
}

/// Which pipeline the transcoder runs after a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Overlay,
    Passthrough,
}

impl Pipeline {
    pub fn for_effective(effective: &str) -> Self {
        if effective.is_empty() {
            Pipeline::Passthrough
        } else {
            Pipeline::Overlay
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Overlay => write!(f, "overlay pipeline"),
            Pipeline::Passthrough => write!(f, "plain passthrough pipeline"),
        }
    }
}

/// User-visible messages raised by the OSD session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PipelineStarted(Pipeline),
    PushFailed { message: String },
    CloseFailed { message: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::PipelineStarted(pipeline) => write!(f, "{pipeline} started"),
            Notification::PushFailed { message } => write!(f, "Overlay update failed: {message}"),
            Notification::CloseFailed { message } => {
                write!(f, "Overlay session close failed: {message}")
            }
        }
    }
}

/// Errors talking to the remote overlay service.
#[derive(Debug, thiserror::Error)]
pub enum OsdError {
    #[error("overlay service unreachable at {endpoint}: {reason}")]
    RemoteUnreachable { endpoint: String, reason: String },

    #[error("overlay service rejected request with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    #[error("invalid overlay service URL")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("HTTP client setup failed: {reason}")]
    ClientSetup { reason: String },
}
