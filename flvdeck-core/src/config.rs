//! Centralized configuration for Flvdeck.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

/// Central configuration for all Flvdeck components.
///
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct DeckConfig {
    pub osd: OsdServiceConfig,
    pub player: PlayerDefaults,
}

/// Remote overlay service configuration.
///
/// Controls where the transcoder's control endpoints live and how long
/// requests against them may take.
#[derive(Debug, Clone)]
pub struct OsdServiceConfig {
    /// Base URL the `/setosd` and `/close` endpoints are resolved against
    pub base_url: String,
    /// HTTP request timeout for overlay service calls
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
    /// Longest time teardown waits for the close request to leave
    pub close_grace: Duration,
}

impl Default for OsdServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "flvdeck/0.1.0",
            close_grace: Duration::from_millis(250),
        }
    }
}

/// Initial track and liveness flags for a fresh source descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDefaults {
    pub is_live: bool,
    pub has_video: bool,
    pub has_audio: bool,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            is_live: true,
            has_video: true,
            has_audio: true,
        }
    }
}

impl DeckConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup` on top of the defaults.
    ///
    /// Blank URLs and unparsable numbers leave the default in place.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("FLVDECK_OSD_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.osd.base_url = url.to_string();
            }
        }

        if let Some(seconds) = lookup("FLVDECK_OSD_TIMEOUT").and_then(|v| v.trim().parse().ok()) {
            config.osd.timeout = Duration::from_secs(seconds);
        }

        if let Some(millis) = lookup("FLVDECK_CLOSE_GRACE_MS").and_then(|v| v.trim().parse().ok())
        {
            config.osd.close_grace = Duration::from_millis(millis);
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            osd: OsdServiceConfig {
                timeout: Duration::from_secs(2),
                close_grace: Duration::from_millis(500),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns a copy pointing the overlay client at `base_url`.
    pub fn with_osd_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.osd.base_url = base_url.into();
        self
    }
}
