//! Engine that logs every call instead of decoding.
//!
//! Used by the console where no real decoder is present. Each handle call is
//! reported through `tracing` under the `flvdeck::engine` target.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use super::{PlaybackEngine, PlayerError, PlayerHandle, SourceDescriptor};
use crate::tracing_setup::ENGINE_TARGET;

#[derive(Debug, Default)]
pub struct DryRunEngine {
    next_id: AtomicU64,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackEngine for DryRunEngine {
    /// Surfaces are named, like the element id of a video tag.
    type Surface = String;
    type Handle = DryRunHandle;

    fn is_supported(&self) -> bool {
        true
    }

    fn create_player(&self, source: &SourceDescriptor) -> Result<DryRunHandle, PlayerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let descriptor = serde_json::to_string(source).map_err(|e| PlayerError::Engine {
            reason: format!("source descriptor not serializable: {e}"),
        })?;
        info!(target: ENGINE_TARGET, player = id, %descriptor, "createPlayer");

        Ok(DryRunHandle { id, surface: None })
    }
}

#[derive(Debug)]
pub struct DryRunHandle {
    id: u64,
    surface: Option<String>,
}

impl DryRunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn surface(&self) -> Option<&str> {
        self.surface.as_deref()
    }

    fn log(&self, call: &str) {
        info!(target: ENGINE_TARGET, player = self.id, surface = ?self.surface, "{call}");
    }
}

impl PlayerHandle for DryRunHandle {
    type Surface = String;

    fn attach(&mut self, surface: &String) {
        self.surface = Some(surface.clone());
        self.log("attachMediaElement");
    }

    fn detach(&mut self) {
        self.log("detachMediaElement");
        self.surface = None;
    }

    fn load(&mut self) {
        self.log("load");
    }

    fn play(&mut self) {
        self.log("play");
    }

    fn pause(&mut self) {
        self.log("pause");
    }

    fn unload(&mut self) {
        self.log("unload");
    }

    fn destroy(self) {
        self.log("destroy");
    }
}
