//! Recording engine for testing the player controller.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{PlaybackEngine, PlayerError, PlayerHandle, SourceDescriptor};

/// Surface identity used by the recording engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockSurface(pub u32);

/// One call made against the recording engine, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Create { handle: u64 },
    Attach { handle: u64, surface: MockSurface },
    Detach { handle: u64 },
    Load { handle: u64 },
    Play { handle: u64 },
    Pause { handle: u64 },
    Unload { handle: u64 },
    Destroy { handle: u64 },
}

#[derive(Debug, Default)]
struct EngineLog {
    calls: Vec<EngineCall>,
    descriptors: Vec<SourceDescriptor>,
    next_handle: u64,
    live: usize,
    attached: HashMap<u64, MockSurface>,
    max_per_surface: usize,
    fail_create: bool,
}

impl EngineLog {
    fn bind(&mut self, handle: u64, surface: MockSurface) {
        self.attached.insert(handle, surface);
        let sharing = self.attached.values().filter(|s| **s == surface).count();
        self.max_per_surface = self.max_per_surface.max(sharing);
    }
}

/// Mock engine that records every call and tracks handle liveness.
///
/// Clones share one log, so a test can keep a clone after handing the engine
/// to a controller.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
    supported: bool,
}

impl RecordingEngine {
    /// Creates a supported engine that always builds players.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(EngineLog::default())),
            supported: true,
        }
    }

    /// Creates an engine whose capability probe fails.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Creates an engine that refuses to build players.
    pub fn new_with_create_failure() -> Self {
        let engine = Self::new();
        engine.set_create_failure(true);
        engine
    }

    /// Switches player creation failures on or off for every clone.
    pub fn set_create_failure(&self, fail: bool) {
        self.log.lock().fail_create = fail;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.log.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().calls.clear();
    }

    /// Descriptors passed to `create_player`, oldest first.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.log.lock().descriptors.clone()
    }

    pub fn created_count(&self) -> usize {
        self.log.lock().descriptors.len()
    }

    /// Handles created and not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.log.lock().live
    }

    /// Highest number of handles ever attached to one surface at once.
    pub fn max_handles_per_surface(&self) -> usize {
        self.log.lock().max_per_surface
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for RecordingEngine {
    type Surface = MockSurface;
    type Handle = RecordingHandle;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_player(&self, source: &SourceDescriptor) -> Result<RecordingHandle, PlayerError> {
        let mut log = self.log.lock();
        if log.fail_create {
            return Err(PlayerError::Engine {
                reason: "Mock player creation failure".to_string(),
            });
        }

        log.next_handle += 1;
        let id = log.next_handle;
        log.live += 1;
        log.descriptors.push(source.clone());
        log.calls.push(EngineCall::Create { handle: id });

        Ok(RecordingHandle {
            id,
            log: Arc::clone(&self.log),
        })
    }
}

/// Handle produced by [`RecordingEngine`].
#[derive(Debug)]
pub struct RecordingHandle {
    id: u64,
    log: Arc<Mutex<EngineLog>>,
}

impl RecordingHandle {
    fn record(&self, call: EngineCall) {
        self.log.lock().calls.push(call);
    }
}

impl PlayerHandle for RecordingHandle {
    type Surface = MockSurface;

    fn attach(&mut self, surface: &MockSurface) {
        let mut log = self.log.lock();
        log.bind(self.id, *surface);
        log.calls.push(EngineCall::Attach {
            handle: self.id,
            surface: *surface,
        });
    }

    fn detach(&mut self) {
        let mut log = self.log.lock();
        log.attached.remove(&self.id);
        log.calls.push(EngineCall::Detach { handle: self.id });
    }

    fn load(&mut self) {
        self.record(EngineCall::Load { handle: self.id });
    }

    fn play(&mut self) {
        self.record(EngineCall::Play { handle: self.id });
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause { handle: self.id });
    }

    fn unload(&mut self) {
        self.record(EngineCall::Unload { handle: self.id });
    }

    fn destroy(self) {
        let mut log = self.log.lock();
        log.attached.remove(&self.id);
        log.live = log.live.saturating_sub(1);
        log.calls.push(EngineCall::Destroy { handle: self.id });
    }
}
