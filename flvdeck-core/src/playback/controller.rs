//! Player controller owning the single live handle bound to a surface.

use std::fmt;

use tracing::{debug, info};

use super::{PlaybackConfig, PlaybackEngine, PlayerError, PlayerHandle};

/// Logical playback state of a bound handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Lifecycle state of the player controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No handle and never built, or the surface went away.
    Unbound,
    Bound(Playback),
    /// The last handle was torn down and nothing replaced it yet.
    Destroyed,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Unbound => write!(f, "unbound"),
            PlayerState::Bound(Playback::Idle) => write!(f, "bound (idle)"),
            PlayerState::Bound(Playback::Loading) => write!(f, "bound (loading)"),
            PlayerState::Bound(Playback::Playing) => write!(f, "bound (playing)"),
            PlayerState::Bound(Playback::Paused) => write!(f, "bound (paused)"),
            PlayerState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Keeps exactly one live player bound to the current surface.
///
/// The handle never leaves this type. Any change to the playback config or
/// to the surface identity tears the handle down completely before a new
/// one is built, so two handles never share a surface.
pub struct PlayerController<E: PlaybackEngine> {
    engine: E,
    surface: Option<E::Surface>,
    config: PlaybackConfig,
    handle: Option<E::Handle>,
    state: PlayerState,
}

impl<E: PlaybackEngine> PlayerController<E> {
    /// Creates an unbound controller. No handle exists until a surface arrives.
    pub fn new(engine: E, config: PlaybackConfig) -> Self {
        Self {
            engine,
            surface: None,
            config,
            handle: None,
            state: PlayerState::Unbound,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&E::Surface> {
        self.surface.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Binds a fresh player for `config` to `surface`.
    ///
    /// Any existing handle is fully destroyed first. Calling this while bound
    /// is how the controller reconfigures.
    ///
    /// # Errors
    ///
    /// - `PlayerError::NoSurface` - `surface` is `None`
    /// - `PlayerError::EngineUnsupported` - The engine capability probe failed
    /// - `PlayerError::Engine` - The engine could not build a player
    pub fn initialize(
        &mut self,
        surface: Option<E::Surface>,
        config: PlaybackConfig,
    ) -> Result<(), PlayerError> {
        self.surface = surface;
        self.config = config;
        self.rebuild()
    }

    /// Replaces the playback config, rebuilding the player when it differs.
    ///
    /// Without a surface the config is only stored; the next mount picks it
    /// up. Returns whether a new handle was built.
    ///
    /// # Errors
    ///
    /// - `PlayerError::EngineUnsupported` - The engine capability probe failed
    /// - `PlayerError::Engine` - The engine could not build a player
    pub fn reconfigure(&mut self, config: PlaybackConfig) -> Result<bool, PlayerError> {
        if config == self.config {
            debug!("Playback config unchanged, keeping current player");
            return Ok(false);
        }

        self.config = config;
        if self.surface.is_none() {
            debug!("Playback config stored, waiting for a surface");
            return Ok(false);
        }

        self.rebuild()?;
        Ok(true)
    }

    /// Swaps the surface the player renders to.
    ///
    /// A different surface identity destroys the current handle. If the new
    /// surface is present a fresh player is bound to it.
    ///
    /// # Errors
    ///
    /// - `PlayerError::EngineUnsupported` - The engine capability probe failed
    /// - `PlayerError::Engine` - The engine could not build a player
    pub fn set_surface(&mut self, surface: Option<E::Surface>) -> Result<(), PlayerError> {
        if surface == self.surface && self.handle.is_some() {
            debug!("Surface unchanged, keeping current player");
            return Ok(());
        }

        self.destroy();
        self.surface = surface;

        if self.surface.is_some() {
            self.rebuild()
        } else {
            self.state = PlayerState::Unbound;
            Ok(())
        }
    }

    /// Destroys the player and forgets the surface.
    pub fn unmount(&mut self) {
        self.destroy();
        self.surface = None;
        self.state = PlayerState::Unbound;
    }

    /// Starts buffering the source.
    ///
    /// With no handle bound, a player is built first and the load retried
    /// once. The retry never recurses.
    ///
    /// # Errors
    ///
    /// - `PlayerError::NoSurface` - No handle exists and no surface is attached
    /// - `PlayerError::EngineUnsupported` - The engine capability probe failed
    /// - `PlayerError::Engine` - The engine could not build a player
    pub fn load(&mut self) -> Result<(), PlayerError> {
        if self.handle.is_none() {
            debug!("No player bound, initializing before load");
            self.rebuild()?;
        }

        let handle = self.handle.as_mut().ok_or(PlayerError::NoSurface)?;
        handle.load();
        self.state = PlayerState::Bound(Playback::Loading);
        info!(url = ?self.config.source_url, "Player loading");
        Ok(())
    }

    /// Starts or resumes playback. Does nothing without a handle.
    pub fn play(&mut self) {
        if self.state == PlayerState::Bound(Playback::Playing) {
            debug!("Play requested while already playing");
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            debug!("Play requested with no player bound");
            return;
        };

        handle.play();
        self.state = PlayerState::Bound(Playback::Playing);
    }

    /// Pauses playback. Does nothing without a handle or when already paused.
    pub fn pause(&mut self) {
        if self.state == PlayerState::Bound(Playback::Paused) {
            debug!("Pause requested while already paused");
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            debug!("Pause requested with no player bound");
            return;
        };

        handle.pause();
        self.state = PlayerState::Bound(Playback::Paused);
    }

    /// Releases the player: pause, unload, detach, then destroy.
    ///
    /// The handle is taken out of the controller before teardown starts, so
    /// a stale handle can never be reused. Calling this with nothing bound is
    /// a no-op.
    pub fn destroy(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            debug!("Destroy requested with no player bound");
            return;
        };

        handle.pause();
        handle.unload();
        handle.detach();
        handle.destroy();

        self.state = PlayerState::Destroyed;
        info!("Player destroyed");
    }

    fn rebuild(&mut self) -> Result<(), PlayerError> {
        self.destroy();

        let surface = self.surface.clone().ok_or(PlayerError::NoSurface)?;
        if !self.engine.is_supported() {
            return Err(PlayerError::EngineUnsupported);
        }

        let descriptor = self.config.source_descriptor();
        let mut handle = self.engine.create_player(&descriptor)?;
        handle.attach(&surface);

        self.handle = Some(handle);
        self.state = PlayerState::Bound(Playback::Idle);
        info!(?surface, url = ?descriptor.url, "Player bound to surface");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{EngineCall, MockSurface, RecordingEngine};

    fn bound_controller() -> PlayerController<RecordingEngine> {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());
        controller
            .initialize(Some(MockSurface(1)), PlaybackConfig::default())
            .unwrap();
        controller
    }

    #[test]
    fn test_initialize_without_surface_fails() {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());

        let result = controller.initialize(None, PlaybackConfig::default());

        assert!(matches!(result, Err(PlayerError::NoSurface)));
        assert_eq!(controller.state(), PlayerState::Unbound);
        assert_eq!(controller.engine().created_count(), 0);
    }

    #[test]
    fn test_initialize_binds_idle_player() {
        let controller = bound_controller();

        assert_eq!(controller.state(), PlayerState::Bound(Playback::Idle));
        assert_eq!(
            controller.engine().calls(),
            vec![
                EngineCall::Create { handle: 1 },
                EngineCall::Attach {
                    handle: 1,
                    surface: MockSurface(1)
                },
            ]
        );
    }

    #[test]
    fn test_initialize_when_bound_tears_down_first() {
        let mut controller = bound_controller();
        controller.engine().clear_calls();

        controller
            .initialize(Some(MockSurface(1)), PlaybackConfig::default().with_live(false))
            .unwrap();

        assert_eq!(
            controller.engine().calls(),
            vec![
                EngineCall::Pause { handle: 1 },
                EngineCall::Unload { handle: 1 },
                EngineCall::Detach { handle: 1 },
                EngineCall::Destroy { handle: 1 },
                EngineCall::Create { handle: 2 },
                EngineCall::Attach {
                    handle: 2,
                    surface: MockSurface(1)
                },
            ]
        );
        assert_eq!(controller.engine().max_handles_per_surface(), 1);
    }

    #[test]
    fn test_unsupported_engine_refuses_to_bind() {
        let mut controller =
            PlayerController::new(RecordingEngine::unsupported(), PlaybackConfig::default());

        let result = controller.initialize(Some(MockSurface(1)), PlaybackConfig::default());

        assert!(matches!(result, Err(PlayerError::EngineUnsupported)));
        assert!(!controller.is_bound());
    }

    #[test]
    fn test_create_failure_leaves_controller_unbound() {
        let mut controller = PlayerController::new(
            RecordingEngine::new_with_create_failure(),
            PlaybackConfig::default(),
        );

        let result = controller.initialize(Some(MockSurface(1)), PlaybackConfig::default());

        assert!(matches!(result, Err(PlayerError::Engine { .. })));
        assert!(!controller.is_bound());
        assert_eq!(controller.state(), PlayerState::Unbound);
        assert_eq!(controller.engine().live_count(), 0);
        assert!(controller.engine().calls().is_empty());
    }

    #[test]
    fn test_failed_rebuild_destroys_old_handle_then_load_recovers() {
        let mut controller = bound_controller();
        controller.engine().set_create_failure(true);

        let result = controller.reconfigure(PlaybackConfig::default().with_live(false));

        assert!(matches!(result, Err(PlayerError::Engine { .. })));
        assert!(!controller.is_bound());
        assert_eq!(controller.state(), PlayerState::Destroyed);
        assert_eq!(controller.engine().live_count(), 0);
        assert!(!controller.config().is_live);

        controller.engine().set_create_failure(false);
        controller.load().unwrap();

        assert_eq!(controller.state(), PlayerState::Bound(Playback::Loading));
        assert_eq!(controller.engine().live_count(), 1);
        assert!(!controller.engine().descriptors()[1].is_live);
    }

    #[test]
    fn test_play_and_pause_without_handle_are_noops() {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());

        controller.play();
        controller.pause();

        assert_eq!(controller.state(), PlayerState::Unbound);
        assert!(controller.engine().calls().is_empty());
    }

    #[test]
    fn test_redundant_pause_reaches_engine_once() {
        let mut controller = bound_controller();
        controller.play();
        controller.engine().clear_calls();

        controller.pause();
        controller.pause();

        assert_eq!(controller.engine().calls(), vec![EngineCall::Pause { handle: 1 }]);
        assert_eq!(controller.state(), PlayerState::Bound(Playback::Paused));
    }

    #[test]
    fn test_destroy_twice_is_noop() {
        let mut controller = bound_controller();

        controller.destroy();
        let calls_after_first = controller.engine().calls().len();
        controller.destroy();

        assert_eq!(controller.engine().calls().len(), calls_after_first);
        assert_eq!(controller.state(), PlayerState::Destroyed);
        assert_eq!(controller.engine().live_count(), 0);
    }

    #[test]
    fn test_load_self_heals_once() {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());
        controller.set_surface(Some(MockSurface(1))).unwrap();
        controller.destroy();
        controller.engine().clear_calls();

        controller.load().unwrap();

        assert_eq!(controller.engine().created_count(), 2);
        assert_eq!(
            controller.engine().calls(),
            vec![
                EngineCall::Create { handle: 2 },
                EngineCall::Attach {
                    handle: 2,
                    surface: MockSurface(1)
                },
                EngineCall::Load { handle: 2 },
            ]
        );
        assert_eq!(controller.state(), PlayerState::Bound(Playback::Loading));
    }

    #[test]
    fn test_load_without_surface_fails_after_single_attempt() {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());

        let result = controller.load();

        assert!(matches!(result, Err(PlayerError::NoSurface)));
        assert_eq!(controller.engine().created_count(), 0);
        assert!(controller.engine().calls().is_empty());
    }

    #[test]
    fn test_reconfigure_same_config_keeps_handle() {
        let mut controller = bound_controller();

        let rebuilt = controller.reconfigure(PlaybackConfig::default()).unwrap();

        assert!(!rebuilt);
        assert_eq!(controller.engine().created_count(), 1);
    }

    #[test]
    fn test_reconfigure_without_surface_defers() {
        let mut controller = PlayerController::new(RecordingEngine::new(), PlaybackConfig::default());
        let config = PlaybackConfig::default().with_source_input("host/live");

        let rebuilt = controller.reconfigure(config.clone()).unwrap();

        assert!(!rebuilt);
        assert_eq!(controller.config(), &config);
        assert_eq!(controller.engine().created_count(), 0);
    }

    #[test]
    fn test_surface_swap_rebinds() {
        let mut controller = bound_controller();

        controller.set_surface(Some(MockSurface(2))).unwrap();

        assert_eq!(controller.surface(), Some(&MockSurface(2)));
        assert_eq!(controller.engine().created_count(), 2);
        assert_eq!(controller.engine().live_count(), 1);
    }

    #[test]
    fn test_unmount_releases_handle() {
        let mut controller = bound_controller();

        controller.unmount();

        assert_eq!(controller.state(), PlayerState::Unbound);
        assert_eq!(controller.engine().live_count(), 0);
        assert!(controller.surface().is_none());
    }
}
