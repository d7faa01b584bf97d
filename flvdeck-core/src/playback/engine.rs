//! Collaborator traits for the media decoding engine.

use std::fmt::Debug;

use super::{PlayerError, SourceDescriptor};

/// Factory side of the decoding engine.
///
/// The controller only ever needs to probe support and build a fresh handle
/// from a source descriptor. Everything else happens on the handle.
pub trait PlaybackEngine {
    /// Rendering surface a handle can be attached to.
    type Surface: Clone + PartialEq + Debug;
    /// Opaque engine-owned playback object.
    type Handle: PlayerHandle<Surface = Self::Surface>;

    /// Whether this environment can decode the stream at all.
    fn is_supported(&self) -> bool;

    /// Builds a new, unattached player for `source`.
    ///
    /// # Errors
    ///
    /// - `PlayerError::Engine` - The engine refused to build a player
    fn create_player(&self, source: &SourceDescriptor) -> Result<Self::Handle, PlayerError>;
}

/// Live player produced by a [`PlaybackEngine`].
///
/// Engine-internal failures are not reported through this interface; each
/// call is fire-and-forget from the controller's point of view.
pub trait PlayerHandle {
    type Surface;

    fn attach(&mut self, surface: &Self::Surface);
    fn detach(&mut self);
    /// Starts buffering the source.
    fn load(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn unload(&mut self);
    /// Releases the handle. It cannot be used afterwards.
    fn destroy(self);
}
