//! The seam between the camera and the video player that owns the actual media.

use bevy_math::prelude::*;

/// Playback events reported through [`PlaybackHandle::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback was started through the scene.
    Play,
    /// Playback was paused through the scene.
    Pause,
}

/// The renderable video surface that maps frames onto the sphere.
///
/// Play and pause must go through the surface: it is the authoritative control. Play state, on the
/// other hand, must be queried from the [`PlaybackHandle`].
pub trait VideoSurface: Send + Sync + 'static {
    /// Resume rendering and playback.
    fn play(&mut self);
    /// Pause rendering and playback.
    fn pause(&mut self);
}

/// A player supplied by the host application.
pub trait PlaybackHandle: Send + Sync + 'static {
    /// Bind the underlying player to a new video surface of the given size in pixels.
    fn create_surface(&self, video_size: UVec2) -> Box<dyn VideoSurface>;
    /// Is the player currently playing?
    fn is_playing(&self) -> bool;
    /// Report a playback event, e.g. to analytics.
    fn log(&self, event: PlaybackEvent);
}
