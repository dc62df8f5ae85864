//! A look-around camera for 360° video in Bevy.
//!
//! The camera sits at the center of a sphere showing the video on its inside. Two independent
//! inputs steer it:
//!
//! - **Device motion**: attitude samples from a [`MotionSource`](motion::MotionSource), polled at
//!   90 Hz, orient the camera directly, so the view follows the device.
//! - **Touch gestures**: pans add manual pitch and yaw on top of the device attitude, pinches and
//!   taps change the field of view, and a long-press animates everything back to the defaults.
//!
//! # Getting started
//!
//! 1. Add [`DefaultSphereCamPlugins`], and insert a [`MotionSampler`](motion::MotionSampler) built
//!    from your platform's motion source if the device has one.
//! 2. Send [`PlaybackRequest::Attach`](scene::PlaybackRequest) with your
//!    [`PlaybackHandle`](playback::PlaybackHandle) to build the scene.
//! 3. Forward recognized gestures as [`PanInput`](controller::gestures::PanInput),
//!    [`PinchInput`](controller::gestures::PinchInput),
//!    [`TapInput`](controller::gestures::TapInput) and
//!    [`LongPressInput`](controller::gestures::LongPressInput) events.

pub mod controller;
pub mod extensions;
pub mod math;
pub mod motion;
pub mod playback;
pub mod scene;

use bevy_app::{PluginGroup, PluginGroupBuilder};

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            component::{CameraPose, ManualOffset, PitchLimits, SensorState, SphereCam, VideoSphere},
            fov::FovLimits,
            gestures::{GesturePhase, LongPressInput, PanInput, PinchInput, TapInput},
            transition::TransitionSettings,
            SphereCamPlugin, SphereCamSystems,
        },
        motion::{MotionSampler, MotionSource, SharedAttitude},
        playback::{PlaybackEvent, PlaybackHandle, VideoSurface},
        scene::{PlaybackRequest, SceneEvent, SphereScene, VideoTexture},
        DefaultSphereCamPlugins,
    };
}

/// Adds the controller, motion sampling, scene management, and any enabled extensions.
pub struct DefaultSphereCamPlugins;

impl PluginGroup for DefaultSphereCamPlugins {
    #[allow(clippy::let_and_return)]
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>()
            .add(controller::SphereCamPlugin)
            .add(motion::MotionPlugin)
            .add(scene::ScenePlugin);

        #[cfg(feature = "extension_look_tracking")]
        let group = group.add(extensions::look_tracking::LookTrackingPlugin);

        group
    }
}
