//! The camera controller: state, gesture interpretation, hit testing and transitions.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_window::RequestRedraw;

pub mod component;
pub mod fov;
pub mod gestures;
pub mod raycast;
pub mod transition;

/// System sets of the controller, run in this order during [`Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum SphereCamSystems {
    /// Attach, detach, play and pause requests.
    Scene,
    /// Gesture events.
    Input,
    /// Device motion sampling.
    Sample,
    /// Transition timing and writing camera and sphere transforms.
    Animate,
    /// Observers of the final pose, like look tracking.
    Track,
}

/// Adds the [`SphereCam`](component::SphereCam) controller, its gesture events and its systems.
pub struct SphereCamPlugin;

impl Plugin for SphereCamPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<gestures::PanInput>()
            .add_event::<gestures::PinchInput>()
            .add_event::<gestures::TapInput>()
            .add_event::<gestures::LongPressInput>()
            .add_event::<RequestRedraw>()
            .configure_sets(
                Update,
                (
                    SphereCamSystems::Scene,
                    SphereCamSystems::Input,
                    SphereCamSystems::Sample,
                    SphereCamSystems::Animate,
                    SphereCamSystems::Track,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    component::SphereCam::track_viewport.before(SphereCamSystems::Input),
                    component::SphereCam::receive_gestures.in_set(SphereCamSystems::Input),
                    component::SphereCam::update_camera_poses.in_set(SphereCamSystems::Animate),
                ),
            )
            .register_type::<component::SphereCam>()
            .register_type::<component::VideoSphere>();
    }
}
