//! The primary [`Component`] of the controller, [`SphereCam`].

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::{
    fov::{self, FovLimits},
    raycast::SphereRaycast,
    transition::{Animation, Keyframe, TransitionSettings},
};
use crate::math;

/// Marks the video sphere entity and records its radius.
#[derive(Debug, Clone, Copy, Component, Reflect)]
pub struct VideoSphere {
    /// Radius of the sphere in world units.
    pub radius: f32,
}

/// Whether a device attitude is currently driving the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum SensorState {
    /// The latest device attitude, used directly as the camera's base orientation.
    Present(Quat),
    /// No motion data. The camera keeps the orientation it was given when the scene was built.
    #[default]
    Absent,
}

/// Pitch and yaw accumulated from touch gestures, in radians. There is no manual roll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct ManualOffset {
    /// Rotation toward (positive) or away from the upper pole.
    pub pitch: f32,
    /// Rotation of the sphere about its poles. Unbounded.
    pub yaw: f32,
}

/// How far manual pitch may go, in radians.
///
/// Looking down is capped lower than looking up: extremes at the poles are hard to recover from
/// with a single finger, and the floor of most footage is the less interesting half.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PitchLimits {
    /// Largest upward pitch.
    pub up: f32,
    /// Largest downward pitch, as a positive angle.
    pub down: f32,
}

impl Default for PitchLimits {
    fn default() -> Self {
        Self {
            up: 85f32.to_radians(),
            down: 60f32.to_radians(),
        }
    }
}

impl PitchLimits {
    /// Clamp a pitch into `[-down, up]`. Non-finite input clamps to zero.
    pub fn clamp(&self, pitch: f32) -> f32 {
        if pitch.is_nan() {
            return 0.0;
        }
        pitch.max(-self.down).min(self.up)
    }
}

/// Everything needed to place the camera and the sphere for one frame. Derived on demand from a
/// [`SphereCam`], never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World rotation of the camera.
    pub camera_rotation: Quat,
    /// World rotation of the video sphere, carrying the manual yaw.
    pub sphere_rotation: Quat,
    /// Horizontal field of view in degrees.
    pub x_fov: f32,
}

/// Tracks all state of a 360° camera: settings, the latest device attitude, gesture offsets, the
/// field of view, and any transition in flight.
///
/// # Moving the Camera
///
/// The [`SphereCamPlugin`](crate::controller::SphereCamPlugin) feeds gesture events and motion
/// samples into this component and writes the resulting [`CameraPose`] every frame the camera
/// changes. To drive it manually, call the gesture methods ([`SphereCam::pan_by`],
/// [`SphereCam::pinch_changed`], [`SphereCam::zoom_in`], [`SphereCam::reset`], ...) and
/// [`SphereCam::set_attitude`], then read [`SphereCam::pose`].
#[derive(Debug, Clone, Reflect, Component)]
pub struct SphereCam {
    /// Field of view bounds and default.
    pub fov_limits: FovLimits,
    /// Manual pitch bounds.
    pub pitch_limits: PitchLimits,
    /// Factor applied to the field of view by the zoom taps.
    pub zoom_step: f32,
    /// Duration and easing of animated gestures.
    pub transition: TransitionSettings,
    /// The sphere this camera looks at. Receives the manual yaw.
    pub sphere: Option<Entity>,
    /// Radius of the sphere, used to hit test gestures.
    pub sphere_radius: f32,
    /// Size of the viewport in logical pixels, used to hit test gestures. Kept in sync with the
    /// [`Camera`] when its viewport size is known.
    pub viewport_size: Vec2,
    sensor: SensorState,
    manual: ManualOffset,
    fov: f32,
    animation: Animation,
    pinch_baseline: Option<f32>,
    dirty: bool,
}

impl Default for SphereCam {
    fn default() -> Self {
        let fov_limits = FovLimits::default();
        SphereCam {
            fov: fov_limits.default_fov(),
            fov_limits,
            pitch_limits: Default::default(),
            zoom_step: 1.5,
            transition: Default::default(),
            sphere: None,
            sphere_radius: 30.0,
            viewport_size: Vec2::ZERO,
            sensor: SensorState::Absent,
            manual: ManualOffset::default(),
            animation: Animation::Idle,
            pinch_baseline: None,
            dirty: true,
        }
    }
}

impl SphereCam {
    /// Create a controller for the given sphere.
    pub fn new(sphere: Entity, sphere_radius: f32) -> Self {
        Self {
            sphere: Some(sphere),
            sphere_radius,
            ..Default::default()
        }
    }

    /// The current model field of view, in degrees. During a transition the presented value is
    /// in [`CameraPose::x_fov`].
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// The manual offset accumulated from gestures.
    pub fn manual_offset(&self) -> ManualOffset {
        self.manual
    }

    /// The sensor state used by the next recompute.
    pub fn sensor(&self) -> SensorState {
        self.sensor
    }

    /// Is an animated transition in flight? While it is, the model pitch is not written and
    /// discrete gestures are ignored.
    pub fn is_animating(&self) -> bool {
        self.animation.is_animating()
    }

    /// The transition state machine.
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Does the camera need its transforms rewritten this frame?
    pub fn needs_update(&self) -> bool {
        self.dirty || self.is_animating()
    }

    /// Store the latest device attitude. Non-finite samples are ignored.
    pub fn set_attitude(&mut self, attitude: Quat) {
        if !attitude.is_finite() || attitude.length_squared() <= f32::EPSILON {
            trace!("Ignoring degenerate attitude sample {attitude:?}");
            return;
        }
        self.sensor = SensorState::Present(attitude.normalize());
        self.dirty = true;
    }

    /// Forget the device attitude and fall back to the rest orientation.
    pub fn clear_attitude(&mut self) {
        if self.sensor != SensorState::Absent {
            self.sensor = SensorState::Absent;
            self.dirty = true;
        }
    }

    fn model_keyframe(&self) -> Keyframe {
        Keyframe {
            fov: self.fov,
            pitch: self.manual.pitch,
            yaw: self.manual.yaw,
        }
    }

    /// The keyframe on screen: the model values, or the eased values of a running transition.
    pub fn presented(&self) -> Keyframe {
        self.animation.present(self.model_keyframe())
    }

    /// Start a transition from the pose currently on screen. Returns `false`, changing nothing,
    /// if one is already in flight.
    fn begin_transition(&mut self) -> bool {
        if self.is_animating() {
            debug!("Transition already in flight, ignoring gesture");
            return false;
        }
        self.animation = Animation::start(self.presented(), self.transition);
        self.dirty = true;
        true
    }

    /// Apply an incremental pan, as produced by the gesture interpreter.
    pub fn pan_by(&mut self, pitch_delta: f32, yaw_delta: f32) {
        if !(pitch_delta.is_finite() && yaw_delta.is_finite()) {
            return;
        }
        self.manual.yaw -= yaw_delta;
        self.manual.pitch = self.pitch_limits.clamp(self.manual.pitch + pitch_delta);
        self.dirty = true;
    }

    /// Apply the remainder of a pan fling as an animated transition. A fling that moves nothing
    /// starts no transition.
    pub fn fling_by(&mut self, pitch_delta: f32, yaw_delta: f32) {
        if !(pitch_delta.is_finite() && yaw_delta.is_finite()) {
            return;
        }
        if pitch_delta == 0.0 && yaw_delta == 0.0 {
            return;
        }
        if self.begin_transition() {
            self.pan_by(pitch_delta, yaw_delta);
        }
    }

    /// Record the current field of view as the baseline for a pinch.
    pub fn pinch_began(&mut self) {
        self.pinch_baseline = Some(self.fov);
    }

    /// Scale the field of view from the pinch baseline. A pinch that never began uses the current
    /// field of view as its baseline.
    pub fn pinch_changed(&mut self, scale: f32) {
        if !(scale.is_finite() && scale > 0.0) {
            return;
        }
        let baseline = *self.pinch_baseline.get_or_insert(self.fov);
        self.fov = self.fov_limits.clamp(baseline / scale);
        self.dirty = true;
    }

    /// Revert the field of view to the pinch baseline.
    pub fn pinch_cancelled(&mut self) {
        if let Some(baseline) = self.pinch_baseline.take() {
            self.fov = self.fov_limits.clamp(baseline);
            self.dirty = true;
        }
    }

    /// Finish a pinch, keeping the field of view it reached.
    pub fn pinch_ended(&mut self) {
        self.pinch_baseline = None;
    }

    /// Multiply the field of view by `factor`, animated.
    pub fn zoom_by(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        if self.begin_transition() {
            self.fov = self.fov_limits.clamp(self.fov * factor);
        }
    }

    /// Widen the field of view by [`SphereCam::zoom_step`].
    pub fn zoom_out(&mut self) {
        self.zoom_by(self.zoom_step);
    }

    /// Narrow the field of view by [`SphereCam::zoom_step`].
    pub fn zoom_in(&mut self) {
        self.zoom_by(self.zoom_step.recip());
    }

    /// Animate back to the default field of view with no manual offset.
    pub fn reset(&mut self) {
        if self.begin_transition() {
            self.fov = self.fov_limits.default_fov();
            self.manual = ManualOffset::default();
        }
    }

    /// Advance any running transition. Returns `true` on the step that completes it.
    pub fn advance_transition(&mut self, delta: Duration) -> bool {
        let finished = self.animation.advance(delta);
        if finished {
            self.dirty = true;
        }
        finished
    }

    /// Compute the camera and sphere placement from the current state.
    pub fn pose(&self) -> CameraPose {
        let presented = self.presented();
        let (base, axis) = match self.sensor {
            SensorState::Present(attitude) => (attitude, math::pitch_axis(attitude)),
            SensorState::Absent => (math::rest_orientation(), Vec3::NEG_X),
        };
        let pitch = if axis == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(axis, -presented.pitch)
        };
        CameraPose {
            camera_rotation: (base * pitch).normalize(),
            sphere_rotation: Quat::from_rotation_z(presented.yaw) * math::sphere_rest_orientation(),
            x_fov: presented.fov,
        }
    }

    /// A hit test matching what is on screen right now.
    pub fn raycast(&self) -> SphereRaycast {
        let pose = self.pose();
        SphereRaycast {
            viewport_size: self.viewport_size,
            camera_rotation: pose.camera_rotation,
            x_fov: pose.x_fov,
            sphere_rotation: pose.sphere_rotation,
            radius: self.sphere_radius,
        }
    }

    /// Write the pose into the camera's transform and projection. Clears the dirty flag.
    pub fn apply(&mut self, transform: &mut Transform, projection: &mut Projection) -> CameraPose {
        let pose = self.pose();
        transform.rotation = pose.camera_rotation;
        if !fov::apply_to_projection(projection, pose.x_fov) {
            warn_once!("SphereCam only supports perspective projections.");
        }
        self.dirty = false;
        pose
    }

    /// Copy the camera's logical viewport size, once the renderer knows it.
    pub fn track_viewport(mut cameras: Query<(&mut SphereCam, &Camera), Changed<Camera>>) {
        for (mut controller, camera) in &mut cameras {
            let Some(size) = camera.logical_viewport_size() else {
                continue;
            };
            if controller.viewport_size != size {
                controller.viewport_size = size;
            }
        }
    }

    /// Advance transitions and write transforms and projections for all cameras that changed.
    /// Called once per frame.
    pub fn update_camera_poses(
        mut cameras: Query<(&mut SphereCam, &mut Transform, &mut Projection), Without<VideoSphere>>,
        mut spheres: Query<&mut Transform, (With<VideoSphere>, Without<SphereCam>)>,
        mut redraw: EventWriter<RequestRedraw>,
        time: Res<Time>,
    ) {
        for (mut controller, mut transform, mut projection) in &mut cameras {
            if controller.advance_transition(time.delta()) {
                debug!("Camera transition finished");
            }
            if !controller.needs_update() {
                continue;
            }
            let pose = controller.apply(&mut transform, &mut projection);
            if let Some(sphere) = controller.sphere {
                if let Ok(mut sphere_transform) = spheres.get_mut(sphere) {
                    sphere_transform.rotation = pose.sphere_rotation;
                }
            }
            redraw.write(RequestRedraw);
        }
    }
}
