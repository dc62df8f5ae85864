//! A `bevy_sphere_cam` extension that reports where in the video the viewer is looking, and when
//! they have stopped looking around.
//!
//! While a scene is attached, the look vector is sampled every [`LookTracker::interval`] and sent
//! as a [`LookVectorSample`]. The view counts as settled once two consecutive samples differ by no
//! more than [`LookTracker::tolerance`]; a [`LookSettled`] event marks that moment. The samples are
//! an observation stream only and never feed back into the camera.

use std::time::Duration;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;

use crate::{
    controller::{component::SphereCam, SphereCamSystems},
    math,
    scene::SceneEvent,
};

/// See the [module](self) docs.
pub struct LookTrackingPlugin;

impl Plugin for LookTrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LookTracker>()
            .add_event::<SceneEvent>()
            .add_event::<LookVectorSample>()
            .add_event::<LookSettled>()
            .add_systems(
                Update,
                LookTracker::track.in_set(SphereCamSystems::Track),
            )
            .register_type::<HeadingPitch>();
    }
}

/// A look direction in degrees. Heading is in `[0, 360)`; pitch is positive looking up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct HeadingPitch {
    /// Angle around the sphere's poles.
    pub heading: f32,
    /// Angle above the equator.
    pub pitch: f32,
}

impl HeadingPitch {
    /// The look direction of a camera pose, in the sphere's frame so manual yaw is included.
    pub fn of(controller: &SphereCam) -> Self {
        let pose = controller.pose();
        let look = pose.camera_rotation * Vec3::NEG_Z;
        let local = pose.sphere_rotation.inverse() * look;
        let (heading, pitch) = math::heading_pitch(local);
        Self { heading, pitch }
    }

    /// Is `other` within `tolerance` of this look direction?
    pub fn is_near(&self, other: &Self, tolerance: &Self) -> bool {
        math::heading_difference(self.heading, other.heading) <= tolerance.heading
            && (self.pitch - other.pitch).abs() <= tolerance.pitch
    }
}

/// A periodic snapshot of the look direction.
#[derive(Debug, Clone, Copy, PartialEq, Event)]
pub struct LookVectorSample {
    /// Where the camera is looking.
    pub look: HeadingPitch,
    /// App time of the sample.
    pub timestamp: Duration,
}

/// Sent when the look direction stops changing.
#[derive(Debug, Clone, Copy, PartialEq, Event)]
pub struct LookSettled {
    /// Where the camera came to rest.
    pub look: HeadingPitch,
    /// App time at which the view was found settled.
    pub timestamp: Duration,
}

/// Settings and state of look tracking.
#[derive(Debug, Resource)]
pub struct LookTracker {
    /// How long the look direction must hold still to count as settled. Also the sampling
    /// interval.
    pub interval: Duration,
    /// Largest change between samples that still counts as still.
    pub tolerance: HeadingPitch,
    camera: Option<Entity>,
    timer: Timer,
    last: Option<HeadingPitch>,
    settled: bool,
}

impl Default for LookTracker {
    fn default() -> Self {
        let interval = Duration::from_millis(200);
        Self {
            interval,
            tolerance: HeadingPitch {
                heading: 10.0,
                pitch: 5.0,
            },
            camera: None,
            timer: Timer::new(interval, TimerMode::Repeating),
            last: None,
            settled: false,
        }
    }
}

impl LookTracker {
    /// Begin tracking a camera, forgetting any previous samples.
    pub fn start(&mut self, camera: Entity) {
        self.camera = Some(camera);
        self.timer = Timer::new(self.interval, TimerMode::Repeating);
        self.last = None;
        self.settled = false;
        debug!("Look tracking started for {camera}");
    }

    /// Stop tracking. Idempotent.
    pub fn stop(&mut self) {
        if self.camera.take().is_some() {
            debug!("Look tracking stopped");
        }
        self.last = None;
        self.settled = false;
    }

    /// Is a camera being tracked?
    pub fn is_tracking(&self) -> bool {
        self.camera.is_some()
    }

    /// Has the look direction held still for at least one interval?
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// The most recent sample.
    pub fn last_look(&self) -> Option<HeadingPitch> {
        self.last
    }

    /// Record a sample. Returns `true` when it makes the view newly settled.
    pub fn observe(&mut self, look: HeadingPitch) -> bool {
        let was_settled = self.settled;
        self.settled = self
            .last
            .is_some_and(|last| last.is_near(&look, &self.tolerance));
        self.last = Some(look);
        self.settled && !was_settled
    }

    /// Follow scene changes, and sample the tracked camera on the interval.
    pub fn track(
        mut tracker: ResMut<LookTracker>,
        mut scene_events: EventReader<SceneEvent>,
        cameras: Query<&SphereCam>,
        time: Res<Time>,
        mut samples: EventWriter<LookVectorSample>,
        mut settled: EventWriter<LookSettled>,
    ) {
        for event in scene_events.read() {
            match event {
                SceneEvent::Attached { camera, .. } => tracker.start(*camera),
                SceneEvent::Detached => tracker.stop(),
            }
        }
        let Some(camera) = tracker.camera else {
            return;
        };
        tracker.timer.tick(time.delta());
        if !tracker.timer.just_finished() {
            return;
        }
        let Ok(controller) = cameras.get(camera) else {
            // Spawned with deferred commands; not queryable until the next frame.
            return;
        };
        let look = HeadingPitch::of(controller);
        let timestamp = time.elapsed();
        samples.write(LookVectorSample { look, timestamp });
        if tracker.observe(look) {
            settled.write(LookSettled { look, timestamp });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look(heading: f32, pitch: f32) -> HeadingPitch {
        HeadingPitch { heading, pitch }
    }

    #[test]
    fn settles_after_two_close_samples() {
        let mut tracker = LookTracker::default();
        assert!(!tracker.observe(look(10.0, 0.0)));
        assert!(!tracker.is_settled());
        assert!(tracker.observe(look(15.0, 2.0)));
        assert!(tracker.is_settled());
        // Only the edge is reported
        assert!(!tracker.observe(look(16.0, 2.0)));
        assert!(tracker.is_settled());
    }

    #[test]
    fn large_moves_unsettle() {
        let mut tracker = LookTracker::default();
        tracker.observe(look(10.0, 0.0));
        tracker.observe(look(11.0, 0.0));
        assert!(tracker.is_settled());
        assert!(!tracker.observe(look(40.0, 0.0)));
        assert!(!tracker.is_settled());
        assert!(!tracker.observe(look(40.0, 8.0)));
        assert!(!tracker.is_settled());
    }

    #[test]
    fn heading_tolerance_wraps_around() {
        let mut tracker = LookTracker::default();
        tracker.observe(look(355.0, 0.0));
        assert!(tracker.observe(look(3.0, 0.0)));
    }

    #[test]
    fn stop_forgets_samples() {
        let mut tracker = LookTracker::default();
        tracker.start(Entity::PLACEHOLDER);
        tracker.observe(look(0.0, 0.0));
        tracker.observe(look(0.0, 0.0));
        tracker.stop();
        tracker.stop();
        assert!(!tracker.is_tracking());
        assert!(!tracker.is_settled());
        assert_eq!(tracker.last_look(), None);
    }

    #[test]
    fn default_camera_looks_at_texture_center() {
        let look = HeadingPitch::of(&SphereCam::default());
        assert!(math::heading_difference(look.heading, 0.0) < 1e-3, "{look:?}");
        assert!(look.pitch.abs() < 1e-3);
    }

    #[test]
    fn manual_offset_moves_the_look_vector() {
        let mut controller = SphereCam::default();
        controller.pan_by(0.2, 0.0);
        let look = HeadingPitch::of(&controller);
        assert!((look.pitch - 0.2f32.to_degrees()).abs() < 1e-2, "{look:?}");

        let mut controller = SphereCam::default();
        controller.pan_by(0.0, 0.5);
        let look = HeadingPitch::of(&controller);
        assert!(math::heading_difference(look.heading, 0.0) > 20.0, "{look:?}");
    }
}
