//! Device motion sampling.
//!
//! A [`MotionSource`] stands in for the platform's motion service. The [`MotionSampler`] resource
//! polls it on a fixed timer while a scene is attached and hands every new attitude to the
//! cameras, which recompute in the same frame.

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_time::prelude::*;

use crate::controller::{component::SphereCam, SphereCamSystems};

/// The device motion service.
///
/// Attitudes are unit quaternions in a reference frame whose Z axis is vertical, with the
/// identity meaning the device lies flat on its back.
pub trait MotionSource: Send + Sync + 'static {
    /// Can this device deliver motion updates at all?
    fn is_available(&self) -> bool;
    /// Begin delivering updates at roughly the given interval.
    fn start_updates(&mut self, interval: Duration);
    /// Stop delivering updates.
    fn stop_updates(&mut self);
    /// Take the newest attitude delivered since the last call, if any.
    fn latest_attitude(&mut self) -> Option<Quat>;
}

/// A device without motion sensing. The camera is driven by gestures alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMotion;

impl MotionSource for NoMotion {
    fn is_available(&self) -> bool {
        false
    }

    fn start_updates(&mut self, _interval: Duration) {}

    fn stop_updates(&mut self) {}

    fn latest_attitude(&mut self) -> Option<Quat> {
        None
    }
}

#[derive(Debug, Default)]
struct AttitudeSlot {
    latest: Option<Quat>,
    running: bool,
    interval: Duration,
}

/// A motion source fed from outside the app, e.g. by a platform callback on another thread.
///
/// Only the newest sample is kept; each one replaces the last wholesale.
#[derive(Clone, Default)]
pub struct SharedAttitude {
    slot: Arc<Mutex<AttitudeSlot>>,
}

impl SharedAttitude {
    /// Create a source and the feed that writes into it.
    pub fn new() -> (Self, AttitudeFeed) {
        let source = Self::default();
        let feed = AttitudeFeed {
            slot: source.slot.clone(),
        };
        (source, feed)
    }
}

impl fmt::Debug for SharedAttitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAttitude").finish_non_exhaustive()
    }
}

impl MotionSource for SharedAttitude {
    fn is_available(&self) -> bool {
        true
    }

    fn start_updates(&mut self, interval: Duration) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.running = true;
            slot.interval = interval;
        }
    }

    fn stop_updates(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.running = false;
            slot.latest = None;
        }
    }

    fn latest_attitude(&mut self) -> Option<Quat> {
        self.slot.lock().ok()?.latest.take()
    }
}

/// Write half of a [`SharedAttitude`].
#[derive(Clone)]
pub struct AttitudeFeed {
    slot: Arc<Mutex<AttitudeSlot>>,
}

impl AttitudeFeed {
    /// Is the sampler currently asking for updates?
    pub fn is_running(&self) -> bool {
        self.slot.lock().map(|slot| slot.running).unwrap_or(false)
    }

    /// The interval the sampler asked for when it started.
    pub fn requested_interval(&self) -> Duration {
        self.slot
            .lock()
            .map(|slot| slot.interval)
            .unwrap_or_default()
    }

    /// Deliver a sample. Dropped while the sampler is stopped.
    pub fn push(&self, attitude: Quat) {
        if let Ok(mut slot) = self.slot.lock() {
            if slot.running {
                slot.latest = Some(attitude);
            }
        }
    }
}

impl fmt::Debug for AttitudeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttitudeFeed")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Polls a [`MotionSource`] at a fixed rate while active.
#[derive(Resource)]
pub struct MotionSampler {
    source: Box<dyn MotionSource>,
    interval: Duration,
    timer: Timer,
    active: bool,
    sensor_lost: bool,
}

impl Default for MotionSampler {
    fn default() -> Self {
        Self::new(NoMotion)
    }
}

impl fmt::Debug for MotionSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionSampler")
            .field("interval", &self.interval)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl MotionSampler {
    /// Default sampling interval, 90 Hz.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 90);

    /// Sample the given source at [`MotionSampler::DEFAULT_INTERVAL`].
    pub fn new(source: impl MotionSource) -> Self {
        Self::with_interval(source, Self::DEFAULT_INTERVAL)
    }

    /// Sample the given source at a custom interval.
    pub fn with_interval(source: impl MotionSource, interval: Duration) -> Self {
        Self {
            source: Box::new(source),
            interval,
            timer: Timer::new(interval, TimerMode::Repeating),
            active: false,
            sensor_lost: false,
        }
    }

    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Is the sampler subscribed to the source?
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Subscribe to the source. Does nothing if already subscribed, or if the device has no
    /// motion sensing, in which case the cameras stay gesture-driven.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if !self.source.is_available() {
            debug!("Device motion unavailable, camera is gesture-only");
            return;
        }
        self.source.start_updates(self.interval);
        self.timer = Timer::new(self.interval, TimerMode::Repeating);
        self.active = true;
        self.sensor_lost = false;
        debug!("Device motion started at {:?} intervals", self.interval);
    }

    /// Unsubscribe from the source. Idempotent.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.source.stop_updates();
        self.active = false;
        self.sensor_lost = true;
        debug!("Device motion stopped");
    }

    /// Advance the sampling timer and take a sample when it fires.
    ///
    /// Returns the newest attitude if one arrived. Several timer periods within one frame still
    /// yield a single sample, since only the latest attitude matters.
    pub fn tick(&mut self, delta: Duration) -> Option<Quat> {
        if !self.active {
            return None;
        }
        self.timer.tick(delta);
        if !self.timer.just_finished() {
            return None;
        }
        self.source
            .latest_attitude()
            .filter(|attitude| attitude.is_finite())
    }

    /// Poll the source and forward samples to every camera.
    pub fn sample(
        mut sampler: ResMut<MotionSampler>,
        mut cameras: Query<&mut SphereCam>,
        time: Res<Time>,
    ) {
        if std::mem::take(&mut sampler.sensor_lost) {
            for mut controller in &mut cameras {
                controller.clear_attitude();
            }
        }
        let Some(attitude) = sampler.tick(time.delta()) else {
            return;
        };
        for mut controller in &mut cameras {
            controller.set_attitude(attitude);
        }
    }
}

/// Adds the [`MotionSampler`] resource, defaulting to [`NoMotion`] if none was inserted.
pub struct MotionPlugin;

impl Plugin for MotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MotionSampler>().add_systems(
            Update,
            MotionSampler::sample.in_set(SphereCamSystems::Sample),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default, Clone)]
    struct CountingSource {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        next: Option<Quat>,
    }

    impl MotionSource for CountingSource {
        fn is_available(&self) -> bool {
            true
        }

        fn start_updates(&mut self, _interval: Duration) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop_updates(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn latest_attitude(&mut self) -> Option<Quat> {
            self.next
        }
    }

    #[test]
    fn start_is_idempotent() {
        let source = CountingSource::default();
        let starts = source.starts.clone();
        let stops = source.stops.clone();
        let mut sampler = MotionSampler::new(source);
        sampler.start();
        sampler.start();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(sampler.is_active());
        sampler.stop();
        sampler.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!sampler.is_active());
    }

    #[test]
    fn unavailable_source_never_activates() {
        let mut sampler = MotionSampler::default();
        sampler.start();
        assert!(!sampler.is_active());
        assert_eq!(sampler.tick(Duration::from_secs(1)), None);
    }

    #[test]
    fn samples_on_timer() {
        let source = CountingSource {
            next: Some(Quat::from_rotation_z(0.5)),
            ..Default::default()
        };
        let mut sampler = MotionSampler::with_interval(source, Duration::from_millis(10));
        assert_eq!(sampler.tick(Duration::from_millis(20)), None, "not started");
        sampler.start();
        assert_eq!(sampler.tick(Duration::from_millis(4)), None);
        assert!(sampler.tick(Duration::from_millis(7)).is_some());
        assert!(sampler.tick(Duration::from_millis(35)).is_some());
    }

    #[test]
    fn non_finite_samples_are_dropped() {
        let source = CountingSource {
            next: Some(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)),
            ..Default::default()
        };
        let mut sampler = MotionSampler::with_interval(source, Duration::from_millis(10));
        sampler.start();
        assert_eq!(sampler.tick(Duration::from_millis(10)), None);
    }

    #[test]
    fn shared_attitude_keeps_only_latest() {
        let (mut source, feed) = SharedAttitude::new();
        feed.push(Quat::from_rotation_x(0.1));
        assert_eq!(source.latest_attitude(), None, "dropped while stopped");
        source.start_updates(MotionSampler::DEFAULT_INTERVAL);
        assert!(feed.is_running());
        assert_eq!(feed.requested_interval(), MotionSampler::DEFAULT_INTERVAL);
        feed.push(Quat::from_rotation_x(0.1));
        feed.push(Quat::from_rotation_x(0.2));
        assert_eq!(source.latest_attitude(), Some(Quat::from_rotation_x(0.2)));
        assert_eq!(source.latest_attitude(), None);
        source.stop_updates();
        assert!(!feed.is_running());
    }

    #[test]
    fn default_interval_is_ninety_hertz() {
        let hz = 1.0 / MotionSampler::DEFAULT_INTERVAL.as_secs_f64();
        assert!((hz - 90.0).abs() < 1e-3);
    }
}
