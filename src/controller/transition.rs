//! Short animated transitions of the camera's pitch, yaw and field of view.
//!
//! A transition snapshots the pose currently on screen and eases from it toward the live model
//! values over [`TransitionSettings::duration`]. While one is in flight the controller presents the
//! eased values instead of writing the model pitch directly, so sensor samples arriving every frame
//! cannot cut the animation short.

use std::time::Duration;

use bevy_math::curve::{Curve, EaseFunction, EasingCurve};
use bevy_reflect::prelude::*;

/// The animatable part of the camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Keyframe {
    /// Horizontal field of view in degrees.
    pub fov: f32,
    /// Manual pitch in radians.
    pub pitch: f32,
    /// Manual yaw in radians.
    pub yaw: f32,
}

impl Keyframe {
    /// Linear interpolation between two keyframes.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            fov: self.fov + (to.fov - self.fov) * t,
            pitch: self.pitch + (to.pitch - self.pitch) * t,
            yaw: self.yaw + (to.yaw - self.yaw) * t,
        }
    }
}

/// Timing curve of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum TransitionEasing {
    /// Constant speed.
    Linear,
    /// Accelerate, then decelerate.
    #[default]
    EaseInOut,
}

impl TransitionEasing {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn ease(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TransitionEasing::Linear => t,
            TransitionEasing::EaseInOut => {
                EasingCurve::new(0.0, 1.0, EaseFunction::CubicInOut).sample_clamped(t)
            }
        }
    }
}

/// Duration and timing of the animated gestures: taps, long-press reset and pan flings.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TransitionSettings {
    /// How long a transition runs.
    pub duration: Duration,
    /// Timing curve applied to progress.
    pub easing: TransitionEasing,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            easing: TransitionEasing::EaseInOut,
        }
    }
}

/// Transition state machine: `Idle → Animating → Idle`.
///
/// [`Animation::is_animating`] is the guard the rest of the controller observes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum Animation {
    /// Nothing in flight; the model values are presented directly.
    #[default]
    Idle,
    /// A transition is running.
    Animating {
        /// The pose on screen when the transition started.
        from: Keyframe,
        /// Time accumulated since the transition started.
        elapsed: Duration,
        /// Total length of the transition.
        duration: Duration,
        /// Timing curve.
        easing: TransitionEasing,
    },
}

impl Animation {
    /// Is a transition in flight?
    pub fn is_animating(&self) -> bool {
        matches!(self, Animation::Animating { .. })
    }

    /// Start a transition from the given on-screen pose.
    ///
    /// A zero duration completes immediately on the next [`Animation::advance`].
    pub fn start(from: Keyframe, settings: TransitionSettings) -> Self {
        Animation::Animating {
            from,
            elapsed: Duration::ZERO,
            duration: settings.duration,
            easing: settings.easing,
        }
    }

    /// Linear progress in `[0, 1]`, or `None` when idle.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Animation::Idle => None,
            Animation::Animating {
                elapsed, duration, ..
            } => {
                if duration.is_zero() {
                    return Some(1.0);
                }
                Some((elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0))
            }
        }
    }

    /// The keyframe to present, easing from the snapshot toward `target`.
    pub fn present(&self, target: Keyframe) -> Keyframe {
        match self {
            Animation::Idle => target,
            Animation::Animating { from, easing, .. } => {
                let t = easing.ease(self.progress().unwrap_or(1.0));
                from.lerp(target, t)
            }
        }
    }

    /// Advance time. Returns `true` on the step that completes the transition, after which the
    /// state is [`Animation::Idle`].
    pub fn advance(&mut self, delta: Duration) -> bool {
        let Animation::Animating {
            elapsed, duration, ..
        } = self
        else {
            return false;
        };
        *elapsed = elapsed.saturating_add(delta);
        if *elapsed >= *duration {
            *self = Animation::Idle;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fov: f32, pitch: f32, yaw: f32) -> Keyframe {
        Keyframe { fov, pitch, yaw }
    }

    #[test]
    fn idle_presents_target() {
        let target = key(40.0, 0.2, -1.0);
        assert_eq!(Animation::Idle.present(target), target);
        assert_eq!(Animation::Idle.progress(), None);
    }

    #[test]
    fn runs_for_its_duration() {
        let mut animation = Animation::start(key(60.0, 0.0, 0.0), TransitionSettings::default());
        assert!(animation.is_animating());
        assert!(!animation.advance(Duration::from_millis(100)));
        assert!(!animation.advance(Duration::from_millis(100)));
        assert!(animation.is_animating());
        assert!(animation.advance(Duration::from_millis(100)));
        assert_eq!(animation, Animation::Idle);
        assert!(!animation.advance(Duration::from_millis(100)));
    }

    #[test]
    fn presents_endpoints() {
        let from = key(60.0, 0.5, 1.0);
        let to = key(90.0, 0.0, 0.0);
        let mut animation = Animation::start(
            from,
            TransitionSettings {
                duration: Duration::from_secs(1),
                easing: TransitionEasing::Linear,
            },
        );
        assert_eq!(animation.present(to), from);
        animation.advance(Duration::from_millis(500));
        let mid = animation.present(to);
        assert!((mid.fov - 75.0).abs() < 1e-4);
        assert!((mid.pitch - 0.25).abs() < 1e-4);
        animation.advance(Duration::from_millis(500));
        assert_eq!(animation.present(to), to);
    }

    #[test]
    fn ease_in_out_is_monotonic_and_bounded() {
        let easing = TransitionEasing::EaseInOut;
        assert!(easing.ease(0.0).abs() < 1e-5);
        assert!((easing.ease(1.0) - 1.0).abs() < 1e-5);
        let mut last = 0.0;
        for i in 1..=20 {
            let value = easing.ease(i as f32 / 20.0);
            assert!(value >= last - 1e-6);
            last = value;
        }
        assert!((easing.ease(2.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_duration_completes_on_first_step() {
        let mut animation = Animation::start(
            Keyframe::default(),
            TransitionSettings {
                duration: Duration::ZERO,
                ..Default::default()
            },
        );
        assert_eq!(animation.progress(), Some(1.0));
        assert!(animation.advance(Duration::ZERO));
    }
}
