//! Turns recognized touch gestures into camera motion.
//!
//! The hosting platform recognizes gestures and sends them as events; this module converts pan
//! translations into pitch and yaw by hit testing the sphere, and routes pinches, taps and
//! long-presses to the [`SphereCam`] methods.

use std::f32::consts::PI;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::{component::SphereCam, raycast::HitTest};
use crate::math;

/// Recognizer state attached to continuous gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum GesturePhase {
    /// Not yet recognized.
    Possible,
    /// The gesture was just recognized.
    Began,
    /// The gesture moved.
    Changed,
    /// The fingers lifted normally.
    Ended,
    /// The system interrupted the gesture.
    Cancelled,
    /// Recognition failed.
    Failed,
}

/// A one-finger pan, applied to every [`SphereCam`].
#[derive(Debug, Clone, Copy, Event)]
pub struct PanInput {
    /// Recognizer state.
    pub phase: GesturePhase,
    /// Movement since the previous [`GesturePhase::Changed`] event, in logical pixels.
    pub translation: Vec2,
    /// Velocity in logical pixels per second. Only read when the pan ends.
    pub velocity: Vec2,
    /// Current touch location in logical pixels, origin at the top left.
    pub location: Vec2,
}

/// A two-finger pinch, applied to every [`SphereCam`].
#[derive(Debug, Clone, Copy, Event)]
pub struct PinchInput {
    /// Recognizer state.
    pub phase: GesturePhase,
    /// Scale relative to the finger spacing when the pinch began.
    pub scale: f32,
}

/// Discrete zoom taps, applied to every [`SphereCam`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event)]
pub enum TapInput {
    /// A single tap with two fingers zooms out.
    TwoFingerSingle,
    /// A double tap with one finger zooms in.
    OneFingerDouble,
}

/// A long-press, which resets the view when it begins.
#[derive(Debug, Clone, Copy, Event)]
pub struct LongPressInput {
    /// Recognizer state.
    pub phase: GesturePhase,
}

/// Translation a pan fling is projected to cover after the fingers lift: `velocity × seconds²`.
pub fn fling_translation(velocity: Vec2, seconds: f32) -> Vec2 {
    velocity * seconds * seconds
}

/// Longitude change between two hits, kept short when the pan crosses the ±π seam.
///
/// When the raw difference exceeds π, the short way around is
/// `(π − |end|) + (π − |start|)`, taking its sign from the horizontal screen translation.
pub fn longitude_delta(start_longitude: f32, end_longitude: f32, translation_x: f32) -> f32 {
    let delta = end_longitude - start_longitude;
    if delta.abs() <= PI {
        return delta;
    }
    let wrapped = (PI - end_longitude.abs()) + (PI - start_longitude.abs());
    if translation_x < 0.0 {
        -wrapped
    } else {
        wrapped
    }
}

/// Pitch and yaw, in radians, that move the point under `location - translation` to `location`.
///
/// Returns `(0.0, 0.0)` if either point misses the sphere.
pub fn pitch_and_yaw_for(
    hit_test: &impl HitTest,
    radius: f32,
    translation: Vec2,
    location: Vec2,
) -> (f32, f32) {
    let start = location - translation;
    let (Some(start_hit), Some(end_hit)) = (hit_test.hit_test(start), hit_test.hit_test(location))
    else {
        return (0.0, 0.0);
    };
    let (start_longitude, start_latitude) = math::spherical_coordinates(start_hit, radius);
    let (end_longitude, end_latitude) = math::spherical_coordinates(end_hit, radius);
    let yaw = longitude_delta(start_longitude, end_longitude, translation.x);
    let pitch = end_latitude - start_latitude;
    if !(pitch.is_finite() && yaw.is_finite()) {
        return (0.0, 0.0);
    }
    (pitch, yaw)
}

impl SphereCam {
    /// Handle a pan event, hit testing against what is currently on screen.
    pub fn handle_pan(&mut self, pan: &PanInput) {
        match pan.phase {
            GesturePhase::Changed => {
                let (pitch, yaw) = pitch_and_yaw_for(
                    &self.raycast(),
                    self.sphere_radius,
                    pan.translation,
                    pan.location,
                );
                self.pan_by(pitch, yaw);
            }
            GesturePhase::Ended => {
                // The last translation was applied by the final changed event.
                let seconds = self.transition.duration.as_secs_f32();
                let translation = fling_translation(pan.velocity, seconds);
                let destination = pan.location + translation;
                let (pitch, yaw) = pitch_and_yaw_for(
                    &self.raycast(),
                    self.sphere_radius,
                    translation,
                    destination,
                );
                self.fling_by(pitch, yaw);
            }
            GesturePhase::Possible
            | GesturePhase::Began
            | GesturePhase::Cancelled
            | GesturePhase::Failed => (),
        }
    }

    /// Handle a pinch event.
    pub fn handle_pinch(&mut self, pinch: &PinchInput) {
        match pinch.phase {
            GesturePhase::Began => self.pinch_began(),
            GesturePhase::Changed => self.pinch_changed(pinch.scale),
            GesturePhase::Cancelled => self.pinch_cancelled(),
            // Already applied by the last changed event; velocity is not used.
            GesturePhase::Ended | GesturePhase::Failed => self.pinch_ended(),
            GesturePhase::Possible => (),
        }
    }

    /// Handle a zoom tap.
    pub fn handle_tap(&mut self, tap: TapInput) {
        match tap {
            TapInput::TwoFingerSingle => self.zoom_out(),
            TapInput::OneFingerDouble => self.zoom_in(),
        }
    }

    /// Handle a long-press. Only the start of the press resets the view.
    pub fn handle_long_press(&mut self, press: &LongPressInput) {
        if press.phase == GesturePhase::Began {
            self.reset();
        }
    }

    /// Route all gesture events received this frame to every camera.
    ///
    /// Events are applied grouped by kind, not in arrival order: pans, then pinches, then taps,
    /// then long-presses. A long-press sent in the same frame as a pan therefore resets the pan
    /// too, and a tap in the same frame as a long-press wins the transition guard.
    pub fn receive_gestures(
        mut pans: EventReader<PanInput>,
        mut pinches: EventReader<PinchInput>,
        mut taps: EventReader<TapInput>,
        mut long_presses: EventReader<LongPressInput>,
        mut cameras: Query<&mut SphereCam>,
    ) {
        if cameras.is_empty() {
            let dropped =
                pans.read().count() + pinches.read().count() + taps.read().count()
                    + long_presses.read().count();
            if dropped > 0 {
                trace!("Dropped {dropped} gestures with no camera attached");
            }
            return;
        }
        let pans: Vec<_> = pans.read().copied().collect();
        let pinches: Vec<_> = pinches.read().copied().collect();
        let taps: Vec<_> = taps.read().copied().collect();
        let long_presses: Vec<_> = long_presses.read().copied().collect();
        for mut controller in &mut cameras {
            for pan in &pans {
                controller.handle_pan(pan);
            }
            for pinch in &pinches {
                controller.handle_pinch(pinch);
            }
            for tap in &taps {
                controller.handle_tap(*tap);
            }
            for press in &long_presses {
                controller.handle_long_press(press);
            }
        }
    }
}
