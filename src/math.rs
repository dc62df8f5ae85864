//! Angular helpers shared by the controller, the gesture interpreter, and look tracking.
//!
//! Vector products come straight from glam: [`Vec3::cross`] and [`Vec3::normalize_or_zero`], the
//! latter returning [`Vec3::ZERO`] for degenerate input instead of NaNs.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy_math::prelude::*;

/// Rotation of the camera when no device attitude is available: looking at the horizon of the
/// motion reference frame, where +Z is up.
pub fn rest_orientation() -> Quat {
    Quat::from_rotation_x(FRAC_PI_2)
}

/// Rotation of the video sphere before manual yaw is applied. Turns the sphere's poles onto the
/// vertical axis of the motion reference frame and flips the default texture mapping.
pub fn sphere_rest_orientation() -> Quat {
    Quat::from_rotation_x(-FRAC_PI_2)
}

/// Axis that pitches a camera with the given base orientation toward or away from the poles.
///
/// Perpendicular to both the camera's local Z axis and the world vertical expressed in camera
/// space. Returns [`Vec3::ZERO`] when the camera looks straight along the vertical.
pub fn pitch_axis(base_orientation: Quat) -> Vec3 {
    let vertical_camera_space = base_orientation.inverse() * Vec3::Z;
    Vec3::Z.cross(vertical_camera_space).normalize_or_zero()
}

/// Longitude and latitude, in radians, of a point on a sphere of the given radius.
///
/// `longitude = atan2(x, z)`, `latitude = asin(y / radius)`. The `asin` input is clamped to
/// `[-1, 1]`; a radius that is not positive and finite yields a latitude of zero.
pub fn spherical_coordinates(point: Vec3, radius: f32) -> (f32, f32) {
    let longitude = point.x.atan2(point.z);
    let ratio = if radius.is_finite() && radius > 0.0 {
        point.y / radius
    } else {
        0.0
    };
    let ratio = if ratio.is_nan() { 0.0 } else { ratio };
    let latitude = ratio.clamp(-1.0, 1.0).asin();
    (longitude, latitude)
}

/// Convert a horizontal field of view to the vertical one used by
/// [`PerspectiveProjection`](bevy_render::camera::PerspectiveProjection). Both in radians.
pub fn horizontal_to_vertical_fov(x_fov: f32, aspect_ratio: f32) -> f32 {
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return x_fov;
    }
    2.0 * ((x_fov * 0.5).tan() / aspect_ratio).atan()
}

/// Heading and pitch, in degrees, of a direction expressed in sphere-local coordinates.
///
/// Heading is the longitude wrapped into `[0, 360)`. Pitch is positive toward the upper pole,
/// which sits at local -Y once the sphere is placed with [`sphere_rest_orientation`].
pub fn heading_pitch(direction: Vec3) -> (f32, f32) {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return (0.0, 0.0);
    }
    let (longitude, latitude) = spherical_coordinates(direction, 1.0);
    let heading = longitude.rem_euclid(TAU).to_degrees();
    // rem_euclid can round up to exactly TAU
    let heading = if heading >= 360.0 { 0.0 } else { heading };
    (heading, -latitude.to_degrees())
}

/// Shortest distance between two headings in degrees, in `[0, 180]`.
pub fn heading_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spherical_coordinates_of_axes() {
        let (long, lat) = spherical_coordinates(Vec3::new(0.0, 0.0, 30.0), 30.0);
        assert!(long.abs() < 1e-6);
        assert!(lat.abs() < 1e-6);

        let (long, _) = spherical_coordinates(Vec3::new(30.0, 0.0, 0.0), 30.0);
        assert!((long - FRAC_PI_2).abs() < 1e-6);

        let (_, lat) = spherical_coordinates(Vec3::new(0.0, 30.0, 0.0), 30.0);
        assert!((lat - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn latitude_is_clamped_outside_the_sphere() {
        // Tessellated geometry and float error can put hits slightly off the sphere.
        let (_, lat) = spherical_coordinates(Vec3::new(0.0, 30.5, 0.0), 30.0);
        assert!((lat - FRAC_PI_2).abs() < 1e-6);
        let (_, lat) = spherical_coordinates(Vec3::new(0.0, -31.0, 0.0), 30.0);
        assert!((lat + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn degenerate_radius_does_not_produce_nan() {
        for radius in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let (long, lat) = spherical_coordinates(Vec3::new(1.0, 1.0, 1.0), radius);
            assert!(long.is_finite());
            assert_eq!(lat, 0.0);
        }
    }

    #[test]
    fn pitch_axis_at_rest_is_lateral() {
        let axis = pitch_axis(rest_orientation());
        assert!(axis.abs_diff_eq(Vec3::NEG_X, 1e-5), "{axis:?}");
    }

    #[test]
    fn pitch_axis_looking_at_pole_is_zero() {
        // Identity attitude: the camera looks down the vertical.
        assert_eq!(pitch_axis(Quat::IDENTITY), Vec3::ZERO);
    }

    #[test]
    fn pitch_axis_ignores_heading() {
        for heading in [0.3_f32, 1.7, -2.4] {
            let attitude = Quat::from_rotation_z(heading) * rest_orientation();
            let axis = pitch_axis(attitude);
            assert!((axis.length() - 1.0).abs() < 1e-5);
            assert!(axis.abs_diff_eq(Vec3::NEG_X, 1e-4), "{heading}: {axis:?}");
        }
    }

    #[test]
    fn vertical_fov_matches_for_square_viewports() {
        let x_fov = 60f32.to_radians();
        assert!((horizontal_to_vertical_fov(x_fov, 1.0) - x_fov).abs() < 1e-6);
        assert!(horizontal_to_vertical_fov(x_fov, 16.0 / 9.0) < x_fov);
        assert_eq!(horizontal_to_vertical_fov(x_fov, 0.0), x_fov);
    }

    #[test]
    fn heading_difference_wraps() {
        assert!((heading_difference(355.0, 5.0) - 10.0).abs() < 1e-4);
        assert!((heading_difference(5.0, 355.0) - 10.0).abs() < 1e-4);
        assert!((heading_difference(90.0, 270.0) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn heading_pitch_ranges() {
        let (heading, pitch) = heading_pitch(Vec3::new(-1.0, 0.0, -0.01));
        assert!((0.0..360.0).contains(&heading));
        assert!(pitch.abs() < 1e-3);
        let (_, pitch) = heading_pitch(Vec3::NEG_Y);
        assert!((pitch - 90.0).abs() < 1e-3);
        assert_eq!(heading_pitch(Vec3::ZERO), (0.0, 0.0));
    }
}
