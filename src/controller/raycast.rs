//! Screen-space hit testing against the inside of the video sphere.

use bevy_math::prelude::*;

/// Find where a ray through a screen point meets the visible inside of the sphere.
///
/// Implementors return the hit in the sphere's local coordinates, or `None` on a miss.
pub trait HitTest {
    /// Hit test a screen point, in logical pixels with the origin at the top left.
    fn hit_test(&self, screen_point: Vec2) -> Option<Vec3>;
}

impl<F> HitTest for F
where
    F: Fn(Vec2) -> Option<Vec3>,
{
    fn hit_test(&self, screen_point: Vec2) -> Option<Vec3> {
        self(screen_point)
    }
}

/// Analytic hit test for a camera at the center of a sphere.
///
/// Because the camera never leaves the center, every ray meets the inside of the sphere at exactly
/// `radius`. Points outside the viewport still hit, along the extended view frustum; only a
/// degenerate setup misses.
#[derive(Debug, Clone, Copy)]
pub struct SphereRaycast {
    /// Viewport size in logical pixels.
    pub viewport_size: Vec2,
    /// World rotation of the camera.
    pub camera_rotation: Quat,
    /// Horizontal field of view in degrees.
    pub x_fov: f32,
    /// World rotation of the sphere.
    pub sphere_rotation: Quat,
    /// Radius of the sphere.
    pub radius: f32,
}

impl SphereRaycast {
    /// Direction of the ray through `screen_point`, in camera view space (looking down -Z).
    pub fn view_direction(&self, screen_point: Vec2) -> Option<Vec3> {
        let size = self.viewport_size;
        if !(size.x > 0.0 && size.y > 0.0 && size.is_finite() && screen_point.is_finite()) {
            return None;
        }
        let half_width = (self.x_fov.to_radians() * 0.5).tan();
        if !half_width.is_finite() || half_width <= 0.0 {
            return None;
        }
        let half_height = half_width * size.y / size.x;
        let mut ndc = screen_point * 2.0 / size - Vec2::ONE;
        // Flip the y-coordinate origin from the top to the bottom.
        ndc.y = -ndc.y;
        Some(Vec3::new(ndc.x * half_width, ndc.y * half_height, -1.0).normalize())
    }
}

impl HitTest for SphereRaycast {
    fn hit_test(&self, screen_point: Vec2) -> Option<Vec3> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return None;
        }
        let view = self.view_direction(screen_point)?;
        let world = self.camera_rotation * view * self.radius;
        let local = self.sphere_rotation.inverse() * world;
        local.is_finite().then_some(local)
    }
}
