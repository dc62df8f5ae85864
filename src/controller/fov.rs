//! Provides [`FovLimits`] settings.

use bevy_reflect::Reflect;
use bevy_render::prelude::*;

/// Bound the horizontal field of view, in degrees, and define where a reset returns it to.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FovLimits {
    /// The narrowest field of view, reached when zooming in.
    ///
    /// Video textures are usually far lower resolution than the screen once magnified, so zooming
    /// much further than this only shows blurrier pixels.
    pub min: f32,
    /// The widest field of view, reached when zooming out. Wider angles distort the edges of the
    /// sphere heavily with a rectilinear projection.
    pub max: f32,
    /// The field of view used when a scene is built and when the view is reset.
    pub default: f32,
}

impl Default for FovLimits {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 90.0,
            default: 60.0,
        }
    }
}

impl FovLimits {
    /// Clamp a field of view into `[min, max]`. Non-finite input falls back to the default.
    pub fn clamp(&self, fov: f32) -> f32 {
        if !fov.is_finite() {
            return self.clamp(self.default);
        }
        fov.max(self.min).min(self.max)
    }

    /// The default field of view, itself clamped in case the limits were customized.
    pub fn default_fov(&self) -> f32 {
        self.default.max(self.min).min(self.max)
    }
}

/// Write a horizontal field of view, in degrees, into a perspective projection.
///
/// Returns `false` without touching the projection if it is not perspective.
pub fn apply_to_projection(projection: &mut Projection, x_fov_degrees: f32) -> bool {
    let Projection::Perspective(perspective) = projection else {
        return false;
    };
    perspective.fov = crate::math::horizontal_to_vertical_fov(
        x_fov_degrees.to_radians(),
        perspective.aspect_ratio,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_bounds() {
        let limits = FovLimits::default();
        assert_eq!(limits.clamp(5.0), 10.0);
        assert_eq!(limits.clamp(120.0), 90.0);
        assert_eq!(limits.clamp(45.0), 45.0);
        assert_eq!(limits.clamp(f32::NAN), 60.0);
        assert_eq!(limits.clamp(f32::INFINITY), 60.0);
    }

    #[test]
    fn default_respects_custom_limits() {
        let limits = FovLimits {
            min: 70.0,
            max: 80.0,
            default: 60.0,
        };
        assert_eq!(limits.default_fov(), 70.0);
        assert_eq!(limits.clamp(f32::NAN), 70.0);
    }

    #[test]
    fn only_perspective_projections_are_written() {
        let mut perspective = Projection::Perspective(PerspectiveProjection {
            aspect_ratio: 1.0,
            ..Default::default()
        });
        assert!(apply_to_projection(&mut perspective, 45.0));
        let Projection::Perspective(p) = perspective else {
            unreachable!()
        };
        assert!((p.fov - 45f32.to_radians()).abs() < 1e-5);

        let mut ortho = Projection::Orthographic(OrthographicProjection::default_3d());
        assert!(!apply_to_projection(&mut ortho, 45.0));
    }
}
