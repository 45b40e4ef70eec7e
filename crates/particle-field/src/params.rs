//! Runtime-tunable parameters for each experiment
//!
//! Defaults give each experiment its intended look. The parameter
//! panel edits a copy and commits it back before asking for a regeneration,
//! so a generation call always sees a complete snapshot.

use crate::color::Color;
use crate::constants::{CUBE_HALF_EXTENT, CUBE_PARTICLE_COUNT};
use crate::error::{ensure_count, ensure_positive, FieldError, FieldResult};
use crate::scalar::{Axis, FieldFunction};

/// How particle colors are assigned at generation time
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorMode {
    /// Every channel drawn from U(0, 1) per particle
    Random,
    /// All particles share one color
    Uniform(Color),
}

impl ColorMode {
    pub fn from_flag(use_random_colors: bool, base_color: Color) -> Self {
        if use_random_colors {
            ColorMode::Random
        } else {
            ColorMode::Uniform(base_color)
        }
    }
}

/// Spiral galaxy shape
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyParams {
    pub particle_count: usize,
    /// Point size in world units
    pub size: f32,
    /// Outer radius R
    pub radius: f32,
    /// Number of spiral arms
    pub segments: u32,
    /// Twist per unit radius (radians)
    pub angle_offset: f32,
    /// Noise exponent; higher values pull particles closer to their arm
    pub proximity: f32,
    /// Noise magnitude relative to the particle radius
    pub strength: f32,
    /// Radians per second about Y (applied as a model rotation, not to the buffer)
    pub rotation_speed: f32,
    /// Vertical spread at the core
    pub height_factor: f32,
    pub center_color: Color,
    pub border_color: Color,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            particle_count: 100_000,
            size: 0.01,
            radius: 5.0,
            segments: 3,
            angle_offset: 1.5,
            proximity: 3.0,
            strength: 0.7,
            rotation_speed: 0.01,
            height_factor: 1.2,
            center_color: Color::from_rgb8(0xd6, 0x49, 0x1f),
            border_color: Color::from_rgb8(0x1e, 0x3d, 0x8a),
        }
    }
}

impl GalaxyParams {
    pub fn validate(&self) -> FieldResult<()> {
        ensure_count(self.particle_count)?;
        ensure_positive("radius", self.radius)?;
        ensure_positive("size", self.size)?;
        if self.segments == 0 {
            return Err(FieldError::ZeroSegments);
        }
        for (name, value) in [
            ("angle_offset", self.angle_offset),
            ("proximity", self.proximity),
            ("strength", self.strength),
            ("height_factor", self.height_factor),
            ("rotation_speed", self.rotation_speed),
        ] {
            if !value.is_finite() {
                return Err(FieldError::NonFinite { name });
            }
        }
        Ok(())
    }
}

/// Points scattered uniformly in a cube centred on the origin
#[derive(Clone, Debug, PartialEq)]
pub struct CubeFieldParams {
    pub particle_count: usize,
    pub half_extent: f32,
    pub color_mode: ColorMode,
}

impl Default for CubeFieldParams {
    fn default() -> Self {
        Self {
            particle_count: CUBE_PARTICLE_COUNT,
            half_extent: CUBE_HALF_EXTENT,
            color_mode: ColorMode::Random,
        }
    }
}

impl CubeFieldParams {
    pub fn validate(&self) -> FieldResult<()> {
        ensure_count(self.particle_count)?;
        ensure_positive("half_extent", self.half_extent)
    }
}

/// Scalar-field animation over a random cube
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationParams {
    pub cube: CubeFieldParams,
    pub function: FieldFunction,
    pub axis: Axis,
    pub size: f32,
    /// Draw every particle with `color` instead of its vertex color
    pub use_uniform_color: bool,
    pub color: Color,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            cube: CubeFieldParams::default(),
            function: FieldFunction::default(),
            axis: Axis::default(),
            size: 0.05,
            use_uniform_color: false,
            color: Color::from_rgb8(0xf2, 0xb4, 0x0c),
        }
    }
}

impl AnimationParams {
    pub fn validate(&self) -> FieldResult<()> {
        self.cube.validate()?;
        ensure_positive("size", self.size)
    }
}

/// Pointer repulsion tuning
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepulsionParams {
    /// Radius of influence around the pointer
    pub mouse_radius: f32,
    /// Full push distance; particles are displaced by at most half of it
    pub move_distance: f32,
    /// Fraction of the remaining gap closed per frame, in (0, 1]
    pub return_speed: f32,
}

impl Default for RepulsionParams {
    fn default() -> Self {
        Self {
            mouse_radius: 50.0,
            move_distance: 200.0,
            return_speed: 0.1,
        }
    }
}

impl RepulsionParams {
    pub fn validate(&self) -> FieldResult<()> {
        ensure_positive("mouse_radius", self.mouse_radius)?;
        ensure_positive("move_distance", self.move_distance)?;
        if !(self.return_speed > 0.0 && self.return_speed <= 1.0) {
            return Err(FieldError::InvalidReturnSpeed(self.return_speed));
        }
        Ok(())
    }
}

/// Mouse-reactive field laid out over the viewport
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenFieldParams {
    pub particle_count: usize,
    /// Point size in pixels
    pub size: f32,
    pub repulsion: RepulsionParams,
    pub use_random_colors: bool,
    pub base_color: Color,
}

impl Default for ScreenFieldParams {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            size: 6.0,
            repulsion: RepulsionParams::default(),
            use_random_colors: true,
            base_color: Color::WHITE,
        }
    }
}

impl ScreenFieldParams {
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::from_flag(self.use_random_colors, self.base_color)
    }

    pub fn validate(&self) -> FieldResult<()> {
        ensure_count(self.particle_count)?;
        ensure_positive("size", self.size)?;
        self.repulsion.validate()
    }
}

/// Blend mode for the point pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blending {
    Normal,
    /// Additive, without depth writes (overlapping points glow)
    Additive,
}

/// Material-level drawing options handed to the renderer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub size: f32,
    /// World-unit sizes shrink with distance; otherwise `size` is in pixels
    pub size_attenuation: bool,
    pub blending: Blending,
    /// Overrides the per-vertex colors when set
    pub uniform_color: Option<Color>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GalaxyParams::default().validate().is_ok());
        assert!(AnimationParams::default().validate().is_ok());
        assert!(ScreenFieldParams::default().validate().is_ok());
    }

    #[test]
    fn test_galaxy_rejects_bad_input() {
        let params = GalaxyParams {
            particle_count: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(FieldError::NoParticles));

        let params = GalaxyParams {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(FieldError::NonPositive { name: "radius", .. })
        ));

        let params = GalaxyParams {
            segments: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(FieldError::ZeroSegments));

        let params = GalaxyParams {
            strength: f32::NAN,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(FieldError::NonFinite { name: "strength" })
        );
    }

    #[test]
    fn test_particle_cap() {
        let params = CubeFieldParams {
            particle_count: crate::MAX_PARTICLES + 1,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(FieldError::TooManyParticles(crate::MAX_PARTICLES + 1))
        );
    }

    #[test]
    fn test_return_speed_bounds() {
        let mut params = RepulsionParams::default();
        params.return_speed = 0.0;
        assert!(params.validate().is_err());
        params.return_speed = 1.5;
        assert!(params.validate().is_err());
        params.return_speed = 1.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_color_mode_from_flag() {
        let base = Color::rgb(0.2, 0.4, 0.6);
        assert_eq!(ColorMode::from_flag(true, base), ColorMode::Random);
        assert_eq!(ColorMode::from_flag(false, base), ColorMode::Uniform(base));
    }
}
