//! Procedural particle placement
//!
//! Every generator takes the random source explicitly so callers decide
//! between a seeded RNG (tests, `--seed`) and an entropy-seeded one.

use glam::Vec3;
use rand::Rng;

use crate::buffer::{ParticleBuffer, ParticleField};
use crate::color::Color;
use crate::error::{ensure_positive, FieldResult};
use crate::params::{ColorMode, CubeFieldParams, GalaxyParams, ScreenFieldParams};

/// Drawable surface size in pixels. The screen field is laid out in these units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> FieldResult<()> {
        ensure_positive("viewport width", self.width)?;
        ensure_positive("viewport height", self.height)
    }
}

/// A complete generation request for one experiment
#[derive(Clone, Copy, Debug)]
pub enum GenerationConfig<'a> {
    Galaxy(&'a GalaxyParams),
    Cube(&'a CubeFieldParams),
    Screen(&'a ScreenFieldParams, Viewport),
}

impl GenerationConfig<'_> {
    pub fn validate(&self) -> FieldResult<()> {
        match self {
            GenerationConfig::Galaxy(params) => params.validate(),
            GenerationConfig::Cube(params) => params.validate(),
            GenerationConfig::Screen(params, viewport) => {
                params.validate()?;
                viewport.validate()
            }
        }
    }

    /// Validate, then build a fresh field.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> FieldResult<ParticleField> {
        self.validate()?;
        let field = match self {
            GenerationConfig::Galaxy(params) => generate_galaxy(params, rng),
            GenerationConfig::Cube(params) => generate_cube(params, rng),
            GenerationConfig::Screen(params, viewport) => generate_screen(params, *viewport, rng),
        };
        Ok(field)
    }
}

/// Spiral galaxy in the XZ plane.
///
/// Particle `i` is assigned to arm `i mod segments`; its angle is twisted by
/// `angle_offset * radius`. Noise on each axis is `U^proximity * ±1 * strength
/// * radius`, and the vertical spread vanishes at the rim.
pub fn generate_galaxy<R: Rng + ?Sized>(params: &GalaxyParams, rng: &mut R) -> ParticleField {
    let mut buffer = ParticleBuffer::with_capacity(params.particle_count);
    let segments = params.segments.max(1);

    for i in 0..params.particle_count {
        let radius = rng.random::<f32>() * params.radius;
        let arm = (i as u32 % segments) as f32 / segments as f32;
        let angle = arm * std::f32::consts::TAU + radius * params.angle_offset;

        let spread = params.strength * radius;
        let noise = Vec3::new(
            arm_noise(rng, params.proximity),
            arm_noise(rng, params.proximity),
            arm_noise(rng, params.proximity),
        ) * spread;

        let position = Vec3::new(
            angle.cos() * radius + noise.x,
            noise.y * (1.0 - radius / params.radius) * params.height_factor,
            angle.sin() * radius + noise.z,
        );

        let color = params
            .center_color
            .lerp(params.border_color, radius / params.radius);

        buffer.push(position, color);
    }

    log::debug!(
        "generated galaxy: {} particles, {} arms",
        buffer.len(),
        segments
    );
    ParticleField::new(buffer)
}

/// Uniform points in `[-half_extent, half_extent)^3`
pub fn generate_cube<R: Rng + ?Sized>(params: &CubeFieldParams, rng: &mut R) -> ParticleField {
    let mut buffer = ParticleBuffer::with_capacity(params.particle_count);
    let extent = params.half_extent * 2.0;

    for _ in 0..params.particle_count {
        let position = Vec3::new(
            (rng.random::<f32>() - 0.5) * extent,
            (rng.random::<f32>() - 0.5) * extent,
            (rng.random::<f32>() - 0.5) * extent,
        );
        let color = pick_color(params.color_mode, rng);
        buffer.push(position, color);
    }

    log::debug!("generated cube field: {} particles", buffer.len());
    ParticleField::new(buffer)
}

/// Uniform points over the viewport rectangle, centred on the origin, z = 0
pub fn generate_screen<R: Rng + ?Sized>(
    params: &ScreenFieldParams,
    viewport: Viewport,
    rng: &mut R,
) -> ParticleField {
    let mut buffer = ParticleBuffer::with_capacity(params.particle_count);
    let color_mode = params.color_mode();

    for _ in 0..params.particle_count {
        let position = Vec3::new(
            rng.random::<f32>() * viewport.width - viewport.width / 2.0,
            rng.random::<f32>() * viewport.height - viewport.height / 2.0,
            0.0,
        );
        let color = pick_color(color_mode, rng);
        buffer.push(position, color);
    }

    log::debug!(
        "generated screen field: {} particles over {}x{}",
        buffer.len(),
        viewport.width,
        viewport.height
    );
    ParticleField::new(buffer)
}

/// Signed power-law sample in (-1, 1), concentrated near zero for large exponents
fn arm_noise<R: Rng + ?Sized>(rng: &mut R, proximity: f32) -> f32 {
    let magnitude = rng.random::<f32>().powf(proximity);
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

fn pick_color<R: Rng + ?Sized>(mode: ColorMode, rng: &mut R) -> Color {
    match mode {
        ColorMode::Random => Color::rgb(rng.random(), rng.random(), rng.random()),
        ColorMode::Uniform(color) => color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// Barycentric coefficient of `c` on the segment `a -> b`, if `c` lies on it
    fn lerp_coefficient(a: Color, b: Color, c: Color) -> Option<f32> {
        let (da, dc) = (
            Vec3::from_array(b.to_array()) - Vec3::from_array(a.to_array()),
            Vec3::from_array(c.to_array()) - Vec3::from_array(a.to_array()),
        );
        let t = dc.dot(da) / da.length_squared();
        let on_segment = (dc - da * t).length() < 1e-5;
        on_segment.then_some(t)
    }

    #[test]
    fn test_counts_match_request() {
        let mut rng = rng();
        for count in [1, 2, 17, 1000] {
            let galaxy = generate_galaxy(
                &GalaxyParams {
                    particle_count: count,
                    ..Default::default()
                },
                &mut rng,
            );
            assert_eq!(galaxy.buffer.len(), count);
            assert_eq!(galaxy.buffer.colors().len(), count * 3);
            assert_eq!(galaxy.base.len(), count);

            let cube = generate_cube(
                &CubeFieldParams {
                    particle_count: count,
                    ..Default::default()
                },
                &mut rng,
            );
            assert_eq!(cube.buffer.positions().len(), count * 3);
            assert_eq!(cube.buffer.colors().len(), count * 3);
        }
    }

    #[test]
    fn test_galaxy_colors_are_convex_combinations() {
        let params = GalaxyParams {
            particle_count: 2000,
            ..Default::default()
        };
        let field = generate_galaxy(&params, &mut rng());

        for i in 0..field.len() {
            let t = lerp_coefficient(
                params.center_color,
                params.border_color,
                field.buffer.color(i),
            )
            .expect("color off the center/border segment");
            assert!((-1e-5..=1.0 + 1e-5).contains(&t), "t = {t}");
        }
    }

    #[test]
    fn test_galaxy_stays_within_noise_bound() {
        let params = GalaxyParams {
            particle_count: 5000,
            ..Default::default()
        };
        let field = generate_galaxy(&params, &mut rng());
        // Per-axis noise is at most strength * r, so the XZ offset is at most
        // sqrt(2) * strength * R.
        let bound = params.radius * (1.0 + std::f32::consts::SQRT_2 * params.strength);

        for i in 0..field.len() {
            let p = field.buffer.position(i);
            assert!(p.x.hypot(p.z) <= bound + 1e-4);
            assert!(p.y.abs() <= params.strength * params.radius * params.height_factor);
        }
    }

    #[test]
    fn test_galaxy_without_noise_lies_within_radius() {
        let params = GalaxyParams {
            particle_count: 2000,
            strength: 0.0,
            ..Default::default()
        };
        let field = generate_galaxy(&params, &mut rng());

        for i in 0..field.len() {
            let p = field.buffer.position(i);
            assert!(p.x.hypot(p.z) < params.radius + 1e-4);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_single_particle_galaxy() {
        let params = GalaxyParams {
            particle_count: 1,
            radius: 5.0,
            segments: 1,
            ..Default::default()
        };

        // Replay the radius draw from an identical RNG.
        let mut expected_rng = StdRng::seed_from_u64(42);
        let radius = expected_rng.random::<f32>() * params.radius;

        let field = generate_galaxy(&params, &mut StdRng::seed_from_u64(42));
        let p = field.buffer.position(0);

        // Segment angle is 0, so the unperturbed point is at the twist angle.
        let twist = radius * params.angle_offset;
        let expected = Vec3::new(twist.cos() * radius, 0.0, twist.sin() * radius);
        let noise_bound = params.strength * radius;

        assert!((p.x - expected.x).abs() <= noise_bound + 1e-5);
        assert!((p.z - expected.z).abs() <= noise_bound + 1e-5);

        let distance = p.x.hypot(p.z);
        assert!((distance - radius).abs() <= std::f32::consts::SQRT_2 * noise_bound + 1e-5);
    }

    #[test]
    fn test_cube_bounds_and_uniform_color() {
        let base = Color::rgb(0.25, 0.5, 0.75);
        let params = CubeFieldParams {
            particle_count: 500,
            half_extent: 2.0,
            color_mode: ColorMode::Uniform(base),
        };
        let field = generate_cube(&params, &mut rng());

        for i in 0..field.len() {
            let p = field.buffer.position(i);
            assert!(p.abs().max_element() <= 2.0);
            assert_eq!(field.buffer.color(i), base);
        }
    }

    #[test]
    fn test_random_colors_stay_in_unit_range() {
        let field = generate_cube(&CubeFieldParams::default(), &mut rng());
        assert!(field.buffer.colors().iter().all(|c| (0.0..1.0).contains(c)));
    }

    #[test]
    fn test_screen_field_covers_viewport() {
        let viewport = Viewport::new(800.0, 600.0);
        let params = ScreenFieldParams::default();
        let field = generate_screen(&params, viewport, &mut rng());

        assert_eq!(field.len(), params.particle_count);
        for i in 0..field.len() {
            let p = field.buffer.position(i);
            assert!(p.x >= -400.0 && p.x <= 400.0);
            assert!(p.y >= -300.0 && p.y <= 300.0);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_base_matches_generated_positions() {
        let field = generate_cube(&CubeFieldParams::default(), &mut rng());
        assert_eq!(field.base.positions(), field.buffer.positions());
    }

    #[test]
    fn test_generate_validates_first() {
        let params = ScreenFieldParams::default();
        let config = GenerationConfig::Screen(&params, Viewport::new(0.0, 600.0));

        assert!(matches!(
            config.generate(&mut rng()),
            Err(FieldError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let params = GalaxyParams {
            particle_count: 100,
            ..Default::default()
        };
        let a = generate_galaxy(&params, &mut StdRng::seed_from_u64(3));
        let b = generate_galaxy(&params, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.buffer, b.buffer);
    }
}
