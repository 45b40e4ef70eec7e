//! Pointer repulsion with exponential relaxation back to rest
//!
//! Unlike the scalar field this update is stateful: each call eases the
//! previous frame's positions, so it must run exactly once per displayed frame.

use glam::Vec2;

use crate::buffer::{BaseBuffer, ParticleBuffer};
use crate::constants::{MIN_DISTANCE, STRIDE};
use crate::params::RepulsionParams;

/// Push particles near `pointer` away from it and ease every other particle
/// back towards its base position. Only x and y move.
///
/// Distances are measured from the *current* position, targets from the
/// *base* position.
pub fn update(
    buffer: &mut ParticleBuffer,
    base: &BaseBuffer,
    pointer: Option<Vec2>,
    params: &RepulsionParams,
) {
    let radius_squared = params.mouse_radius * params.mouse_radius;
    let push = params.move_distance * 0.5;
    let ease = params.return_speed;

    let positions = buffer.positions_mut();
    debug_assert_eq!(positions.len(), base.positions().len());

    for (current, rest) in positions
        .chunks_exact_mut(STRIDE)
        .zip(base.positions().chunks_exact(STRIDE))
    {
        let position = Vec2::new(current[0], current[1]);
        let rest = Vec2::new(rest[0], rest[1]);

        let target = match pointer {
            Some(pointer) => {
                let offset = position - pointer;
                let distance_squared = offset.length_squared();
                if distance_squared < radius_squared {
                    let force = 1.0 - distance_squared / radius_squared;
                    let distance = match distance_squared.sqrt() {
                        d if d > 0.0 => d,
                        _ => MIN_DISTANCE,
                    };
                    rest + offset / distance * push * force
                } else {
                    rest
                }
            }
            None => rest,
        };

        let next = position + (target - position) * ease;
        current[0] = next.x;
        current[1] = next.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ParticleField;
    use crate::color::Color;
    use glam::Vec3;

    fn single(position: Vec3) -> ParticleField {
        let mut buffer = ParticleBuffer::with_capacity(1);
        buffer.push(position, Color::WHITE);
        ParticleField::new(buffer)
    }

    #[test]
    fn test_particle_inside_radius_is_pushed_away() {
        let mut field = single(Vec3::new(10.0, 0.0, 0.0));
        let params = RepulsionParams::default();

        update(&mut field.buffer, &field.base, Some(Vec2::ZERO), &params);

        let p = field.buffer.position(0);
        // force = 1 - 100/2500, target = 10 + 100 * force, eased by 0.1
        let force = 1.0 - 100.0 / 2500.0;
        let expected = 10.0 + (100.0 * force) * 0.1;
        assert!((p.x - expected).abs() < 1e-4);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_outside_radius_converges_monotonically() {
        let mut field = single(Vec3::new(100.0, -40.0, 0.0));
        let params = RepulsionParams::default();

        // Displace the particle, then park the pointer far away.
        field.buffer.positions_mut()[0] = 130.0;
        field.buffer.positions_mut()[1] = -10.0;
        let pointer = Some(Vec2::new(-500.0, 500.0));

        let rest = field.base.position(0);
        let mut previous = field.buffer.position(0).distance(rest);
        let mut frames = 0;
        while previous > 1e-3 {
            update(&mut field.buffer, &field.base, pointer, &params);
            let now = field.buffer.position(0).distance(rest);
            assert!(now < previous, "frame {frames}: {now} >= {previous}");
            previous = now;
            frames += 1;
            assert!(frames < 1000, "did not converge");
        }
    }

    #[test]
    fn test_no_pointer_relaxes_everything() {
        let mut field = single(Vec3::new(0.0, 0.0, 0.0));
        field.buffer.positions_mut()[0] = 10.0;

        update(
            &mut field.buffer,
            &field.base,
            None,
            &RepulsionParams::default(),
        );

        assert!((field.buffer.position(0).x - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_particle_on_pointer_stays_finite() {
        let mut field = single(Vec3::new(5.0, 5.0, 0.0));
        let pointer = Some(Vec2::new(5.0, 5.0));

        for _ in 0..10 {
            update(
                &mut field.buffer,
                &field.base,
                pointer,
                &RepulsionParams::default(),
            );
        }

        let p = field.buffer.position(0);
        assert!(p.is_finite());
    }

    #[test]
    fn test_never_overshoots_rest() {
        let mut field = single(Vec3::ZERO);
        field.buffer.positions_mut()[0] = -20.0;
        let params = RepulsionParams {
            return_speed: 1.0,
            ..Default::default()
        };

        update(&mut field.buffer, &field.base, None, &params);
        assert_eq!(field.buffer.position(0), Vec3::ZERO);
    }

    #[test]
    fn test_z_is_untouched() {
        let mut field = single(Vec3::new(1.0, 1.0, 7.0));
        update(
            &mut field.buffer,
            &field.base,
            Some(Vec2::ZERO),
            &RepulsionParams::default(),
        );
        assert_eq!(field.buffer.position(0).z, 7.0);
    }
}
