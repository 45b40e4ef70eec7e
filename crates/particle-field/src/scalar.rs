//! Scalar-field animation: one axis of every particle follows `f(x, y, t)`
//!
//! The update always starts from the base snapshot, so switching functions
//! mid-animation never accumulates drift, and replaying a timestamp
//! reproduces the same buffer exactly.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use glam::Quat;

use crate::buffer::{BaseBuffer, ParticleBuffer};
use crate::constants::STRIDE;
use crate::error::FieldError;

/// The selectable field functions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldFunction {
    #[default]
    Sin,
    Cos,
    Tan,
    Cone,
    Wave,
    Ripple,
    EggCrate,
    /// Flat plane; also the fallback for unknown names
    None,
}

impl FieldFunction {
    pub const ALL: [FieldFunction; 8] = [
        FieldFunction::Sin,
        FieldFunction::Cos,
        FieldFunction::Tan,
        FieldFunction::Cone,
        FieldFunction::Wave,
        FieldFunction::Ripple,
        FieldFunction::EggCrate,
        FieldFunction::None,
    ];

    /// Short identifier used on the command line and in logs
    pub fn key(self) -> &'static str {
        match self {
            FieldFunction::Sin => "sin",
            FieldFunction::Cos => "cos",
            FieldFunction::Tan => "tan",
            FieldFunction::Cone => "cone",
            FieldFunction::Wave => "wave",
            FieldFunction::Ripple => "ripple",
            FieldFunction::EggCrate => "egg-crate",
            FieldFunction::None => "none",
        }
    }

    /// Formula shown in the dropdown
    pub fn label(self) -> &'static str {
        match self {
            FieldFunction::Sin => "sin(t + x)",
            FieldFunction::Cos => "cos(t + x)",
            FieldFunction::Tan => "tan(t + x) * 0.1",
            FieldFunction::Cone => "sqrt(x² + y²) * sin(t)",
            FieldFunction::Wave => "e^(-1/4*x²)*(2sin(x*pi) - x*cos(3*y)) * sin(t)",
            FieldFunction::Ripple => "sin(10*sqrt(x² + y²) - t*5)/10",
            FieldFunction::EggCrate => "sin(5x -t*5)*cos(5y -t*5)/5",
            FieldFunction::None => "none",
        }
    }

    #[inline]
    pub fn eval(self, x: f32, y: f32, t: f32) -> f32 {
        match self {
            FieldFunction::Sin => (t + x).sin(),
            FieldFunction::Cos => (t + x).cos(),
            FieldFunction::Tan => (t + x).tan() * 0.1,
            FieldFunction::Cone => x.hypot(y) * t.sin(),
            FieldFunction::Wave => {
                (-0.25 * x * x).exp() * (2.0 * (PI * x).sin() - x * (3.0 * y).cos()) * t.sin()
            }
            FieldFunction::Ripple => (10.0 * x.hypot(y) - t * 5.0).sin() / 10.0,
            FieldFunction::EggCrate => (5.0 * x - t * 5.0).sin() * (5.0 * y - t * 5.0).cos() / 5.0,
            FieldFunction::None => 0.0,
        }
    }

    /// Look up a function by key or label, falling back to [`FieldFunction::None`].
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|err| {
            log::warn!("{err}; using `{}`", FieldFunction::None.key());
            FieldFunction::None
        })
    }
}

impl FromStr for FieldFunction {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(name) || f.label() == name)
            .ok_or_else(|| FieldError::UnknownFunction(s.to_string()))
    }
}

impl fmt::Display for FieldFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Component that carries the animated value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    Y,
    #[default]
    Z,
}

impl Axis {
    pub fn offset(self) -> usize {
        match self {
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Model rotation that keeps the sampled (x, y) plane facing the viewer.
    ///
    /// With the value in z, the cloud is turned a quarter about X so that z
    /// reads as height.
    pub fn orientation(self) -> Quat {
        match self {
            Axis::Y => Quat::IDENTITY,
            Axis::Z => Quat::from_rotation_x(-FRAC_PI_2),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Y => f.write_str("y"),
            Axis::Z => f.write_str("z"),
        }
    }
}

/// Restore every particle from `base`, then overwrite `axis` with
/// `function(base.x, base.y, t)`.
pub fn update(
    buffer: &mut ParticleBuffer,
    base: &BaseBuffer,
    elapsed: f32,
    function: FieldFunction,
    axis: Axis,
) {
    let offset = axis.offset();
    let positions = buffer.positions_mut();
    debug_assert_eq!(positions.len(), base.positions().len());

    for (current, rest) in positions
        .chunks_exact_mut(STRIDE)
        .zip(base.positions().chunks_exact(STRIDE))
    {
        current.copy_from_slice(rest);
        current[offset] = function.eval(rest[0], rest[1], elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ParticleField;
    use crate::generator::generate_cube;
    use crate::params::CubeFieldParams;
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field() -> ParticleField {
        generate_cube(&CubeFieldParams::default(), &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_update_is_deterministic() {
        let mut a = field();
        let mut b = a.clone();

        for function in FieldFunction::ALL {
            for axis in [Axis::Y, Axis::Z] {
                update(&mut a.buffer, &a.base, 1.25, function, axis);
                update(&mut b.buffer, &b.base, 1.25, function, axis);
                assert_eq!(a.buffer.positions(), b.buffer.positions());
            }
        }
    }

    #[test]
    fn test_only_selected_axis_changes() {
        let mut f = field();
        update(&mut f.buffer, &f.base, 0.5, FieldFunction::Sin, Axis::Z);

        for i in 0..f.len() {
            let p = f.buffer.position(i);
            let rest = f.base.position(i);
            assert_eq!(p.x, rest.x);
            assert_eq!(p.y, rest.y);
            assert_eq!(p.z, (0.5 + rest.x).sin());
        }

        update(&mut f.buffer, &f.base, 0.5, FieldFunction::Cos, Axis::Y);
        for i in 0..f.len() {
            let p = f.buffer.position(i);
            let rest = f.base.position(i);
            assert_eq!(p.x, rest.x);
            assert_eq!(p.y, (0.5 + rest.x).cos());
            assert_eq!(p.z, rest.z);
        }
    }

    #[test]
    fn test_switching_functions_does_not_drift() {
        let mut switched = field();
        for (step, function) in FieldFunction::ALL.into_iter().cycle().take(40).enumerate() {
            update(
                &mut switched.buffer,
                &switched.base,
                step as f32 * 0.1,
                function,
                Axis::Z,
            );
        }

        let mut fresh = field();
        update(&mut fresh.buffer, &fresh.base, 3.9, FieldFunction::None, Axis::Z);
        update(
            &mut switched.buffer,
            &switched.base,
            3.9,
            FieldFunction::None,
            Axis::Z,
        );
        assert_eq!(switched.buffer, fresh.buffer);
    }

    #[test]
    fn test_none_flattens_axis() {
        let mut f = field();
        update(&mut f.buffer, &f.base, 2.0, FieldFunction::None, Axis::Y);
        assert!((0..f.len()).all(|i| f.buffer.position(i).y == 0.0));
    }

    #[test]
    fn test_parse_by_key_and_label() {
        assert_eq!("ripple".parse::<FieldFunction>(), Ok(FieldFunction::Ripple));
        assert_eq!("EGG-CRATE".parse::<FieldFunction>(), Ok(FieldFunction::EggCrate));
        assert_eq!(
            "sqrt(x² + y²) * sin(t)".parse::<FieldFunction>(),
            Ok(FieldFunction::Cone)
        );
        assert_eq!(
            "spiral".parse::<FieldFunction>(),
            Err(FieldError::UnknownFunction("spiral".into()))
        );
    }

    #[test]
    fn test_unknown_function_falls_back_to_none() {
        assert_eq!(FieldFunction::resolve("does-not-exist"), FieldFunction::None);
        assert_eq!(FieldFunction::resolve("tan"), FieldFunction::Tan);
    }

    #[test]
    fn test_eval_at_known_points() {
        assert!((FieldFunction::Cone.eval(3.0, 4.0, FRAC_PI_2) - 5.0).abs() < 1e-5);
        assert_eq!(FieldFunction::Wave.eval(0.0, 1.0, 1.0), 0.0);
        assert!(FieldFunction::Ripple.eval(0.0, 0.0, 0.0).abs() < 1e-6);
        assert_eq!(FieldFunction::None.eval(1.0, 2.0, 3.0), 0.0);
    }

    #[test]
    fn test_z_orientation_turns_z_into_height() {
        let up = Axis::Z.orientation() * Vec3::Z;
        assert!((up - Vec3::Y).length() < 1e-6);
        assert_eq!(Axis::Y.orientation(), Quat::IDENTITY);
    }
}
