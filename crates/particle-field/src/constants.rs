//! Limits and fixed values shared by the generators and updaters
//!
//! Tunable values live in [`crate::params`]; the values here are not exposed
//! on the parameter panel.

use std::time::Duration;

/// Upper bound on particles per field (interactive frame rates stop here)
pub const MAX_PARTICLES: usize = 1_000_000;

/// Substitute distance when a particle sits exactly on the pointer
pub const MIN_DISTANCE: f32 = 0.0001;

/// Quiet period after the last resize before the screen field is rebuilt
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Half-width of the animation cube (positions span -4..4)
pub const CUBE_HALF_EXTENT: f32 = 4.0;

/// Fixed particle count of the animation experiment
pub const CUBE_PARTICLE_COUNT: usize = 3000;

/// Components per particle in the flat position/color arrays
pub const STRIDE: usize = 3;
