//! # Particle Renderer
//!
//! Draws a [`particle_field::ParticleBuffer`] as screen-facing point quads.

pub mod camera;
pub mod error;
pub mod point_cloud;
pub mod renderer;

pub use camera::*;
pub use error::*;
pub use point_cloud::*;
pub use renderer::*;
