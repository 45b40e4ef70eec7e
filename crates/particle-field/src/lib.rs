//! CPU side of the particle experiments
//!
//! Generators build a [`ParticleField`] (live buffer plus rest snapshot),
//! updaters mutate it once per frame, and [`SceneSession`] ties both to the
//! experiment that is currently on screen. Nothing here touches the GPU.

pub mod buffer;
pub mod color;
pub mod constants;
pub mod error;
pub mod generator;
pub mod params;
pub mod repulsion;
pub mod scalar;
pub mod session;

pub use buffer::{BaseBuffer, ParticleBuffer, ParticleField};
pub use color::Color;
pub use constants::*;
pub use error::{FieldError, FieldResult};
pub use generator::{generate_cube, generate_galaxy, generate_screen, GenerationConfig, Viewport};
pub use params::{
    AnimationParams, Blending, ColorMode, CubeFieldParams, GalaxyParams, PointStyle,
    RepulsionParams, ScreenFieldParams,
};
pub use scalar::{Axis, FieldFunction};
pub use session::{Experiment, FrameChange, ResizeDebounce, SceneSession};
