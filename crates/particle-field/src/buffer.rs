//! Flat position/color storage shared with the renderer
//!
//! Particle `i` lives at offsets `3i..3i + 3` in both arrays. The renderer
//! uploads the slices unchanged, so the layout is fixed at stride 3.

use glam::Vec3;

use crate::color::Color;
use crate::constants::STRIDE;

/// Current particle state: positions are mutated every frame, colors only on
/// regeneration.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleBuffer {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

impl ParticleBuffer {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count * STRIDE),
            colors: Vec::with_capacity(count * STRIDE),
        }
    }

    pub(crate) fn push(&mut self, position: Vec3, color: Color) {
        self.positions.extend_from_slice(&position.to_array());
        self.colors.extend_from_slice(&color.to_array());
    }

    pub fn len(&self) -> usize {
        self.positions.len() / STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [f32] {
        &mut self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * STRIDE..])
    }

    pub fn color(&self, index: usize) -> Color {
        let j = index * STRIDE;
        Color::rgb(self.colors[j], self.colors[j + 1], self.colors[j + 2])
    }

    /// Size in bytes of one of the two arrays
    pub fn byte_len(&self) -> u64 {
        (self.positions.len() * std::mem::size_of::<f32>()) as u64
    }
}

/// Rest positions captured at generation time. Never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseBuffer {
    positions: Box<[f32]>,
}

impl BaseBuffer {
    pub fn snapshot(buffer: &ParticleBuffer) -> Self {
        Self {
            positions: buffer.positions().into(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * STRIDE..])
    }
}

/// A generated buffer together with its rest snapshot.
///
/// Replaced wholesale on regeneration; the particle count never changes in
/// place.
#[derive(Clone, Debug)]
pub struct ParticleField {
    pub buffer: ParticleBuffer,
    pub base: BaseBuffer,
}

impl ParticleField {
    pub fn new(buffer: ParticleBuffer) -> Self {
        let base = BaseBuffer::snapshot(&buffer);
        Self { buffer, base }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
