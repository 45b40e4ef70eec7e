//! GPU copy of a particle buffer

use particle_field::ParticleBuffer;
use wgpu::util::DeviceExt;

/// Position and color storage buffers for one generated field.
///
/// Both are packed `f32` triples. Colors are uploaded once; positions are
/// rewritten whenever an updater moved the particles.
pub struct PointCloud {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    count: u32,
}

impl PointCloud {
    pub fn new(device: &wgpu::Device, buffer: &ParticleBuffer) -> Self {
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Position Buffer"),
            contents: bytemuck::cast_slice(buffer.positions()),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Color Buffer"),
            contents: bytemuck::cast_slice(buffer.colors()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        log::debug!(
            "uploaded point cloud: {} points, {} bytes",
            buffer.len(),
            buffer.byte_len() * 2
        );

        Self {
            positions,
            colors,
            count: buffer.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn positions(&self) -> &wgpu::Buffer {
        &self.positions
    }

    pub fn colors(&self) -> &wgpu::Buffer {
        &self.colors
    }

    /// Upload the current positions. The buffer must be the one this cloud
    /// was built from.
    pub fn write_positions(&self, queue: &wgpu::Queue, buffer: &ParticleBuffer) {
        if buffer.len() as u32 != self.count {
            log::error!(
                "position upload skipped: cloud holds {} points, buffer has {}",
                self.count,
                buffer.len()
            );
            return;
        }
        queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(buffer.positions()));
    }

    /// Free the GPU memory now instead of when the last reference drops.
    pub fn release(self) {
        self.positions.destroy();
        self.colors.destroy();
        log::debug!("released point cloud of {} points", self.count);
    }
}
