//! Point rendering system

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use particle_field::{Blending, ParticleBuffer, PointStyle};

use crate::camera::Camera;
use crate::point_cloud::PointCloud;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame uniform for the point shader
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PointUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub uniform_color: [f32; 4],
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub size_attenuation: u32,
}

impl PointUniform {
    pub fn new(camera: &Camera, model: Mat4, style: &PointStyle) -> Self {
        let uniform_color = match style.uniform_color {
            Some(color) => [color.r, color.g, color.b, 1.0],
            None => [0.0; 4],
        };

        Self {
            view_proj: camera.build_view_projection_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            uniform_color,
            viewport: [camera.width.max(1.0), camera.height.max(1.0)],
            point_size: style.size,
            size_attenuation: style.size_attenuation as u32,
        }
    }
}

/// Catppuccin Mocha base, converted to linear for an sRGB surface
pub fn clear_color() -> wgpu::Color {
    let base = catppuccin::PALETTE.mocha.colors.base.rgb;
    let linear = |channel: u8| {
        let c = f64::from(channel) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: linear(base.r),
        g: linear(base.g),
        b: linear(base.b),
        a: 1.0,
    }
}

pub struct PointRenderer {
    alpha_pipeline: wgpu::RenderPipeline,
    additive_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    cloud: Option<PointCloud>,
    pub depth_texture: wgpu::TextureView,
    clear_color: wgpu::Color,
}

impl PointRenderer {
    pub fn new(device: &wgpu::Device, surface_config: &wgpu::SurfaceConfiguration) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Uniform Buffer"),
            size: std::mem::size_of::<PointUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, surface_config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Bind Group Layout"),
            entries: &[
                // Uniform - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Positions - Binding 1
                storage_entry(1),
                // Colors - Binding 2
                storage_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let alpha_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_config.format,
            Blending::Normal,
        );
        let additive_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_config.format,
            Blending::Additive,
        );

        Self {
            alpha_pipeline,
            additive_pipeline,
            uniform_buffer,
            bind_group_layout,
            bind_group: None,
            cloud: None,
            depth_texture,
            clear_color: clear_color(),
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        blending: Blending,
    ) -> wgpu::RenderPipeline {
        let (label, blend, depth_write_enabled) = match blending {
            Blending::Normal => (
                "Point Pipeline (alpha)",
                wgpu::BlendState::ALPHA_BLENDING,
                true,
            ),
            Blending::Additive => (
                "Point Pipeline (additive)",
                wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::One,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent::OVER,
                },
                false,
            ),
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vertex"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, new_config: &wgpu::SurfaceConfiguration) {
        self.depth_texture = Self::create_depth_texture(device, new_config);
    }

    /// Replace the drawn cloud with a freshly generated buffer. The previous
    /// cloud is destroyed before the new one is allocated.
    pub fn install(&mut self, device: &wgpu::Device, buffer: &ParticleBuffer) {
        self.bind_group = None;
        if let Some(previous) = self.cloud.take() {
            previous.release();
        }

        let cloud = PointCloud::new(device, buffer);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: cloud.positions().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: cloud.colors().as_entire_binding(),
                },
            ],
        });

        self.bind_group = Some(bind_group);
        self.cloud = Some(cloud);
    }

    pub fn write_positions(&self, queue: &wgpu::Queue, buffer: &ParticleBuffer) {
        if let Some(cloud) = &self.cloud {
            cloud.write_positions(queue, buffer);
        }
    }

    pub fn point_count(&self) -> u32 {
        self.cloud.as_ref().map_or(0, PointCloud::count)
    }

    /// Destroy the installed cloud (shutdown).
    pub fn release(&mut self) {
        self.bind_group = None;
        if let Some(cloud) = self.cloud.take() {
            cloud.release();
        }
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        camera: &Camera,
        model: Mat4,
        style: &PointStyle,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[PointUniform::new(camera, model, style)]),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Point Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(bind_group), Some(cloud)) = (&self.bind_group, &self.cloud) {
                let pipeline = match style.blending {
                    Blending::Normal => &self.alpha_pipeline,
                    Blending::Additive => &self.additive_pipeline,
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, bind_group, &[]);
                render_pass.draw(0..6, 0..cloud.count());
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use particle_field::Color;

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<PointUniform>(), 160);
        assert_eq!(std::mem::size_of::<PointUniform>() % 16, 0);
    }

    #[test]
    fn test_uniform_color_override() {
        let camera = Camera::perspective(800.0, 600.0, Vec3::new(4.0, 0.0, 7.0));
        let mut style = PointStyle {
            size: 0.05,
            size_attenuation: true,
            blending: Blending::Normal,
            uniform_color: None,
        };

        let plain = PointUniform::new(&camera, Mat4::IDENTITY, &style);
        assert_eq!(plain.uniform_color[3], 0.0);
        assert_eq!(plain.size_attenuation, 1);

        style.uniform_color = Some(Color::rgb(0.5, 0.25, 1.0));
        let tinted = PointUniform::new(&camera, Mat4::from_quat(Quat::IDENTITY), &style);
        assert_eq!(tinted.uniform_color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(tinted.viewport, [800.0, 600.0]);
    }

    #[test]
    fn test_clear_color_is_dark() {
        let color = clear_color();
        assert!(color.r < 0.05 && color.g < 0.05 && color.b < 0.05);
        assert_eq!(color.a, 1.0);
    }
}
