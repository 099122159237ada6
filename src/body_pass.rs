//! Textured body rendering with depth testing.
//!
//! [`BodyPass`] draws every celestial body in one render pass. It owns the
//! pipeline, the uniform buffers and the depth buffer.
//!
//! # Architecture
//!
//! The body shader uses three bind groups:
//! - **Group 0**: Frame uniforms (view and projection matrices, light direction, ambient)
//! - **Group 1**: Model uniforms (model matrix, lighting switch), one slot per body
//!   addressed with a dynamic offset
//! - **Group 2**: Texture and sampler for the body surface
//!
//! All model slots are written before the command buffer is submitted, so
//! each draw sees its own matrix.
//!
//! # Example
//!
//! ```ignore
//! let mut pass = BodyPass::new(&gpu, 4);
//! let sun_texture = pass.create_texture_bind_group(&gpu, &sun);
//!
//! // Each frame:
//! pass.ensure_depth_size(&gpu);
//! pass.render(&gpu, &mut render_pass, frame_uniforms, &[DrawCall {
//!     mesh: &sphere,
//!     model: transforms.get(BodyKind::Sun).unwrap(),
//!     lit: false,
//!     texture: &sun_texture,
//! }]);
//! ```

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::texture::Texture;

/// Depth buffer format used by the body pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame uniforms shared by every body.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// View matrix (world to camera space transformation).
    pub view: [[f32; 4]; 4],
    /// Projection matrix (camera to clip space transformation).
    pub proj: [[f32; 4]; 4],
    /// Direction towards the light, normalized.
    pub light: [f32; 3],
    /// Minimum brightness of lit bodies.
    pub ambient: f32,
}

impl FrameUniforms {
    pub fn new(camera: &Camera, aspect: f32, light: Vec3, ambient: f32) -> Self {
        Self {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix(aspect).to_cols_array_2d(),
            light: light.normalize_or(Vec3::Z).to_array(),
            ambient: ambient.clamp(0.0, 1.0),
        }
    }
}

/// Per-body uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// Model matrix (object to world space transformation).
    pub model: [[f32; 4]; 4],
    /// `x` is 1.0 when diffuse lighting applies; the rest is padding.
    pub lighting: [f32; 4],
}

/// One body to draw this frame.
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub model: Mat4,
    /// Apply diffuse lighting. Emissive bodies pass `false`.
    pub lit: bool,
    /// Bind group from [`BodyPass::create_texture_bind_group`].
    pub texture: &'a wgpu::BindGroup,
}

/// Rounds `size` up to a multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Renders textured bodies with depth testing.
///
/// # Pipeline Configuration
///
/// - No face culling: the star field is seen from inside its sphere
/// - Opaque output, no blending
/// - Depth write and Less-than comparison
pub struct BodyPass {
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_stride: u64,
    capacity: usize,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    /// The depth texture used for depth testing.
    #[allow(dead_code)]
    pub(crate) depth_texture: wgpu::Texture,
    /// View into the depth texture for render pass attachment.
    pub(crate) depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl BodyPass {
    /// Creates the pass with room for `capacity` bodies per frame.
    pub fn new(gpu: &GpuContext, capacity: usize) -> Self {
        let device = &gpu.device;
        let capacity = capacity.max(1);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Body Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/body.wgsl").into()),
        });

        // Frame uniform buffer (group 0)
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Frame Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Model uniform buffer (group 1), one aligned slot per body
        let model_size = std::mem::size_of::<ModelUniforms>() as u64;
        let model_stride = align_to(
            model_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: model_stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Model Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(model_size),
                    },
                    count: None,
                }],
            });

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: &model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &model_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(model_size),
                }),
            }],
        });

        // Texture bind group layout (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Body Pipeline Layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &model_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Body Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_buffer,
            frame_bind_group,
            model_buffer,
            model_bind_group,
            model_stride,
            capacity,
            texture_bind_group_layout,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Creates the group 2 bind group for a body texture.
    ///
    /// Build these once at startup; they stay valid for the life of the texture.
    pub fn create_texture_bind_group(
        &self,
        gpu: &GpuContext,
        texture: &Texture,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Body Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Depth attachment for the render pass that calls [`BodyPass::render`].
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Uploads uniforms and records one draw per call.
    ///
    /// Calls beyond the capacity given to [`BodyPass::new`] are dropped with a
    /// warning.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        frame: FrameUniforms,
        draw_calls: &[DrawCall],
    ) {
        if draw_calls.is_empty() {
            return;
        }
        if draw_calls.len() > self.capacity {
            log::warn!(
                "{} bodies queued but the pass holds {}; extra bodies skipped",
                draw_calls.len(),
                self.capacity
            );
        }

        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for (slot, call) in draw_calls.iter().take(self.capacity).enumerate() {
            let offset = slot as u64 * self.model_stride;
            let model_uniforms = ModelUniforms {
                model: call.model.to_cols_array_2d(),
                lighting: [if call.lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            };
            gpu.queue.write_buffer(
                &self.model_buffer,
                offset,
                bytemuck::cast_slice(&[model_uniforms]),
            );

            render_pass.set_bind_group(1, &self.model_bind_group, &[offset as u32]);
            render_pass.set_bind_group(2, call.texture, &[]);
            render_pass.set_vertex_buffer(0, call.mesh.vertex_buffer.slice(..));
            render_pass.draw(0..call.mesh.vertex_count, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 144);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 80);
    }

    #[test]
    fn model_slots_are_aligned() {
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(80, 16), 80);
    }

    #[test]
    fn frame_uniforms_normalize_light() {
        let camera = Camera::new();
        let uniforms = FrameUniforms::new(&camera, 1.0, Vec3::new(0.0, 0.0, 3.0), 1.5);
        assert_eq!(uniforms.light, [0.0, 0.0, 1.0]);
        assert_eq!(uniforms.ambient, 1.0);
        assert_eq!(uniforms.view, camera.view_matrix().to_cols_array_2d());
    }
}
