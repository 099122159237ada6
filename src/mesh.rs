//! GPU vertex format and unindexed mesh buffers.
//!
//! This module turns CPU-side [`SphereGeometry`] into something the GPU can
//! draw:
//!
//! - [`Vertex3d`]: The interleaved vertex format: position, colour, normal and UV
//! - [`Mesh`]: A GPU-resident vertex buffer drawn as a plain triangle list
//!
//! Sphere geometry carries no index buffer (every three vertices are one
//! triangle), so meshes are drawn with `draw(0..vertex_count)` rather than
//! `draw_indexed`.
//!
//! # Vertex Layout
//!
//! The [`Vertex3d`] struct uses the following GPU layout (44 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | color     | Float32x3 | 12     | 1               |
//! | normal    | Float32x3 | 24     | 2               |
//! | uv        | Float32x2 | 36     | 3               |
//!
//! This layout is exposed via [`Vertex3d::LAYOUT`] for pipeline creation.

use crate::gpu::GpuContext;
use crate::sphere::SphereGeometry;

/// A vertex with position, colour, normal, and texture coordinates.
///
/// Uses `#[repr(C)]` for a predictable memory layout and derives
/// [`bytemuck::Pod`] so vertex slices can be uploaded without copying.
///
/// # Example
///
/// ```
/// use orrery::Vertex3d;
///
/// let vertex = Vertex3d::new(
///     [0.0, 1.0, 0.0],  // position
///     [1.0, 0.0, 0.0],  // color
///     [0.0, 1.0, 0.0],  // normal
///     [0.5, 0.5],       // uv
/// );
/// assert_eq!(vertex.uv, [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Model-space position.
    pub position: [f32; 3],
    /// Vertex colour. Overridden by the body texture when drawing.
    pub color: [f32; 3],
    /// Surface normal. Not necessarily unit length.
    pub normal: [f32; 3],
    /// Texture coordinates in \[0, 1\].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    ///
    /// - **Array stride**: 44 bytes per vertex
    /// - **Step mode**: Per-vertex
    /// - **Attributes**: position (loc 0), color (loc 1), normal (loc 2), uv (loc 3)
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 36,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], color: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }

    /// Interleaves the parallel arrays of a [`SphereGeometry`], preserving
    /// triangle order.
    pub fn from_geometry(geometry: &SphereGeometry) -> Vec<Self> {
        geometry
            .positions
            .iter()
            .zip(&geometry.colors)
            .zip(&geometry.normals)
            .zip(&geometry.uvs)
            .map(|(((position, color), normal), uv)| {
                Self::new(
                    position.to_array(),
                    color.to_array(),
                    normal.to_array(),
                    uv.to_array(),
                )
            })
            .collect()
    }
}

/// GPU-resident triangle list.
///
/// Meshes are immutable after creation. Several bodies may draw the same mesh
/// with different model matrices.
#[derive(Debug)]
pub struct Mesh {
    /// The GPU buffer containing vertex data.
    pub(crate) vertex_buffer: wgpu::Buffer,
    /// The number of vertices (three per triangle).
    pub(crate) vertex_count: u32,
}

impl Mesh {
    /// Uploads raw vertices as a new mesh.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        // SphereBuilder refuses meshes past u32::MAX vertices.
        let vertex_count = u32::try_from(vertices.len()).unwrap_or_else(|_| {
            log::warn!("{label}: {} vertices, drawing the first u32::MAX", vertices.len());
            u32::MAX
        });

        Self {
            vertex_buffer,
            vertex_count,
        }
    }

    /// Uploads a tessellated sphere.
    pub fn from_geometry(gpu: &GpuContext, geometry: &SphereGeometry, label: &str) -> Self {
        Self::new(gpu, &Vertex3d::from_geometry(geometry), label)
    }

    /// Number of vertices in the buffer.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
