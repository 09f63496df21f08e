/// Host-side mirrors of the data the mesh pipeline reads on the GPU

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::mem::{offset_of, size_of};

use crate::graphics_device::BufferFormat;

/// One mesh vertex as laid out in the vertex buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: [f32; 3],
}

/// Vertex attribute description (binding 0, per-vertex rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: BufferFormat,
    pub offset: u32,
}

impl Vertex {
    /// Byte stride of one vertex
    pub const STRIDE: u32 = size_of::<Vertex>() as u32;

    /// Attribute layout matching the mesh vertex shader inputs
    pub fn attributes() -> [VertexAttribute; 4] {
        [
            VertexAttribute {
                location: 0,
                format: BufferFormat::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, position) as u32,
            },
            VertexAttribute {
                location: 1,
                format: BufferFormat::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, normal) as u32,
            },
            VertexAttribute {
                location: 2,
                format: BufferFormat::R32G32_SFLOAT,
                offset: offset_of!(Vertex, tex_coord) as u32,
            },
            VertexAttribute {
                location: 3,
                format: BufferFormat::R32G32B32_SFLOAT,
                offset: offset_of!(Vertex, color) as u32,
            },
        ]
    }
}

/// Per-frame uniform block (set 0, binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
}

impl FrameUniforms {
    pub const SIZE: u64 = size_of::<FrameUniforms>() as u64;
}

/// Per-draw push constants (std430-style: each vec3 padded to 16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushConstants {
    pub model: Mat4,
    pub color: Vec3,
    _pad0: f32,
    pub light_position: Vec3,
    _pad1: f32,
}

impl PushConstants {
    pub const SIZE: u32 = size_of::<PushConstants>() as u32;

    pub fn new(model: Mat4, color: Vec3, light_position: Vec3) -> Self {
        Self {
            model,
            color,
            _pad0: 0.0,
            light_position,
            _pad1: 0.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
#[path = "gpu_types_tests.rs"]
mod tests;
