use anyhow::{bail, Result};

use super::Buffer;

/// Component layout of a vertex attribute or varying.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    pub const fn components(self) -> u32 {
        match self {
            Self::Float32 => 1,
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 => 4,
        }
    }

    /// Size of one element in bytes.
    pub const fn byte_size(self) -> u64 {
        self.components() as u64 * 4
    }

    /// WGSL type used for this format in generated shader structs.
    pub const fn wgsl_type(self) -> &'static str {
        match self {
            Self::Float32 => "f32",
            Self::Float32x2 => "vec2<f32>",
            Self::Float32x3 => "vec3<f32>",
            Self::Float32x4 => "vec4<f32>",
        }
    }

    pub const fn vertex_format(self) -> wgpu::VertexFormat {
        match self {
            Self::Float32 => wgpu::VertexFormat::Float32,
            Self::Float32x2 => wgpu::VertexFormat::Float32x2,
            Self::Float32x3 => wgpu::VertexFormat::Float32x3,
            Self::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Maps an attribute divisor to a wgpu step mode.
///
/// wgpu only steps per vertex or per instance, so divisors above 1 are rejected.
pub fn step_mode_for_divisor(divisor: u32) -> Result<wgpu::VertexStepMode> {
    match divisor {
        0 => Ok(wgpu::VertexStepMode::Vertex),
        1 => Ok(wgpu::VertexStepMode::Instance),
        n => bail!("attribute divisor {n} is not supported (use 0 or 1)"),
    }
}

/// A named vertex attribute bound to a buffer.
///
/// `divisor` 0 advances once per vertex, 1 once per instance.
#[derive(Debug, Copy, Clone)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub buffer: &'a Buffer,
    pub format: AttributeFormat,
    pub divisor: u32,
}

impl<'a> Attribute<'a> {
    /// Per-vertex attribute.
    pub fn per_vertex(name: &'a str, buffer: &'a Buffer, format: AttributeFormat) -> Self {
        Self { name, buffer, format, divisor: 0 }
    }

    /// Per-instance attribute (divisor 1).
    pub fn per_instance(name: &'a str, buffer: &'a Buffer, format: AttributeFormat) -> Self {
        Self { name, buffer, format, divisor: 1 }
    }
}
