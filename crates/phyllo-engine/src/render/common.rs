//! GPU types shared by the model and the shader prelude.

use bytemuck::{Pod, Zeroable};

use super::Viewport;

/// Mirrors the `Viewport` struct declared in the shader prelude.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ViewportUniform {
    pub size: [f32; 2],
    pub scale: f32,
    pub _pad: f32, // 16-byte alignment
}

impl ViewportUniform {
    pub(crate) fn new(viewport: Viewport, scale: f32) -> Self {
        Self {
            size: [viewport.width.max(1.0), viewport.height.max(1.0)],
            scale,
            _pad: 0.0,
        }
    }
}

/// Returns the `wgpu` minimum binding size for the viewport uniform buffer.
pub(crate) fn viewport_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
        assert_eq!(viewport_ubo_min_binding_size().map(|s| s.get()), Some(16));
    }

    #[test]
    fn degenerate_viewport_is_clamped() {
        let u = ViewportUniform::new(Viewport::new(0.0, 720.0), 1.0);
        assert_eq!(u.size, [1.0, 720.0]);
    }
}
