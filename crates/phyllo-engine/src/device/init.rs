/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Scenes that compute output colors directly (no gamma-aware blending)
    /// usually want this off so the written values reach the screen unchanged.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,

    /// Enables backend validation layers and debug labels.
    pub debug: bool,
}

impl GpuInit {
    /// Returns the wgpu instance flags implied by `debug`.
    pub fn instance_flags(&self) -> wgpu::InstanceFlags {
        if self.debug {
            wgpu::InstanceFlags::DEBUG | wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::from_build_config()
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_enables_validation() {
        let init = GpuInit { debug: true, ..Default::default() };
        let flags = init.instance_flags();
        assert!(flags.contains(wgpu::InstanceFlags::VALIDATION));
        assert!(flags.contains(wgpu::InstanceFlags::DEBUG));
    }

    #[test]
    fn defaults_are_portable() {
        let init = GpuInit::default();
        assert!(init.required_features.is_empty());
        assert_eq!(init.present_mode, wgpu::PresentMode::Fifo);
        assert!(!init.debug);
    }
}
