use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// Picks the surface format.
///
/// With `prefer_srgb`, an sRGB 8-bit format wins when offered; without it, the
/// matching linear 8-bit format does. Otherwise the first reported format is used.
pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let preferred: [wgpu::TextureFormat; 2] = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .into_iter()
        .find(|f| formats.contains(f))
        .or_else(|| formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| modes.contains(m))
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Applies a new drawable size.
///
/// wgpu does not support configuring a surface with a 0x0 size; in that case,
/// only internal state is updated and configuration is deferred.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if !is_drawable(new_size) {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    let action = SurfaceErrorAction::from_error(&err);
    match action {
        SurfaceErrorAction::Reconfigured => {
            if is_drawable(size) {
                surface.configure(device, config);
            }
        }
        SurfaceErrorAction::Fatal => log::error!("surface error: {err}"),
        SurfaceErrorAction::SkipFrame => log::debug!("skipping frame: {err}"),
    }
    action
}

pub(crate) fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn srgb_preferred_when_requested() {
        let formats = [F::Bgra8Unorm, F::Bgra8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Bgra8UnormSrgb));
    }

    #[test]
    fn linear_preferred_when_srgb_disabled() {
        let formats = [F::Bgra8UnormSrgb, F::Rgba8Unorm];
        assert_eq!(choose_surface_format(&formats, false), Some(F::Rgba8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [F::Rgb10a2Unorm, F::Rgba16Float];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgb10a2Unorm));
        assert_eq!(choose_surface_format(&[], true), None);
    }

    #[test]
    fn unsupported_alpha_mode_is_replaced() {
        let modes = [wgpu::CompositeAlphaMode::Opaque];
        assert_eq!(
            choose_alpha_mode(&modes, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(choose_alpha_mode(&[], None), wgpu::CompositeAlphaMode::Auto);
    }

    #[test]
    fn zero_sized_surface_is_not_drawable() {
        assert!(!is_drawable(PhysicalSize::new(0, 600)));
        assert!(!is_drawable(PhysicalSize::new(800, 0)));
        assert!(is_drawable(PhysicalSize::new(1, 1)));
    }
}
