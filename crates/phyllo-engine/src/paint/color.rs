/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    /// Creates a premultiplied color from straight alpha components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: r.clamp(0.0, 1.0) * a,
            g: g.clamp(0.0, 1.0) * a,
            b: b.clamp(0.0, 1.0) * a,
            a,
        }
    }

    /// Creates a color from a straight `[r, g, b, a]` array, the form clear
    /// colors are usually written in.
    #[inline]
    pub fn from_array(rgba: [f32; 4]) -> Self {
        Self::from_straight(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    /// Converts to the `f64` color wgpu uses for clear operations.
    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_is_premultiplied() {
        let c = Color::from_straight(1.0, 0.5, 0.0, 0.5);
        assert_eq!(c, Color { r: 0.5, g: 0.25, b: 0.0, a: 0.5 });
    }

    #[test]
    fn from_array_clamps_out_of_range() {
        let c = Color::from_array([2.0, -1.0, 0.5, 1.0]);
        assert_eq!(c, Color { r: 1.0, g: 0.0, b: 0.5, a: 1.0 });
    }

    #[test]
    fn zero_alpha_drops_color() {
        assert_eq!(Color::from_array([1.0, 1.0, 1.0, 0.0]), Color::default());
    }

    #[test]
    fn wgpu_conversion_keeps_channels() {
        let w = Color::from_array([0.0, 0.0, 0.0, 1.0]).to_wgpu();
        assert_eq!((w.r, w.g, w.b, w.a), (0.0, 0.0, 0.0, 1.0));
    }
}
