//! Closed-form geometry and per-instance attribute data.

/// Fixed quad made of two triangles, centered on the origin, in clip space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleShape {
    pub half_extent: f32,
}

impl Default for TriangleShape {
    fn default() -> Self {
        Self { half_extent: 0.1 }
    }
}

impl TriangleShape {
    pub const VERTEX_COUNT: u32 = 6;

    pub fn vertices(&self) -> Vec<[f32; 2]> {
        let h = self.half_extent;
        vec![[-h, -h], [h, -h], [h, h], [-h, -h], [h, h], [-h, h]]
    }
}

/// Golden-angle spiral: instance `i` sits at angle `i * angle_step` and
/// radius `spacing * sqrt(i)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpiralLayout {
    pub instance_count: u32,
    pub angle_step_deg: f32,
    pub spacing: f32,
    /// Gray level written to every instance color.
    pub shade: f32,
}

impl Default for SpiralLayout {
    fn default() -> Self {
        Self {
            instance_count: 20,
            angle_step_deg: 137.5,
            spacing: 0.2,
            shade: 0.5,
        }
    }
}

impl SpiralLayout {
    pub fn angle_step(&self) -> f32 {
        self.angle_step_deg.to_radians()
    }

    /// Position of instance `i`.
    pub fn offset(&self, i: u32) -> [f32; 2] {
        let angle = self.angle_step() * i as f32;
        let r = self.spacing * (i as f32).sqrt();
        [r * angle.cos(), r * angle.sin()]
    }

    pub fn offsets(&self) -> Vec<[f32; 2]> {
        (0..self.instance_count).map(|i| self.offset(i)).collect()
    }

    pub fn colors(&self) -> Vec<[f32; 3]> {
        vec![[self.shade; 3]; self.instance_count as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn radius(p: [f32; 2]) -> f32 {
        (p[0] * p[0] + p[1] * p[1]).sqrt()
    }

    #[test]
    fn shape_is_two_triangles() {
        let v = TriangleShape::default().vertices();
        assert_eq!(v.len(), TriangleShape::VERTEX_COUNT as usize);
        assert_eq!(v[0], [-0.1, -0.1]);
        assert_eq!(v[2], [0.1, 0.1]);
        assert_eq!(v[5], [-0.1, 0.1]);
        assert_eq!(v[0], v[3]);
        assert_eq!(v[2], v[4]);
    }

    #[test]
    fn one_offset_and_color_per_instance() {
        let layout = SpiralLayout::default();
        assert_eq!(layout.offsets().len(), 20);
        assert_eq!(layout.colors().len(), 20);
    }

    #[test]
    fn first_instance_at_origin() {
        assert_eq!(SpiralLayout::default().offset(0), [0.0, 0.0]);
    }

    #[test]
    fn radius_grows_with_sqrt_of_index() {
        let layout = SpiralLayout::default();
        for (i, p) in layout.offsets().into_iter().enumerate() {
            let expected = 0.2 * (i as f32).sqrt();
            assert!((radius(p) - expected).abs() < EPS, "instance {i}");
        }
    }

    #[test]
    fn successive_instances_turn_by_golden_angle() {
        let layout = SpiralLayout::default();
        let step = 137.5_f32.to_radians();
        for i in 1..layout.instance_count {
            let p = layout.offset(i);
            let angle = p[1].atan2(p[0]);
            let expected = (step * i as f32).sin().atan2((step * i as f32).cos());
            assert!((angle - expected).abs() < 1e-4, "instance {i}");
        }
    }

    #[test]
    fn instance_one_matches_closed_form() {
        let p = SpiralLayout::default().offset(1);
        let a = 137.5_f32.to_radians();
        assert!((p[0] - 0.2 * a.cos()).abs() < EPS);
        assert!((p[1] - 0.2 * a.sin()).abs() < EPS);
    }

    #[test]
    fn colors_are_constant_gray() {
        assert!(SpiralLayout::default().colors().iter().all(|c| *c == [0.5, 0.5, 0.5]));
    }
}
