use phyllo_engine::render::AttributeFormat;
use phyllo_engine::render::shader::{ShaderModule, Varying};

const VARYINGS: [Varying<'static>; 2] = [
    Varying::new("color_v_color", AttributeFormat::Float32x3),
    Varying::new("center", AttributeFormat::Float32x2),
];

/// Carries a per-vertex color and a center point from the vertex stage to
/// the fragment stage.
///
/// Vertex: `color_set_color(vec3)`, `set_center(vec2)`.
/// Fragment: `color_get_color() -> vec3`, `get_center() -> vec2`.
pub const COLOR: ShaderModule<'static> = ShaderModule {
    name: "color",
    varyings: &VARYINGS,
    vs: include_str!("shaders/color.vert.wgsl"),
    fs: include_str!("shaders/color.frag.wgsl"),
};
