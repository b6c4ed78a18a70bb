use anyhow::Result;

use phyllo_engine::core::{App, AppControl, FrameCtx, GpuCtx};
use phyllo_engine::paint::Color;
use phyllo_engine::render::{Attribute, AttributeFormat, Buffer, Model, ModelDesc};

use crate::color_module::COLOR;
use crate::layout::{SpiralLayout, TriangleShape};

pub const INFO: &str = "Instanced triangles using phyllo's high-level API";

pub(crate) const VS: &str = include_str!("shaders/triangles.vert.wgsl");
pub(crate) const FS: &str = include_str!("shaders/triangles.frag.wgsl");

/// Scene parameters.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub shape: TriangleShape,
    pub layout: SpiralLayout,
    pub clear: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shape: TriangleShape::default(),
            layout: SpiralLayout::default(),
            clear: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// GPU resources created at initialization.
pub struct Resources {
    model: Model,
    position_buffer: Buffer,
    color_buffer: Buffer,
    offset_buffer: Buffer,
}

/// One instanced draw of small quads laid out on a golden-angle spiral.
pub struct InstancedTriangles {
    config: SceneConfig,
}

impl InstancedTriangles {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }
}

impl App for InstancedTriangles {
    type State = Resources;

    fn info(&self) -> &str {
        INFO
    }

    fn initialize(&mut self, ctx: &GpuCtx<'_, '_>) -> Result<Resources> {
        let rctx = ctx.render_ctx();
        let SceneConfig { shape, layout, .. } = &self.config;

        let position_buffer = Buffer::vertex(rctx.device, "positions", &shape.vertices())?;
        let color_buffer = Buffer::vertex(rctx.device, "colors", &layout.colors())?;
        let offset_buffer = Buffer::vertex(rctx.device, "offsets", &layout.offsets())?;

        let model = Model::new(
            &rctx,
            &ModelDesc {
                label: "instanced triangles",
                vs: VS,
                fs: FS,
                modules: &[COLOR],
                attributes: &[
                    Attribute::per_vertex("position", &position_buffer, AttributeFormat::Float32x2),
                    Attribute::per_instance("color", &color_buffer, AttributeFormat::Float32x3),
                    Attribute::per_instance("offset", &offset_buffer, AttributeFormat::Float32x2),
                ],
                vertex_count: TriangleShape::VERTEX_COUNT,
                instance_count: layout.instance_count,
                is_instanced: true,
            },
        )?;

        Ok(Resources {
            model,
            position_buffer,
            color_buffer,
            offset_buffer,
        })
    }

    fn render(&mut self, state: &mut Resources, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let model = &mut state.model;
        ctx.render(Color::from_array(self.config.clear), |rctx, target| {
            model.draw(rctx, target);
        })
    }

    fn finalize(&mut self, state: Resources, _ctx: &GpuCtx<'_, '_>) {
        let Resources {
            model,
            position_buffer,
            color_buffer,
            offset_buffer,
        } = state;

        model.delete();
        position_buffer.delete();
        color_buffer.delete();
        offset_buffer.delete();
    }
}
