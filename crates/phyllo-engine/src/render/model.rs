use std::borrow::Cow;
use std::ops::Range;

use anyhow::{bail, Context, Result};

use super::attribute::step_mode_for_divisor;
use super::common::{viewport_ubo_min_binding_size, ViewportUniform};
use super::shader::{ShaderAssembler, ShaderModule, FS_ENTRY, VS_ENTRY};
use super::{Attribute, AttributeFormat, RenderCtx, RenderTarget};
use crate::device::with_validation_scope;

/// Everything needed to build a [`Model`].
#[derive(Debug, Clone)]
pub struct ModelDesc<'a> {
    pub label: &'a str,
    /// Main vertex source; see [`crate::render::shader`] for the contract.
    pub vs: &'a str,
    /// Main fragment source.
    pub fs: &'a str,
    pub modules: &'a [ShaderModule<'a>],
    pub attributes: &'a [Attribute<'a>],
    pub vertex_count: u32,
    pub instance_count: u32,
    pub is_instanced: bool,
}

/// Vertex/instance counts of a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCounts {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub is_instanced: bool,
}

impl DrawCounts {
    pub fn validate(self) -> Result<()> {
        anyhow::ensure!(self.vertex_count > 0, "vertex_count must be positive");
        if self.is_instanced {
            anyhow::ensure!(self.instance_count > 0, "instanced draw needs instance_count > 0");
        }
        Ok(())
    }

    /// Instance range passed to `draw`. A non-instanced draw is one instance.
    pub fn instances(self) -> Range<u32> {
        if self.is_instanced {
            0..self.instance_count
        } else {
            0..1
        }
    }

    /// Number of elements an attribute with `step_mode` is read for.
    pub fn elements_read(self, step_mode: wgpu::VertexStepMode) -> u64 {
        match step_mode {
            wgpu::VertexStepMode::Vertex => self.vertex_count as u64,
            wgpu::VertexStepMode::Instance => self.instances().len() as u64,
        }
    }
}

/// Checks one attribute binding against the draw counts and returns its step mode.
pub(crate) fn check_attribute(
    name: &str,
    format: AttributeFormat,
    divisor: u32,
    byte_len: u64,
    counts: DrawCounts,
) -> Result<wgpu::VertexStepMode> {
    let step_mode = step_mode_for_divisor(divisor).with_context(|| format!("attribute \"{name}\""))?;

    if step_mode == wgpu::VertexStepMode::Instance && !counts.is_instanced {
        bail!("attribute \"{name}\" is per-instance but the model is not instanced");
    }

    let needed = counts.elements_read(step_mode) * format.byte_size();
    anyhow::ensure!(
        byte_len >= needed,
        "attribute \"{name}\" needs {needed} bytes but its buffer holds {byte_len}"
    );

    Ok(step_mode)
}

struct VertexSlot {
    buffer: wgpu::Buffer,
    stride: u64,
    step_mode: wgpu::VertexStepMode,
    attribute: [wgpu::VertexAttribute; 1],
}

/// A single draw call: composed shaders, attribute bindings and counts.
///
/// Each attribute occupies its own vertex buffer slot, in declaration order.
/// The pipeline is rebuilt if the surface format changes.
pub struct Model {
    label: String,
    vs_module: wgpu::ShaderModule,
    fs_module: wgpu::ShaderModule,
    slots: Vec<VertexSlot>,
    counts: DrawCounts,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
}

impl Model {
    pub fn new(ctx: &RenderCtx<'_>, desc: &ModelDesc<'_>) -> Result<Self> {
        let counts = DrawCounts {
            vertex_count: desc.vertex_count,
            instance_count: desc.instance_count,
            is_instanced: desc.is_instanced,
        };
        counts
            .validate()
            .with_context(|| format!("model \"{}\"", desc.label))?;

        let mut assembler = ShaderAssembler::new().modules(desc.modules);
        let mut slots = Vec::with_capacity(desc.attributes.len());

        for (location, attr) in desc.attributes.iter().enumerate() {
            let step_mode =
                check_attribute(attr.name, attr.format, attr.divisor, attr.buffer.size(), counts)
                    .with_context(|| {
                        format!("model \"{}\", buffer \"{}\"", desc.label, attr.buffer.label())
                    })?;

            assembler = assembler.attribute(attr.name, attr.format);
            slots.push(VertexSlot {
                buffer: attr.buffer.raw().clone(),
                stride: attr.format.byte_size(),
                step_mode,
                attribute: [wgpu::VertexAttribute {
                    format: attr.format.vertex_format(),
                    offset: 0,
                    shader_location: location as u32,
                }],
            });
        }

        let shader = assembler
            .assemble(desc.vs, desc.fs)
            .with_context(|| format!("failed to compose shaders for model \"{}\"", desc.label))?;

        let (vs_module, fs_module) = with_validation_scope(ctx.device, desc.label, || {
            let vertex = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("phyllo model vertex shader"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(shader.vertex)),
            });
            let fragment = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("phyllo model fragment shader"),
                source: wgpu::ShaderSource::Naga(Cow::Owned(shader.fragment)),
            });
            (vertex, fragment)
        })?;

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("phyllo model bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: viewport_ubo_min_binding_size(),
                },
                count: None,
            }],
        });

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("phyllo model viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("phyllo model bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let mut model = Self {
            label: desc.label.to_string(),
            vs_module,
            fs_module,
            slots,
            counts,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout,
            bind_group,
            viewport_ubo,
        };
        model.ensure_pipeline(ctx)?;

        log::debug!(
            "created model \"{}\": {} attributes, {} vertices x {:?} instances",
            model.label,
            model.slots.len(),
            counts.vertex_count,
            counts.instances(),
        );

        Ok(model)
    }

    /// Records the draw call into `target`, on top of whatever it already holds.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if let Err(err) = self.ensure_pipeline(ctx) {
            log::error!("skipping model \"{}\": {err:#}", self.label);
            return;
        }

        ctx.queue.write_buffer(
            &self.viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform::new(ctx.viewport, ctx.scale_factor)),
        );

        let Some(pipeline) = self.pipeline.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("phyllo model pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        for (slot, vb) in self.slots.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, vb.buffer.slice(..));
        }
        rpass.draw(0..self.counts.vertex_count, self.counts.instances());
    }

    /// Releases the model's own GPU resources. Attribute buffers are owned
    /// by the caller and deleted separately.
    pub fn delete(self) {
        log::debug!("deleting model \"{}\"", self.label);
        self.viewport_ubo.destroy();
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return Ok(());
        }

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("phyllo model pipeline layout"),
            bind_group_layouts: &[&self.bind_group_layout],
            immediate_size: 0,
        });

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = self
            .slots
            .iter()
            .map(|slot| wgpu::VertexBufferLayout {
                array_stride: slot.stride,
                step_mode: slot.step_mode,
                attributes: &slot.attribute,
            })
            .collect();

        let pipeline = with_validation_scope(ctx.device, &self.label, || {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(self.label.as_str()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.vs_module,
                    entry_point: Some(VS_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.fs_module,
                    entry_point: Some(FS_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })?;

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instanced(vertex_count: u32, instance_count: u32) -> DrawCounts {
        DrawCounts { vertex_count, instance_count, is_instanced: true }
    }

    #[test]
    fn zero_vertices_rejected() {
        assert!(instanced(0, 20).validate().is_err());
    }

    #[test]
    fn instanced_needs_instances() {
        assert!(instanced(6, 0).validate().is_err());
        assert!(instanced(6, 20).validate().is_ok());
    }

    #[test]
    fn non_instanced_draws_one_instance() {
        let counts = DrawCounts { vertex_count: 3, instance_count: 0, is_instanced: false };
        assert!(counts.validate().is_ok());
        assert_eq!(counts.instances(), 0..1);
    }

    #[test]
    fn per_vertex_attribute_sized_by_vertex_count() {
        let counts = instanced(6, 20);
        let step = check_attribute("position", AttributeFormat::Float32x2, 0, 48, counts).unwrap();
        assert_eq!(step, wgpu::VertexStepMode::Vertex);
        assert!(check_attribute("position", AttributeFormat::Float32x2, 0, 40, counts).is_err());
    }

    #[test]
    fn per_instance_attribute_sized_by_instance_count() {
        let counts = instanced(6, 20);
        let step = check_attribute("color", AttributeFormat::Float32x3, 1, 240, counts).unwrap();
        assert_eq!(step, wgpu::VertexStepMode::Instance);
        let err = check_attribute("offset", AttributeFormat::Float32x2, 1, 152, counts).unwrap_err();
        assert!(err.to_string().contains("needs 160 bytes"));
    }

    #[test]
    fn per_instance_attribute_on_plain_model_rejected() {
        let counts = DrawCounts { vertex_count: 6, instance_count: 1, is_instanced: false };
        assert!(check_attribute("offset", AttributeFormat::Float32x2, 1, 1024, counts).is_err());
    }

    #[test]
    fn unsupported_divisor_names_attribute() {
        let err = check_attribute("offset", AttributeFormat::Float32x2, 3, 1024, instanced(6, 20))
            .unwrap_err();
        assert!(format!("{err:#}").contains("offset"));
    }
}
